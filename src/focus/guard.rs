use super::lookup::{ForegroundInfo, ForegroundLookup};

/// Outcome of a foreground check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    pub allowed: bool,
    /// What was in front, for the denial notice
    pub detail: String,
}

/// Allow-list gate over the foreground window
/// Keystroke injection only proceeds when the window in front belongs to
/// one of the configured target processes
pub struct ForegroundGuard {
    allow: Vec<String>,
    lookup: Box<dyn ForegroundLookup>,
}

impl ForegroundGuard {
    pub fn new(allow_processes: &[String], lookup: Box<dyn ForegroundLookup>) -> ForegroundGuard {
        ForegroundGuard {
            allow: normalize(allow_processes),
            lookup,
        }
    }

    /// Replace the allow-list on configuration reload
    pub fn set_allow_processes(&mut self, allow_processes: &[String]) {
        self.allow = normalize(allow_processes);
    }

    /// Check the window currently in front against the allow-list
    pub fn check(&self) -> GuardDecision {
        match self.lookup.foreground() {
            ForegroundInfo::Process(name) => {
                let allowed = self.allow.iter().any(|p| *p == name.to_lowercase());
                GuardDecision {
                    allowed,
                    detail: name,
                }
            }
            ForegroundInfo::NoWindow => GuardDecision {
                allowed: false,
                detail: "no foreground window".to_string(),
            },
            ForegroundInfo::NoProcess => GuardDecision {
                allowed: false,
                detail: "unidentified process".to_string(),
            },
        }
    }
}

fn normalize(processes: &[String]) -> Vec<String> {
    processes.iter().map(|p| p.trim().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLookup(ForegroundInfo);

    impl ForegroundLookup for FakeLookup {
        fn foreground(&self) -> ForegroundInfo {
            self.0.clone()
        }
    }

    fn guard_with(info: ForegroundInfo) -> ForegroundGuard {
        ForegroundGuard::new(
            &["wechat.exe".to_string(), "weixin.exe".to_string()],
            Box::new(FakeLookup(info)),
        )
    }

    #[test]
    fn test_allows_listed_process() {
        let decision = guard_with(ForegroundInfo::Process("wechat.exe".into())).check();
        assert!(decision.allowed);
        assert_eq!(decision.detail, "wechat.exe");
    }

    #[test]
    fn test_denies_unlisted_process() {
        let decision = guard_with(ForegroundInfo::Process("explorer.exe".into())).check();
        assert!(!decision.allowed);
        assert_eq!(decision.detail, "explorer.exe");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let decision = guard_with(ForegroundInfo::Process("WeChat.EXE".into())).check();
        assert!(decision.allowed);
    }

    #[test]
    fn test_denies_when_no_window() {
        let decision = guard_with(ForegroundInfo::NoWindow).check();
        assert!(!decision.allowed);
        assert_eq!(decision.detail, "no foreground window");
    }

    #[test]
    fn test_denies_when_process_unidentified() {
        let decision = guard_with(ForegroundInfo::NoProcess).check();
        assert!(!decision.allowed);
        assert_eq!(decision.detail, "unidentified process");
    }

    #[test]
    fn test_reload_replaces_allow_list() {
        let mut guard = guard_with(ForegroundInfo::Process("notepad.exe".into()));
        assert!(!guard.check().allowed);
        guard.set_allow_processes(&["notepad.exe".to_string()]);
        assert!(guard.check().allowed);
    }

    #[test]
    fn test_empty_allow_list_denies_everything() {
        let mut guard = guard_with(ForegroundInfo::Process("wechat.exe".into()));
        guard.set_allow_processes(&[]);
        assert!(!guard.check().allowed);
    }
}
