use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use anyhow::Result;

use super::binding::HotkeyBinding;
use crate::error::PipelineError;

/// Identifier tying a registered hotkey to its pressed events
pub type HotkeyId = u32;

/// Trait for OS hotkey registration
/// Pressed events are delivered out-of-band on the channel handed to the
/// dispatcher, so implementations only do register/unregister bookkeeping
pub trait HotkeyBackend: Send {
    fn register(&mut self, id: HotkeyId, binding: &HotkeyBinding) -> Result<()>;
    fn unregister(&mut self, id: HotkeyId);
}

/// Owns hotkey registrations and surfaces pressed events to the event loop
pub struct HotkeyDispatcher {
    backend: Box<dyn HotkeyBackend>,
    events: Receiver<HotkeyId>,
    bound: HashMap<HotkeyId, HotkeyBinding>,
}

impl HotkeyDispatcher {
    pub fn new(backend: Box<dyn HotkeyBackend>, events: Receiver<HotkeyId>) -> HotkeyDispatcher {
        HotkeyDispatcher {
            backend,
            events,
            bound: HashMap::new(),
        }
    }

    /// Bind `id` to `binding`, replacing any previous binding for that id.
    ///
    /// The previous binding is unregistered before the new one is tried, so
    /// rebinding to the same combination never collides with itself. If the
    /// OS rejects the new combination the previous binding is restored.
    pub fn register(&mut self, id: HotkeyId, binding: HotkeyBinding) -> Result<(), PipelineError> {
        if binding.vk_code().is_none() {
            return Err(PipelineError::InvalidHotkey(binding.to_string()));
        }

        let previous = self.bound.remove(&id);
        if previous.is_some() {
            self.backend.unregister(id);
        }

        match self.backend.register(id, &binding) {
            Ok(()) => {
                log::info!("Registered hotkey {} as id {}", binding, id);
                self.bound.insert(id, binding);
                Ok(())
            }
            Err(e) => {
                log::debug!("Hotkey backend rejected {}: {}", binding, e);
                if let Some(prev) = previous {
                    if self.backend.register(id, &prev).is_ok() {
                        log::warn!("Kept previous hotkey {} after failed rebind", prev);
                        self.bound.insert(id, prev);
                    }
                }
                Err(PipelineError::RegistrationConflict(binding.to_string()))
            }
        }
    }

    /// Drop the binding for `id` if present; never fails
    pub fn unregister(&mut self, id: HotkeyId) {
        if self.bound.remove(&id).is_some() {
            self.backend.unregister(id);
            log::debug!("Unregistered hotkey id {}", id);
        }
    }

    /// Binding currently registered under `id`
    pub fn binding(&self, id: HotkeyId) -> Option<&HotkeyBinding> {
        self.bound.get(&id)
    }

    /// Next pressed hotkey, if any is queued
    pub fn try_next(&self) -> Option<HotkeyId> {
        self.events.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Sender};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeBackend {
        calls: Arc<Mutex<Vec<String>>>,
        reject: Arc<Mutex<Option<String>>>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn reject_combination(&self, display: &str) {
            *self.reject.lock().unwrap() = Some(display.to_string());
        }
    }

    impl HotkeyBackend for FakeBackend {
        fn register(&mut self, id: HotkeyId, binding: &HotkeyBinding) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("register:{}:{}", id, binding));
            if self.reject.lock().unwrap().as_deref() == Some(binding.to_string().as_str()) {
                anyhow::bail!("error 1409: hotkey already registered");
            }
            Ok(())
        }

        fn unregister(&mut self, id: HotkeyId) {
            self.calls.lock().unwrap().push(format!("unregister:{}", id));
        }
    }

    fn ctrl_alt(key: &str) -> HotkeyBinding {
        HotkeyBinding {
            ctrl: true,
            alt: true,
            shift: false,
            meta: false,
            key: key.to_string(),
        }
    }

    fn dispatcher() -> (HotkeyDispatcher, FakeBackend, Sender<HotkeyId>) {
        let backend = FakeBackend::default();
        let (tx, rx) = mpsc::channel();
        let dispatcher = HotkeyDispatcher::new(Box::new(backend.clone()), rx);
        (dispatcher, backend, tx)
    }

    #[test]
    fn test_first_register_skips_unregister() {
        let (mut d, backend, _tx) = dispatcher();
        d.register(1, ctrl_alt("V")).unwrap();
        assert_eq!(backend.calls(), vec!["register:1:Ctrl+Alt+V"]);
    }

    #[test]
    fn test_rebind_unregisters_previous_first() {
        let (mut d, backend, _tx) = dispatcher();
        d.register(1, ctrl_alt("V")).unwrap();
        d.register(1, ctrl_alt("B")).unwrap();
        assert_eq!(
            backend.calls(),
            vec![
                "register:1:Ctrl+Alt+V",
                "unregister:1",
                "register:1:Ctrl+Alt+B",
            ]
        );
        assert_eq!(d.binding(1), Some(&ctrl_alt("B")));
    }

    #[test]
    fn test_failed_rebind_restores_previous() {
        let (mut d, backend, _tx) = dispatcher();
        d.register(1, ctrl_alt("V")).unwrap();
        backend.reject_combination("Ctrl+Alt+B");

        let err = d.register(1, ctrl_alt("B")).unwrap_err();
        assert_eq!(
            err,
            PipelineError::RegistrationConflict("Ctrl+Alt+B".to_string())
        );
        // The old combination is registered again and still answers for id 1
        assert_eq!(
            backend.calls().last().unwrap(),
            "register:1:Ctrl+Alt+V"
        );
        assert_eq!(d.binding(1), Some(&ctrl_alt("V")));
    }

    #[test]
    fn test_conflict_error_names_the_combination() {
        let (mut d, backend, _tx) = dispatcher();
        backend.reject_combination("Ctrl+Alt+V");
        let err = d.register(1, ctrl_alt("V")).unwrap_err();
        assert!(err.to_string().contains("Ctrl+Alt+V"));
        assert!(err.to_string().contains("already in use"));
    }

    #[test]
    fn test_invalid_key_never_touches_backend() {
        let (mut d, backend, _tx) = dispatcher();
        d.register(1, ctrl_alt("V")).unwrap();

        let err = d.register(1, ctrl_alt("BOGUS")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidHotkey(_)));
        // The existing binding is untouched
        assert_eq!(d.binding(1), Some(&ctrl_alt("V")));
        assert_eq!(backend.calls(), vec!["register:1:Ctrl+Alt+V"]);
    }

    #[test]
    fn test_unregister_unknown_id_is_noop() {
        let (mut d, backend, _tx) = dispatcher();
        d.unregister(9);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_try_next_drains_pressed_events() {
        let (d, _backend, tx) = dispatcher();
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(d.try_next(), Some(1));
        assert_eq!(d.try_next(), Some(2));
        assert_eq!(d.try_next(), None);
    }
}
