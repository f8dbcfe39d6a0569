use anyhow::{Context, Result, anyhow};
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use std::time::Instant;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Daily log files kept before rotation discards the oldest
const KEEP_LOG_FILES: usize = 3;

/// Transient user-facing notice.
///
/// Warn-and-above records double as notices: pipeline failures, guard
/// denials and registration conflicts all reach the user through this
/// channel instead of propagating as errors.
#[derive(Debug, Clone)]
pub struct NoticeMessage {
    pub level: Level,
    pub message: String,
    pub timestamp: Instant,
}

/// Global log sink: records below the file threshold land in a
/// daily-rolling file, and records at or above the notice threshold are
/// additionally forwarded to the notice channel the event loop displays
/// from. Failures on either path are swallowed; a lost log line must never
/// disturb a transaction.
struct LogSink {
    file: Mutex<RollingFileAppender>,
    file_level: LevelFilter,
    notices: Option<Mutex<Sender<NoticeMessage>>>,
    notice_level: LevelFilter,
}

impl Log for LogSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level.max(self.notice_level)
    }

    fn log(&self, record: &Record) {
        let level = record.level();

        if level <= self.file_level {
            let line = format!(
                "{} {:<5} [{}] {}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                level,
                record.target(),
                record.args()
            );
            if let Ok(mut file) = self.file.lock() {
                let _ = file.write_all(line.as_bytes());
            }
        }

        if level <= self.notice_level {
            if let Some(notices) = &self.notices {
                if let Ok(tx) = notices.lock() {
                    let _ = tx.send(NoticeMessage {
                        level,
                        message: record.args().to_string(),
                        timestamp: Instant::now(),
                    });
                }
            }
        }
    }

    fn flush(&self) {}
}

/// Map a configured threshold name to a filter; unrecognized names log at
/// info once the sink is installed
fn threshold(name: &str) -> LevelFilter {
    use LevelFilter::*;
    [Off, Error, Warn, Info, Debug, Trace]
        .into_iter()
        .find(|filter| name.trim().eq_ignore_ascii_case(filter.as_str()))
        .unwrap_or(Info)
}

/// Install the global log sink.
///
/// `log_file_path` names the base log file; rotation appends the date and
/// prunes old files. When `notice_tx` is None (the render/config
/// subcommands) only the file half is active.
pub fn init_logger(
    log_file_path: PathBuf,
    notice_tx: Option<Sender<NoticeMessage>>,
    file_level: &str,
    notice_level: &str,
) -> Result<()> {
    let dir = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("Log file path {:?} has no directory", log_file_path))?;
    fs::create_dir_all(dir).context("Failed to create log directory")?;

    let stem = log_file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("shotput");
    let file = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(KEEP_LOG_FILES)
        .filename_prefix(stem)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Cannot open log file under {:?}", dir))?;

    let sink = LogSink {
        file: Mutex::new(file),
        file_level: threshold(file_level),
        notices: notice_tx.map(Mutex::new),
        notice_level: threshold(notice_level),
    };

    let max_level = sink.file_level.max(sink.notice_level);
    log::set_boxed_logger(Box::new(sink)).context("Failed to install log sink")?;
    log::set_max_level(max_level);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_threshold_names() {
        assert_eq!(threshold("error"), LevelFilter::Error);
        assert_eq!(threshold("WARN"), LevelFilter::Warn);
        assert_eq!(threshold(" Debug "), LevelFilter::Debug);
        assert_eq!(threshold("off"), LevelFilter::Off);
        // Unknown names fall back to info
        assert_eq!(threshold("verbose"), LevelFilter::Info);
    }

    fn test_sink(notice_level: LevelFilter) -> (LogSink, mpsc::Receiver<NoticeMessage>) {
        let dir = std::env::temp_dir().join("shotput-log-test");
        fs::create_dir_all(&dir).unwrap();
        let file = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix("sink-test")
            .build(&dir)
            .unwrap();
        let (tx, rx) = mpsc::channel();
        let sink = LogSink {
            file: Mutex::new(file),
            file_level: LevelFilter::Info,
            notices: Some(Mutex::new(tx)),
            notice_level,
        };
        (sink, rx)
    }

    #[test]
    fn test_warn_records_become_notices() {
        let (sink, rx) = test_sink(LevelFilter::Warn);
        sink.log(
            &Record::builder()
                .level(Level::Warn)
                .target("test")
                .args(format_args!("clipboard stayed busy"))
                .build(),
        );
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, Level::Warn);
        assert_eq!(notice.message, "clipboard stayed busy");
    }

    #[test]
    fn test_info_records_stay_out_of_notices() {
        let (sink, rx) = test_sink(LevelFilter::Warn);
        sink.log(
            &Record::builder()
                .level(Level::Info)
                .target("test")
                .args(format_args!("routine"))
                .build(),
        );
        assert!(rx.try_recv().is_err());
    }
}
