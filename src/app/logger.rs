use std::fs::{File, OpenOptions};
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::SystemTime;

use syslog::{Facility, Formatter3164, LoggerBackend};

use crate::{Error, Result};

const LOG_LEVEL_ENV: &str = "PIXELSTAT_LOG_LEVEL";
const LOG_PATH_ENV: &str = "PIXELSTAT_LOG_PATH";
const SYSLOG_PROCESS: &str = "pixelstat";

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl FromStr for LogLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(Error::InvalidArgs(format!(
                "unknown log level '{other}' (error|warn|info|debug|trace)"
            ))),
        }
    }
}

type SyslogWriter = syslog::Logger<LoggerBackend, Formatter3164>;

/// Leveled logger writing to stderr, plus an optional append-only file and
/// an optional syslog sink.
pub struct Logger {
    level: LogLevel,
    file: Option<File>,
    syslog: Option<Mutex<SyslogWriter>>,
}

impl Logger {
    /// `PIXELSTAT_LOG_LEVEL` overrides `level`; `file_path` falls back to
    /// `PIXELSTAT_LOG_PATH`. An unopenable file is ignored.
    pub fn new(level: LogLevel, file_path: Option<String>) -> Self {
        let env_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok());
        let effective_level = env_level.unwrap_or(level);

        let path = file_path.or_else(|| std::env::var(LOG_PATH_ENV).ok());
        let file = path.and_then(|p| OpenOptions::new().create(true).append(true).open(p).ok());
        Self {
            level: effective_level,
            file,
            syslog: None,
        }
    }

    /// Also forward records to the local syslog daemon (facility `daemon`).
    pub fn enable_syslog(&mut self) -> Result<()> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: SYSLOG_PROCESS.into(),
            pid: std::process::id(),
        };
        let writer = syslog::unix(formatter)
            .map_err(|err| Error::Io(std::io::Error::other(err.to_string())))?;
        self.syslog = Some(Mutex::new(writer));
        Ok(())
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: LogLevel, msg: impl AsRef<str>) {
        if !self.enabled(level) {
            return;
        }
        let msg = msg.as_ref();
        let ts = humantime::format_rfc3339_millis(SystemTime::now());
        let line = format!("[{ts}] [{level:?}] {msg}");
        eprintln!("{line}");
        if let Some(file) = self.file.as_ref() {
            if let Ok(mut clone) = file.try_clone() {
                let _ = writeln!(clone, "{line}");
            }
        }
        if let Some(writer) = self.syslog.as_ref() {
            if let Ok(mut writer) = writer.lock() {
                let _ = match level {
                    LogLevel::Error => writer.err(msg),
                    LogLevel::Warn => writer.warning(msg),
                    LogLevel::Info => writer.info(msg),
                    LogLevel::Debug | LogLevel::Trace => writer.debug(msg),
                };
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn trace(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Trace, msg);
    }
}
