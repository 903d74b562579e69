//! Process-wide logger for ftdi_probe, configurable from C or Rust.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::{OnceLock, RwLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::{ProbeError, clear_error, cstring_lossy, ftdi_probe_error_t, write_error};
use crate::ffi::write_out;

const CRATE_TARGET: &str = "ftdi_probe";

static LOGGER_INSTALLED: OnceLock<bool> = OnceLock::new();
static PROBE_LOGGER: Lazy<ProbeLogger> = Lazy::new(ProbeLogger::new);

/// Log levels understood by ftdi_probe.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum ftdi_probe_log_level_t {
    FTDI_PROBE_LOG_LEVEL_OFF = 0,
    FTDI_PROBE_LOG_LEVEL_ERROR = 1,
    FTDI_PROBE_LOG_LEVEL_WARN = 2,
    FTDI_PROBE_LOG_LEVEL_INFO = 3,
    FTDI_PROBE_LOG_LEVEL_DEBUG = 4,
    FTDI_PROBE_LOG_LEVEL_TRACE = 5,
}

impl From<ftdi_probe_log_level_t> for LevelFilter {
    fn from(value: ftdi_probe_log_level_t) -> Self {
        use ftdi_probe_log_level_t::*;
        match value {
            FTDI_PROBE_LOG_LEVEL_OFF => LevelFilter::Off,
            FTDI_PROBE_LOG_LEVEL_ERROR => LevelFilter::Error,
            FTDI_PROBE_LOG_LEVEL_WARN => LevelFilter::Warn,
            FTDI_PROBE_LOG_LEVEL_INFO => LevelFilter::Info,
            FTDI_PROBE_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            FTDI_PROBE_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for ftdi_probe_log_level_t {
    fn from(value: Level) -> Self {
        use ftdi_probe_log_level_t::*;
        match value {
            Level::Error => FTDI_PROBE_LOG_LEVEL_ERROR,
            Level::Warn => FTDI_PROBE_LOG_LEVEL_WARN,
            Level::Info => FTDI_PROBE_LOG_LEVEL_INFO,
            Level::Debug => FTDI_PROBE_LOG_LEVEL_DEBUG,
            Level::Trace => FTDI_PROBE_LOG_LEVEL_TRACE,
        }
    }
}

/// A log record passed to a C callback.
///
/// Strings are only valid during the callback. `module_path` and `file` may be
/// null; `line` is 0 when unknown.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct ftdi_probe_log_record_t {
    pub level: ftdi_probe_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
    pub module_path: *const c_char,
    pub file: *const c_char,
    pub line: u32,
}

/// Receives log records; may be called from any thread that logs.
#[allow(non_camel_case_types)]
pub type ftdi_probe_log_callback_t =
    Option<extern "C" fn(record: *const ftdi_probe_log_record_t, user_data: *mut c_void)>;

/// Logging configuration.
///
/// A non-null `filter` is a `RUST_LOG`-style directive list and wins over
/// `level`. With a null `filter`, `RUST_LOG` from the environment is used if
/// set, else `level` applies to ftdi_probe's own targets. A null `callback`
/// writes records to stderr.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct ftdi_probe_log_config_t {
    pub level: ftdi_probe_log_level_t,
    pub filter: *const c_char,
    pub callback: ftdi_probe_log_callback_t,
    pub user_data: *mut c_void,
}

#[derive(Clone, Debug, PartialEq)]
struct Directive {
    target: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
struct LogFilter {
    default: LevelFilter,
    directives: Vec<Directive>,
}

impl LogFilter {
    fn crate_only(level: LevelFilter) -> Self {
        Self {
            default: LevelFilter::Off,
            directives: vec![Directive {
                target: CRATE_TARGET.to_string(),
                level,
            }],
        }
    }

    fn parse(spec: &str) -> Result<Self, String> {
        let mut filter = Self {
            default: LevelFilter::Off,
            directives: Vec::new(),
        };

        for (position, directive) in spec.split(',').map(str::trim).enumerate() {
            if directive.is_empty() {
                continue;
            }
            match directive.split_once('=') {
                Some((target, level)) => {
                    let (target, level) = (target.trim(), level.trim());
                    if target.is_empty() {
                        return Err(format!("empty log target at position {position}"));
                    }
                    let level = parse_level(level)
                        .ok_or_else(|| format!("invalid level `{level}` for `{target}`"))?;
                    filter.directives.push(Directive {
                        target: target.to_string(),
                        level,
                    });
                }
                None => match parse_level(directive) {
                    Some(level) => filter.default = level,
                    None => filter.directives.push(Directive {
                        target: directive.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(filter)
    }

    /// The longest matching target prefix decides; later directives win ties.
    fn level_for(&self, target: &str) -> LevelFilter {
        self.directives
            .iter()
            .filter(|d| target.starts_with(&d.target))
            .fold((0, self.default), |best, d| {
                if d.target.len() >= best.0 {
                    (d.target.len(), d.level)
                } else {
                    best
                }
            })
            .1
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|d| d.level)
            .fold(self.default, Ord::max)
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

struct Sink {
    filter: LogFilter,
    callback: ftdi_probe_log_callback_t,
    // Stored as an address so the logger stays Send + Sync.
    user_data: usize,
}

struct ProbeLogger {
    sink: RwLock<Sink>,
}

impl ProbeLogger {
    fn new() -> Self {
        Self {
            sink: RwLock::new(Sink {
                filter: LogFilter::crate_only(LevelFilter::Info),
                callback: None,
                user_data: 0,
            }),
        }
    }

    fn replace(&self, sink: Sink) {
        *self.sink.write().unwrap_or_else(|err| err.into_inner()) = sink;
    }
}

impl Log for ProbeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
        sink.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        let (callback, user_data) = {
            let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
            if !sink.filter.enabled(record.metadata()) {
                return;
            }
            (sink.callback, sink.user_data)
        };

        let Some(callback) = callback else {
            eprintln!("{} {}: {}", record.level(), record.target(), record.args());
            return;
        };

        let target = cstring_lossy(record.target());
        let message = cstring_lossy(&record.args().to_string());
        let module_path = record.module_path().map(cstring_lossy);
        let file = record.file().map(cstring_lossy);
        let c_record = ftdi_probe_log_record_t {
            level: record.level().into(),
            target: target.as_ptr(),
            message: message.as_ptr(),
            module_path: module_path.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            file: file.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            line: record.line().unwrap_or(0),
        };
        callback(&c_record, user_data as *mut c_void);
    }

    fn flush(&self) {}
}

fn install() -> Result<(), String> {
    if *LOGGER_INSTALLED.get_or_init(|| log::set_logger(&*PROBE_LOGGER).is_ok()) {
        Ok(())
    } else {
        Err("another logger is already installed".to_string())
    }
}

fn apply(
    filter: LogFilter,
    callback: ftdi_probe_log_callback_t,
    user_data: usize,
) -> Result<(), String> {
    install()?;
    let max_level = filter.max_level();
    PROBE_LOGGER.replace(Sink {
        filter,
        callback,
        user_data,
    });
    log::set_max_level(max_level);
    Ok(())
}

fn env_filter() -> Option<Result<LogFilter, String>> {
    let spec = std::env::var("RUST_LOG").ok()?;
    Some(LogFilter::parse(&spec).map_err(|err| format!("invalid RUST_LOG `{spec}`: {err}")))
}

/// Installs the logger writing to stderr; `RUST_LOG` overrides `level`.
///
/// May be called again to change the level.
pub fn init(level: LevelFilter) -> Result<(), ProbeError> {
    let filter = env_filter()
        .unwrap_or_else(|| Ok(LogFilter::crate_only(level)))
        .map_err(ProbeError::Logging)?;
    apply(filter, None, 0).map_err(ProbeError::Logging)
}

/// Fills `config` with defaults: INFO level, no filter, no callback.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_log_config_init(config: *mut ftdi_probe_log_config_t) {
    write_out(
        config,
        ftdi_probe_log_config_t {
            level: ftdi_probe_log_level_t::FTDI_PROBE_LOG_LEVEL_INFO,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        },
    );
}

/// Installs or reconfigures ftdi_probe logging.
///
/// A null `config` selects the defaults. Safe to call repeatedly.
#[unsafe(no_mangle)]
pub extern "C" fn ftdi_probe_log_init(
    config: *const ftdi_probe_log_config_t,
    out_error: *mut *mut ftdi_probe_error_t,
) -> bool {
    clear_error(out_error);
    // Safety: a non-null config must point to a valid ftdi_probe_log_config_t.
    let config = unsafe { config.as_ref() };

    let explicit = config.and_then(|c| {
        if c.filter.is_null() {
            return None;
        }
        // Safety: caller guarantees a valid, NUL-terminated C string.
        let spec = unsafe { CStr::from_ptr(c.filter) }.to_string_lossy();
        Some(LogFilter::parse(&spec).map_err(|err| format!("invalid log filter `{spec}`: {err}")))
    });
    let level = config.map_or(ftdi_probe_log_level_t::FTDI_PROBE_LOG_LEVEL_INFO, |c| c.level);
    let filter = explicit
        .or_else(env_filter)
        .unwrap_or_else(|| Ok(LogFilter::crate_only(level.into())));

    let result = filter.and_then(|filter| {
        apply(
            filter,
            config.and_then(|c| c.callback),
            config.map_or(0, |c| c.user_data as usize),
        )
    });
    match result {
        Ok(()) => true,
        Err(message) => {
            write_error(out_error, message);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::MetadataBuilder;

    fn enabled(filter: &LogFilter, target: &str, level: Level) -> bool {
        filter.enabled(&MetadataBuilder::new().target(target).level(level).build())
    }

    #[test]
    fn crate_only_filter_silences_other_targets() {
        let filter = LogFilter::crate_only(LevelFilter::Debug);
        assert!(enabled(&filter, "ftdi_probe::probe", Level::Debug));
        assert!(!enabled(&filter, "ftdi_probe::probe", Level::Trace));
        assert!(!enabled(&filter, "other", Level::Error));
    }

    #[test]
    fn longest_prefix_wins() {
        let filter = LogFilter::parse("warn,ftdi_probe=info,ftdi_probe::probe=trace").unwrap();
        assert!(enabled(&filter, "ftdi_probe::probe", Level::Trace));
        assert!(!enabled(&filter, "ftdi_probe::interop", Level::Debug));
        assert!(enabled(&filter, "elsewhere", Level::Warn));
        assert!(!enabled(&filter, "elsewhere", Level::Info));
        assert_eq!(filter.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn bare_target_enables_everything_for_it() {
        let filter = LogFilter::parse("ftdi_probe").unwrap();
        assert!(enabled(&filter, "ftdi_probe", Level::Trace));
        assert!(!enabled(&filter, "other", Level::Error));
    }

    #[test]
    fn malformed_directives_are_rejected() {
        assert!(LogFilter::parse("=info").is_err());
        assert!(LogFilter::parse("ftdi_probe=loud").is_err());
        assert_eq!(LogFilter::parse(" , ").unwrap().max_level(), LevelFilter::Off);
    }

    #[test]
    fn config_init_writes_defaults() {
        let mut config = ftdi_probe_log_config_t {
            level: ftdi_probe_log_level_t::FTDI_PROBE_LOG_LEVEL_TRACE,
            filter: c"x".as_ptr(),
            callback: None,
            user_data: ptr::null_mut(),
        };
        ftdi_probe_log_config_init(&mut config);
        assert_eq!(config.level, ftdi_probe_log_level_t::FTDI_PROBE_LOG_LEVEL_INFO);
        assert!(config.filter.is_null());
    }

    #[test]
    fn bad_filter_is_reported_through_out_error() {
        let config = ftdi_probe_log_config_t {
            level: ftdi_probe_log_level_t::FTDI_PROBE_LOG_LEVEL_INFO,
            filter: c"ftdi_probe=shouting".as_ptr(),
            callback: None,
            user_data: ptr::null_mut(),
        };
        let mut error: *mut ftdi_probe_error_t = ptr::null_mut();
        assert!(!ftdi_probe_log_init(&config, &mut error));
        assert!(!error.is_null());
        crate::error::ftdi_probe_error_free(error);
    }
}
