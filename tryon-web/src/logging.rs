//! Console logger.
//!
//! Routes `log` records to the browser console, one console method per
//! level so devtools filtering works. Install once with `init_with_level`.

use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger {
    level: LevelFilter,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_record(record.level(), record.target(), &record.args().to_string());
        let line = wasm_bindgen::JsValue::from_str(&line);
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug => web_sys::console::log_1(&line),
            Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

fn format_record(level: Level, target: &str, message: &str) -> String {
    // Strip the crate prefix; module paths are enough in devtools
    let target = target.strip_prefix("tryon_web::").unwrap_or(target);
    format!("[{:>5} {}] {}", level, target, message)
}

/// Level names accepted from JS; anything unknown falls back to `Info`
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Install the console logger with the provided level filter.
///
/// Later calls only adjust the max level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| ConsoleLogger { level: LevelFilter::Trace });
        log::set_logger(logger)?;
    }
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record(Level::Warn, "tryon_web::share::strategy", "falling back"),
            "[ WARN share::strategy] falling back"
        );
        assert_eq!(format_record(Level::Info, "app", "hi"), "[ INFO app] hi");
    }
}
