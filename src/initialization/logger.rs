//! Logger initialization.

use std::io::Write;

use colored::*;
use env_logger::fmt::Formatter;
use log::{LevelFilter, Record};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// Dependency modules capped below the crate's own level.
const QUIET_MODULES: [(&str, LevelFilter); 4] = [
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("rustls", LevelFilter::Warn),
];

/// Installs `env_logger` with the given level and format.
///
/// `RUST_LOG` is read first and `level` overrides it, so per-module filters
/// from the environment still apply to other crates:
///
/// ```bash
/// RUST_LOG=reqwest=debug atlas_probes --log-level info results 3679868
/// ```
///
/// # Errors
///
/// `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, cap) in QUIET_MODULES {
        builder.filter_module(module, cap.min(level));
    }
    builder.filter_module("atlas_probes", level);

    match format {
        LogFormat::Json => builder.format(write_json),
        LogFormat::Plain => builder.format(write_plain),
    };

    builder.try_init()?;
    Ok(())
}

/// One object per line: `ts` (unix millis), `level`, `target`, `msg`.
fn write_json(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    let msg = serde_json::to_string(&record.args().to_string())
        .unwrap_or_else(|_| "\"\"".into());
    writeln!(
        buf,
        "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
        chrono::Utc::now().timestamp_millis(),
        record.level(),
        record.target(),
        msg
    )
}

fn write_plain(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    let level = record.level().to_string();
    let level = match record.level() {
        log::Level::Error => level.red(),
        log::Level::Warn => level.yellow(),
        log::Level::Info => level.green(),
        log::Level::Debug => level.blue(),
        log::Level::Trace => level.purple(),
    };
    writeln!(buf, "{} [{}] {}", record.target().cyan(), level, record.args())
}
