use std::path::Path;

use log::LevelFilter;

/// All log files live under the system log root.
const LOG_ROOT: &str = "/var/log/";

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "[E]",
        log::Level::Warn => "[W]",
        log::Level::Info => "[I]",
        log::Level::Debug | log::Level::Trace => "[D]",
    }
}

/// Set up the process-wide logger appending to `path` under `/var/log/`.
/// Every record becomes one line written straight to the file, so the log
/// is current even when the server dies:
/// `2015-08-05 09:12:44.123456 [I] message`
pub fn init(path: &str, level: LevelFilter) -> Result<(), fern::InitError> {
    let full_path = Path::new(LOG_ROOT).join(path);
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                level_tag(record.level()),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(full_path)?)
        .apply()?;
    Ok(())
}
