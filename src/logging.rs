use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Initialise the global logger
///
/// `RUST_LOG` takes precedence over `default_level` when it parses as a level.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(default_level: LevelFilter) {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);
    let initialised = env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .is_ok();
    if initialised {
        log::debug!("Logger initialised at {}", level);
    }
}
