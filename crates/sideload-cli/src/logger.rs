//! Diagnostic logging via fern: colored levels on stderr, kept apart
//! from the install log (`adb.log`), which is data, not diagnostics.

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::BrightBlack);

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {message}",
                chrono::Local::now().format("%H:%M:%S"),
                record.target(),
                colors.color(record.level()),
            ));
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}
