use core::fmt;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// A function that prints formatted text to the console, e.g. through the U-Boot `printf` or stderr
pub type ConsoleSink = fn(fmt::Arguments);

pub struct ConsoleLogger {
    pub max_log_level: LevelFilter,
    sink: ConsoleSink,
}

impl ConsoleLogger {
    pub const fn new(max_log_level: LevelFilter, sink: ConsoleSink) -> ConsoleLogger {
        ConsoleLogger {
            max_log_level,
            sink,
        }
    }

    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self).map(|_| log::set_max_level(self.max_log_level))
    }

    /// Change the global log filter.
    ///
    /// Records above [`max_log_level`](Self::max_log_level) stay suppressed.
    pub fn update_log_level(&'static self, level: LevelFilter) {
        log::set_max_level(level.min(self.max_log_level));
    }
}

fn level_marker(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_log_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            (self.sink)(format_args!(
                "[{}] {}: {}\n",
                level_marker(record.level()),
                record.target(),
                record.args(),
            ))
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod test {
    use super::*;
    extern crate std;
    use std::string::String;
    use std::sync::Mutex;

    static OUTPUT: Mutex<String> = Mutex::new(String::new());

    fn capture(args: fmt::Arguments) {
        use core::fmt::Write;
        OUTPUT.lock().unwrap().write_fmt(args).unwrap();
    }

    #[test]
    fn records_are_filtered_and_formatted() {
        let logger = ConsoleLogger::new(LevelFilter::Info, capture);

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .target("fit_loader::decompress")
                .args(format_args!("ignoring upper half {:#x}", 1))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("fit_loader")
                .args(format_args!("suppressed"))
                .build(),
        );

        assert_eq!(
            *OUTPUT.lock().unwrap(),
            "[WARN ] fit_loader::decompress: ignoring upper half 0x1\n"
        );
    }

    static LIMITED: ConsoleLogger = ConsoleLogger::new(LevelFilter::Info, capture);

    #[test]
    fn log_level_updates_are_capped_by_the_maximum() {
        LIMITED.update_log_level(LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);
        LIMITED.update_log_level(LevelFilter::Trace);
        assert_eq!(log::max_level(), LevelFilter::Info);
    }
}
