//! A logging implementation that hands every formatted record to a console sink
#![no_std]

mod console_logger;

pub use console_logger::{ConsoleLogger, ConsoleSink};
