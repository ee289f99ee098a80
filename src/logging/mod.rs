//! Audit logger for ticket submissions and admin changes.
//!
//! Request tracing goes through `tracing`; this `slog` logger carries the
//! business events that operators keep separately.

use slog::{o, Discard, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, PlainDecorator, TermDecorator};

/// Configuration for setting up the logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub async_buffer_size: usize,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_buffer_size: 1024,
            use_color: true,
        }
    }
}

/// Sets up the root audit logger writing to the terminal
pub fn setup_logger(config: LoggerConfig) -> Logger {
    let drain = if config.use_color {
        let decorator = TermDecorator::new().force_color().build();
        Async::new(FullFormat::new(decorator).build().fuse())
            .chan_size(config.async_buffer_size)
            .build()
            .fuse()
    } else {
        let decorator = PlainDecorator::new(std::io::stderr());
        Async::new(FullFormat::new(decorator).build().fuse())
            .chan_size(config.async_buffer_size)
            .build()
            .fuse()
    };

    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Child logger tagged with the component emitting the events
pub fn component_logger(root: &Logger, component: &'static str) -> Logger {
    root.new(o!("component" => component))
}

/// Logger that drops everything, for tests and embedding
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}
