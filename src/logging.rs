//! Logger setup.
//!
//! The library itself only talks to the `log` facade. Binaries and tests
//! that want to see the output call [`init_logging`] once at startup.

use std::sync::Once;

/// How the `env_logger` backend is set up.
///
/// `filter` uses the `env_logger` directive syntax, for example
/// `"info"` or `"tessera=debug,wgpu_core=warn"`. Without one, `RUST_LOG`
/// is used, then `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Send output to the test harness capture instead of stderr.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn write_style(mut self, write_style: env_logger::WriteStyle) -> Self {
        self.write_style = write_style;
        self
    }

    pub fn is_test(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        match (&self.filter, std::env::var("RUST_LOG")) {
            (Some(filter), _) => builder.parse_filters(filter),
            (None, Ok(filter)) => builder.parse_filters(&filter),
            (None, Err(_)) => builder.filter_level(log::LevelFilter::Info),
        };
        builder.write_style(self.write_style).is_test(self.is_test);
        builder
    }
}

static INIT: Once = Once::new();

/// Installs the global logger.
///
/// Only the first call has any effect. If another logger was installed
/// outside this function, that logger is kept.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if config.builder().try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::new().filter("tessera=debug").is_test(true));
        init_logging(LoggingConfig::new().filter("off"));
        assert!(log::max_level() >= log::LevelFilter::Debug);
    }
}
