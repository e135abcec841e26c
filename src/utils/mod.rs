//! Utilities: logging setup (level derived from -v / -q).
//!
//! Key items:
//!   init_logging / derive_level

/// Logging helpers.
pub mod logging {
    use tracing::Level;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Info => "INFO",
                LogLevel::Debug => "DEBUG",
                LogLevel::Trace => "TRACE",
            }
        }

        fn tracing_level(&self) -> Level {
            match self {
                LogLevel::Error => Level::ERROR,
                LogLevel::Info => Level::INFO,
                LogLevel::Debug => Level::DEBUG,
                LogLevel::Trace => Level::TRACE,
            }
        }
    }

    /// Install the global subscriber. Logs go to stderr so command output stays clean on stdout.
    pub fn init_logging(level: LogLevel) {
        let installed = tracing_subscriber::fmt()
            .with_max_level(level.tracing_level())
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        if installed.is_err() {
            tracing::debug!(level = level.as_str(), "logging already initialized");
        }
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

pub use logging::{derive_level, init_logging};
