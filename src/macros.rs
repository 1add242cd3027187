//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and log the result as
//! an [`UnstructuredEvent`](crate::UnstructuredEvent). They accept anything
//! with a `log_message(level, message)` method: a [`Logger`](crate::Logger)
//! or an [`UnstructuredLogger`](crate::UnstructuredLogger).
//!
//! # Examples
//!
//! ```
//! use rust_typed_logger::prelude::*;
//! use rust_typed_logger::info;
//!
//! let logger = Logger::builder().sink(Vec::new()).build().unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With fields
//! let request = logger.unstructured().with_field("request_id", "r-17");
//! info!(request, "User {} performed action: {}", 42, "login");
//! ```

/// Log a formatted message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_typed_logger::prelude::*;
/// # let logger = Logger::builder().sink(Vec::new()).build().unwrap();
/// use rust_typed_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_message($level, format!($($arg)+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_typed_logger::prelude::*;
/// # let logger = Logger::builder().sink(Vec::new()).build().unwrap();
/// use rust_typed_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message; the logger's terminator runs afterwards.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}

/// Log a panic-level message; the logger's terminator runs afterwards.
///
/// Named `panic_log!` so it does not shadow `std::panic!`.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Panic, $($arg)+)
    };
}
