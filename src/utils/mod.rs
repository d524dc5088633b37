pub mod command;
pub mod locker;
pub mod runtime;

// Trait-based abstraction for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use command::{ArgStyle, DumpCommand};
pub use executor::{DumpError, DumpExecutor, DumpRequest, RealExecutor};
