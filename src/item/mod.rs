#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful for debugging mappings.
pub mod logger;

/// This module provides the CSV entry reader and writer and the line source and sink they use.
pub mod csv;
