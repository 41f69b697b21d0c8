/// Delimiter, quote and comment characters plus header and blank-line policy.
pub mod dialect;

/// Contracts between the codec and the caller: parsing context, entry
/// parsers and converters, item readers and writers.
pub mod item;

/// Statically built column tables mapping raw fields to typed entries.
pub mod mapping;

/// Value processors and the type-indexed registry resolving them.
pub mod processor;

/// Splitting delimited lines into fields and joining them back.
pub mod tokenizer;
