//! Bidirectional converters between raw column strings and typed values,
//! and the registry resolving them over a type hierarchy.

use std::{fmt::Display, marker::PhantomData, str::FromStr};

use crate::error::CodecError;

/// Date and time processors backed by `chrono`.
#[cfg(feature = "chrono")]
pub mod datetime;

/// Type-indexed table of value processors.
pub mod registry;

/// Type identities and declared ancestries of processed types.
pub mod value_type;

pub use registry::{Resolved, ValueProcessorRegistry};
pub use value_type::{Ancestor, Lineage, Relation, Supertype, TypeKey, ValueType};

/// Converts between a raw string and one target type.
///
/// `parse` fails with a [`CodecError::Format`] when the string cannot be
/// converted; `format` never fails for a well-formed value.
pub trait ValueProcessor<T>: Send + Sync {
    fn parse(&self, raw: &str) -> Result<T, CodecError>;
    fn format(&self, value: &T) -> String;
}

/// Identity processor for text columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringProcessor;

impl ValueProcessor<String> for StringProcessor {
    fn parse(&self, raw: &str) -> Result<String, CodecError> {
        Ok(raw.to_string())
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }
}

/// Accepts `true`/`false` and `1`/`0`, ignoring case and surrounding
/// whitespace. Formats as `true`/`false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolProcessor;

impl ValueProcessor<bool> for BoolProcessor {
    fn parse(&self, raw: &str) -> Result<bool, CodecError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CodecError::Format(format!("{raw:?} is not a boolean"))),
        }
    }

    fn format(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// Processor for any type that round-trips through [`FromStr`] and
/// [`Display`], such as the numeric primitives and `char`. Surrounding
/// whitespace is trimmed before parsing.
pub struct FromStrProcessor<T> {
    _pd: PhantomData<fn() -> T>,
}

impl<T> FromStrProcessor<T> {
    pub fn new() -> Self {
        Self { _pd: PhantomData }
    }
}

impl<T> Default for FromStrProcessor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueProcessor<T> for FromStrProcessor<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    fn parse(&self, raw: &str) -> Result<T, CodecError> {
        raw.trim().parse::<T>().map_err(|error| {
            CodecError::Format(format!(
                "cannot parse {raw:?} as {}: {error}",
                std::any::type_name::<T>()
            ))
        })
    }

    fn format(&self, value: &T) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoolProcessor, FromStrProcessor, StringProcessor, ValueProcessor};

    #[test]
    fn string_processor_should_keep_raw_text() {
        let processor = StringProcessor;
        assert_eq!(processor.parse("  padded ").unwrap(), "  padded ");
        assert_eq!(processor.format(&"x".to_string()), "x");
    }

    #[test]
    fn bool_processor_should_accept_words_and_digits() {
        let processor = BoolProcessor;
        assert!(processor.parse("TRUE").unwrap());
        assert!(processor.parse(" 1 ").unwrap());
        assert!(!processor.parse("false").unwrap());
        assert!(!processor.parse("0").unwrap());
        assert!(processor.parse("yes").unwrap_err().is_format());
        assert_eq!(processor.format(&true), "true");
    }

    #[test]
    fn from_str_processor_should_trim_and_report_failures() {
        let processor = FromStrProcessor::<i32>::new();
        assert_eq!(processor.parse(" 42 ").unwrap(), 42);
        assert_eq!(processor.format(&-7), "-7");

        let error = processor.parse("4x2").unwrap_err();
        assert!(error.is_format());
        assert!(error.to_string().contains("i32"));

        let floats = FromStrProcessor::<f64>::new();
        assert_eq!(floats.parse("2.5").unwrap(), 2.5);
    }
}
