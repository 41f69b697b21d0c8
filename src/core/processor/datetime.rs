use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    core::processor::{ValueProcessor, ValueType},
    error::CodecError,
};

impl ValueType for NaiveDate {}

impl ValueType for NaiveTime {}

impl ValueType for NaiveDateTime {}

macro_rules! pattern_processor {
    ($(#[$doc:meta])* $name:ident, $target:ty, $default:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pattern: String,
        }

        impl $name {
            /// Uses a `chrono` format pattern such as `"%Y-%m-%d"`.
            pub fn new(pattern: impl Into<String>) -> Self {
                Self {
                    pattern: pattern.into(),
                }
            }

            pub fn pattern(&self) -> &str {
                &self.pattern
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new($default)
            }
        }

        impl ValueProcessor<$target> for $name {
            fn parse(&self, raw: &str) -> Result<$target, CodecError> {
                <$target>::parse_from_str(raw.trim(), &self.pattern).map_err(|error| {
                    CodecError::Format(format!(
                        "cannot parse {raw:?} with pattern {:?}: {error}",
                        self.pattern
                    ))
                })
            }

            fn format(&self, value: &$target) -> String {
                value.format(&self.pattern).to_string()
            }
        }
    };
}

pattern_processor!(
    /// Calendar dates, `%Y%m%d` (e.g. `20240131`) by default.
    NaiveDateProcessor,
    NaiveDate,
    "%Y%m%d"
);

pattern_processor!(
    /// Times of day, `%H:%M:%S` by default.
    NaiveTimeProcessor,
    NaiveTime,
    "%H:%M:%S"
);

pattern_processor!(
    /// Timestamps without offset, `%Y-%m-%dT%H:%M:%S` by default.
    NaiveDateTimeProcessor,
    NaiveDateTime,
    "%Y-%m-%dT%H:%M:%S"
);
