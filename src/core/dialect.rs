use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Characters and flags defining how a delimited-text line is segmented and
/// how comments, headers and blank lines are treated.
///
/// A `Dialect` is immutable once built. Construction rejects dialects whose
/// delimiter, quote and comment characters are not pairwise distinct, or that
/// use a line break as one of them.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::dialect::{Dialect, DialectBuilder};
///
/// let dialect = DialectBuilder::new()
///     .delimiter('\t')
///     .skip_header(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(dialect.delimiter(), '\t');
/// assert_eq!(dialect.quote(), '"');
/// assert!(!dialect.skip_header());
///
/// // A delimiter equal to the quote character is rejected
/// assert!(Dialect::new(',', ',', '#', true, true).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DialectConfig")]
pub struct Dialect {
    delimiter: char,
    quote: char,
    comment: char,
    skip_header: bool,
    ignore_empty_lines: bool,
}

impl Dialect {
    /// Builds a dialect from its five settings, validating the characters.
    pub fn new(
        delimiter: char,
        quote: char,
        comment: char,
        skip_header: bool,
        ignore_empty_lines: bool,
    ) -> Result<Self, CodecError> {
        let dialect = Self {
            delimiter,
            quote,
            comment,
            skip_header,
            ignore_empty_lines,
        };
        dialect.validate()?;
        Ok(dialect)
    }

    /// Comma-delimited variant of the default dialect.
    pub fn regional() -> Self {
        Self {
            delimiter: ',',
            ..Self::default()
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn comment(&self) -> char {
        self.comment
    }

    pub fn skip_header(&self) -> bool {
        self.skip_header
    }

    pub fn ignore_empty_lines(&self) -> bool {
        self.ignore_empty_lines
    }

    /// Returns a copy of this dialect using another delimiter.
    pub fn with_delimiter(&self, delimiter: char) -> Result<Self, CodecError> {
        Self::new(
            delimiter,
            self.quote,
            self.comment,
            self.skip_header,
            self.ignore_empty_lines,
        )
    }

    /// Whether `line` is a comment: its first non-whitespace character is
    /// the comment indicator.
    pub fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with(self.comment)
    }

    fn validate(&self) -> Result<(), CodecError> {
        let named = [
            ("delimiter", self.delimiter),
            ("quote", self.quote),
            ("comment", self.comment),
        ];

        for (name, c) in named {
            if c == '\n' || c == '\r' {
                return Err(CodecError::InvalidDialect(format!(
                    "{name} character cannot be a line break"
                )));
            }
        }

        for (i, (left_name, left)) in named.iter().enumerate() {
            for (right_name, right) in &named[i + 1..] {
                if left == right {
                    return Err(CodecError::InvalidDialect(format!(
                        "{left_name} and {right_name} share the character {left:?}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for Dialect {
    /// Semicolon-delimited dialect, `"` quote, `#` comment, header skipped
    /// and blank lines ignored.
    fn default() -> Self {
        Self {
            delimiter: ';',
            quote: '"',
            comment: '#',
            skip_header: true,
            ignore_empty_lines: true,
        }
    }
}

/// Unvalidated dialect settings as found in a configuration document.
/// Missing keys take the default dialect's values.
#[derive(Deserialize)]
#[serde(default)]
struct DialectConfig {
    delimiter: char,
    quote: char,
    comment: char,
    skip_header: bool,
    ignore_empty_lines: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        let dialect = Dialect::default();
        Self {
            delimiter: dialect.delimiter,
            quote: dialect.quote,
            comment: dialect.comment,
            skip_header: dialect.skip_header,
            ignore_empty_lines: dialect.ignore_empty_lines,
        }
    }
}

impl TryFrom<DialectConfig> for Dialect {
    type Error = CodecError;

    fn try_from(config: DialectConfig) -> Result<Self, Self::Error> {
        Dialect::new(
            config.delimiter,
            config.quote,
            config.comment,
            config.skip_header,
            config.ignore_empty_lines,
        )
    }
}

/// A builder for configuring a [`Dialect`].
///
/// Starts from [`Dialect::default`]; every setter returns `self` for chaining
/// and [`DialectBuilder::build`] validates the result.
#[derive(Default)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing dialect instead of the default one.
    pub fn from_dialect(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.dialect.delimiter = delimiter;
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.dialect.quote = quote;
        self
    }

    pub fn comment(mut self, comment: char) -> Self {
        self.dialect.comment = comment;
        self
    }

    pub fn skip_header(mut self, yes: bool) -> Self {
        self.dialect.skip_header = yes;
        self
    }

    pub fn ignore_empty_lines(mut self, yes: bool) -> Self {
        self.dialect.ignore_empty_lines = yes;
        self
    }

    pub fn build(self) -> Result<Dialect, CodecError> {
        self.dialect.validate()?;
        Ok(self.dialect)
    }
}
