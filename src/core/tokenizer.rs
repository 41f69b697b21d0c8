use crate::{core::dialect::Dialect, error::CodecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    AfterQuote,
}

/// Splits one logical line into raw fields, honoring the delimiter and quote
/// characters of a [`Dialect`].
///
/// A field wrapped in the quote character may contain the delimiter and line
/// breaks literally, and a doubled quote inside it stands for one quote. A
/// quote is only special at the very start of a field; anywhere else it is
/// kept as a literal character.
///
/// With `preserve_all_tokens` enabled (the default) every delimiter separates
/// two fields, so consecutive and boundary delimiters produce empty fields.
/// Disabled, empty unquoted fields are dropped. A quoted empty field (`""`)
/// is always kept.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::{dialect::Dialect, tokenizer::Tokenizer};
///
/// let tokenizer = Tokenizer::new(&Dialect::default());
/// let fields = tokenizer.split(Some("a;\"b;c\";\"say \"\"hi\"\"\"")).unwrap();
/// assert_eq!(fields, Some(vec!["a".to_string(), "b;c".to_string(), "say \"hi\"".to_string()]));
///
/// let collapsing = tokenizer.preserve_all_tokens(false);
/// assert_eq!(
///     collapsing.split(Some("a;;;c")).unwrap(),
///     Some(vec!["a".to_string(), "c".to_string()])
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    delimiter: char,
    quote: char,
    preserve_all_tokens: bool,
}

impl Tokenizer {
    pub fn new(dialect: &Dialect) -> Self {
        Self {
            delimiter: dialect.delimiter(),
            quote: dialect.quote(),
            preserve_all_tokens: true,
        }
    }

    pub fn preserve_all_tokens(mut self, yes: bool) -> Self {
        self.preserve_all_tokens = yes;
        self
    }

    /// Splits `line` into fields.
    ///
    /// `None` marks the end of the stream and yields `None`; an empty line
    /// yields zero fields. An unterminated quoted field is a
    /// [`CodecError::Format`].
    pub fn split(&self, line: Option<&str>) -> Result<Option<Vec<String>>, CodecError> {
        let Some(line) = line else {
            return Ok(None);
        };

        let mut fields = Vec::new();
        if line.is_empty() {
            return Ok(Some(fields));
        }

        let state = self.scan(line, |field, quoted| {
            if self.preserve_all_tokens || quoted || !field.is_empty() {
                fields.push(field);
            }
        });

        if state == State::Quoted {
            return Err(CodecError::Format(format!(
                "unterminated quoted field in record {:?}",
                line
            )));
        }

        Ok(Some(fields))
    }

    /// Whether `line` ends outside of a quoted field. An unbalanced line is
    /// the beginning of a record spanning several physical lines.
    pub fn is_balanced(&self, line: &str) -> bool {
        self.scan(line, |_, _| {}) != State::Quoted
    }

    /// Runs the field state machine over `line`, handing every completed
    /// field to `emit` along with whether it was quoted. Returns the final
    /// state; when it is `Quoted` the last field is not emitted.
    fn scan(&self, line: &str, mut emit: impl FnMut(String, bool)) -> State {
        let mut state = State::FieldStart;
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            state = match state {
                State::FieldStart if c == self.quote => {
                    quoted = true;
                    State::Quoted
                }
                State::FieldStart | State::Unquoted | State::AfterQuote if c == self.delimiter => {
                    emit(std::mem::take(&mut current), quoted);
                    quoted = false;
                    State::FieldStart
                }
                State::FieldStart | State::Unquoted | State::AfterQuote => {
                    current.push(c);
                    State::Unquoted
                }
                State::Quoted if c == self.quote => {
                    if chars.peek() == Some(&self.quote) {
                        chars.next();
                        current.push(self.quote);
                        State::Quoted
                    } else {
                        State::AfterQuote
                    }
                }
                State::Quoted => {
                    current.push(c);
                    State::Quoted
                }
            };
        }

        if state != State::Quoted {
            emit(current, quoted);
        }

        state
    }
}

/// Splits `line` with the quote and delimiter of `dialect`, preserving all
/// tokens.
pub fn split(line: Option<&str>, dialect: &Dialect) -> Result<Option<Vec<String>>, CodecError> {
    Tokenizer::new(dialect).split(line)
}

/// Joins `fields` with the dialect's delimiter.
///
/// A field is wrapped in quotes if and only if it contains the delimiter,
/// the quote character or a line break; quotes inside it are doubled.
/// Zero fields join to the empty string.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::{dialect::Dialect, tokenizer::join};
///
/// let dialect = Dialect::default();
/// assert_eq!(join(&["A", "B", "C"], &dialect), "A;B;C");
/// assert_eq!(join(&["x;y", "plain"], &dialect), "\"x;y\";plain");
/// assert_eq!(join::<&str>(&[], &dialect), "");
/// ```
pub fn join<S: AsRef<str>>(fields: &[S], dialect: &Dialect) -> String {
    let delimiter = dialect.delimiter();
    let quote = dialect.quote();
    let mut line = String::new();

    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            line.push(delimiter);
        }

        let field = field.as_ref();
        let needs_quote = field
            .chars()
            .any(|c| c == delimiter || c == quote || c == '\n' || c == '\r');

        if needs_quote {
            line.push(quote);
            for c in field.chars() {
                if c == quote {
                    line.push(quote);
                }
                line.push(c);
            }
            line.push(quote);
        } else {
            line.push_str(field);
        }
    }

    line
}
