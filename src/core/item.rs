use crate::{
    core::{dialect::Dialect, processor::ValueProcessor, tokenizer::Tokenizer},
    error::CodecError,
};

/// Represents the result of reading an item from the reader.
///
/// - `Ok(Some(entry))` when an entry was read
/// - `Ok(None)` once the stream is exhausted
/// - `Err(error)` when the record or the stream is faulty
pub type ItemReaderResult<E> = Result<Option<E>, CodecError>;

/// Represents the result of writing items.
pub type ItemWriterResult = Result<(), CodecError>;

/// Read-only positional view over the raw fields of one record.
///
/// Handed to an [`EntryParser`] for the duration of a single parse call. It
/// also exposes the active [`Dialect`], the header captured by the reader (if
/// any) and the physical line the record started on.
#[derive(Debug, Clone, Copy)]
pub struct ParsingContext<'a> {
    fields: &'a [String],
    dialect: &'a Dialect,
    headers: Option<&'a [String]>,
    line_number: usize,
}

impl<'a> ParsingContext<'a> {
    pub fn new(fields: &'a [String], dialect: &'a Dialect) -> Self {
        Self {
            fields,
            dialect,
            headers: None,
            line_number: 0,
        }
    }

    pub fn with_headers(mut self, headers: Option<&'a [String]>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw field at `position`, if the record has that many fields.
    pub fn get(&self, position: usize) -> Option<&'a str> {
        self.fields.get(position).map(String::as_str)
    }

    /// Raw field at `position`; a missing field is a format error.
    pub fn field(&self, position: usize) -> Result<&'a str, CodecError> {
        self.get(position).ok_or_else(|| {
            CodecError::Format(format!(
                "expected a field at position {position} but the record has {} field(s)",
                self.fields.len()
            ))
        })
    }

    pub fn fields(&self) -> &'a [String] {
        self.fields
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    pub fn headers(&self) -> Option<&'a [String]> {
        self.headers
    }

    /// 1-based physical line the record started on, 0 when unknown.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Position of the header named `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.headers?.iter().position(|header| header == name)
    }

    /// Raw field under the header named `name`.
    pub fn by_name(&self, name: &str) -> Option<&'a str> {
        self.position_of(name).and_then(|position| self.get(position))
    }

    /// Parses the field at `position` with `processor`.
    pub fn parse_with<T, P>(&self, position: usize, processor: &P) -> Result<T, CodecError>
    where
        P: ValueProcessor<T> + ?Sized,
    {
        processor.parse(self.field(position)?)
    }

    /// Splits the field at `position` again, using `delimiter` and the quote
    /// rules of the active dialect. An empty field has no sub-fields.
    pub fn sub_fields(&self, position: usize, delimiter: char) -> Result<Vec<String>, CodecError> {
        let dialect = self.dialect.with_delimiter(delimiter)?;
        let fields = Tokenizer::new(&dialect).split(Some(self.field(position)?))?;
        Ok(fields.unwrap_or_default())
    }
}

/// Maps the raw fields of one record to a typed entry.
///
/// Supplied by the caller; the codec drives it without knowing the shape of
/// `E`. Any `Fn(&ParsingContext) -> Result<E, CodecError>` is an
/// `EntryParser`.
pub trait EntryParser<E> {
    fn parse(&self, context: &ParsingContext<'_>) -> Result<E, CodecError>;
}

impl<E, F> EntryParser<E> for F
where
    F: Fn(&ParsingContext<'_>) -> Result<E, CodecError>,
{
    fn parse(&self, context: &ParsingContext<'_>) -> Result<E, CodecError> {
        self(context)
    }
}

/// Maps a typed entry back to its ordered raw fields.
///
/// Any `Fn(&E) -> Result<Vec<String>, CodecError>` is an `EntryConverter`.
pub trait EntryConverter<E> {
    fn convert(&self, entry: &E) -> Result<Vec<String>, CodecError>;

    /// Column names written before the first record when the writer emits a
    /// header row.
    fn header(&self) -> Option<Vec<String>> {
        None
    }
}

impl<E, F> EntryConverter<E> for F
where
    F: Fn(&E) -> Result<Vec<String>, CodecError>,
{
    fn convert(&self, entry: &E) -> Result<Vec<String>, CodecError> {
        self(entry)
    }
}

/// Marks a record shape with the logical file it is stored in.
///
/// When `OPTIONAL` is set the file may be absent altogether; see
/// [`crate::item::csv::csv_reader::CsvEntryReaderBuilder::from_entry_dir`].
pub trait EntryFile {
    const FILE_NAME: &'static str;
    const OPTIONAL: bool = false;
}

pub trait ItemReader<E> {
    /// Reads the next entry, `Ok(None)` once the stream is exhausted.
    fn read(&self) -> ItemReaderResult<E>;

    /// Drains the remaining entries in stream order.
    fn read_all(&self) -> Result<Vec<E>, CodecError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    fn close(&self) -> Result<(), CodecError> {
        Ok(())
    }
}

pub trait ItemWriter<E> {
    fn write(&self, entry: &E) -> ItemWriterResult;

    /// Writes `entries` one at a time, in order.
    fn write_all(&self, entries: &[E]) -> ItemWriterResult {
        for entry in entries {
            self.write(entry)?;
        }
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult;

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
