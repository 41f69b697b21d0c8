use std::{
    cell::{OnceCell, RefCell},
    fs::File,
    io::{self, BufReader, Read},
    marker::PhantomData,
    path::Path,
};

use log::debug;

use crate::{
    core::{
        dialect::Dialect,
        item::{EntryFile, EntryParser, ItemReader, ItemReaderResult, ParsingContext},
        tokenizer::Tokenizer,
    },
    error::CodecError,
    item::csv::lines::LineSource,
};

/// A CSV entry reader that implements the `ItemReader` trait.
///
/// Each call to `read` pulls the next logical line from the stream, splits
/// it into raw fields and hands them to the [`EntryParser`] as a
/// [`ParsingContext`]. Comment lines, blank lines (when the dialect ignores
/// them) and the header (when the dialect skips it) never reach the parser.
///
/// # Type Parameters
///
/// - `R`: The type of reader providing the CSV data. Must implement `Read`.
/// - `E`: The entry type produced by the parser.
/// - `P`: The entry parser.
///
/// # Implementation Details
///
/// - Uses a `RefCell` so that `read` can advance the stream through `&self`
/// - The stream is released on `close` or when the reader is dropped
/// - Format errors are prefixed with the line the faulty record started on
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::item::{ItemReader, ParsingContext};
/// use csv_codec_rs::core::dialect::Dialect;
/// use csv_codec_rs::item::csv::csv_reader::CsvEntryReaderBuilder;
/// use csv_codec_rs::CodecError;
///
/// let data = "\
/// name,value
/// foo,123
/// # not a record
/// bar,456
/// ";
///
/// let reader = CsvEntryReaderBuilder::new()
///     .dialect(Dialect::regional())
///     .from_reader(data.as_bytes(), |context: &ParsingContext<'_>| -> Result<_, CodecError> {
///         let value: i32 = context
///             .field(1)?
///             .parse()
///             .map_err(|_| CodecError::Format("bad value".to_string()))?;
///         Ok((context.field(0)?.to_string(), value))
///     });
///
/// assert_eq!(reader.read().unwrap(), Some(("foo".to_string(), 123)));
/// assert_eq!(reader.read().unwrap(), Some(("bar".to_string(), 456)));
/// assert_eq!(reader.read().unwrap(), None);
/// ```
pub struct CsvEntryReader<R, E, P> {
    source: RefCell<Option<LineSource<BufReader<R>>>>,
    headers: OnceCell<Option<Vec<String>>>,
    tokenizer: Tokenizer,
    dialect: Dialect,
    parser: P,
    _pd: PhantomData<fn() -> E>,
}

impl<R: Read, E, P: EntryParser<E>> CsvEntryReader<R, E, P> {
    /// Lazily reads the remaining entries. Errors are yielded in place; the
    /// caller decides whether to keep iterating.
    pub fn iter(&self) -> Entries<'_, R, E, P> {
        Entries { reader: self }
    }

    /// Fields of the skipped header line, once it has been read. A header
    /// that failed to split has no fields.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.get().and_then(|headers| headers.as_deref())
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn is_closed(&self) -> bool {
        self.source.borrow().is_none()
    }

    /// Splits the skipped header once. A malformed header is reported by
    /// the first read only.
    fn capture_headers(&self, source: &LineSource<BufReader<R>>) -> Result<(), CodecError> {
        if self.headers.get().is_some() {
            return Ok(());
        }

        let Some(header) = source.header() else {
            return Ok(());
        };

        match self.tokenizer.split(Some(header)) {
            Ok(fields) => {
                let _ = self.headers.set(Some(fields.unwrap_or_default()));
                Ok(())
            }
            Err(error) => {
                let _ = self.headers.set(None);
                Err(error.at_line(1))
            }
        }
    }
}

impl<R: Read, E, P: EntryParser<E>> ItemReader<E> for CsvEntryReader<R, E, P> {
    /// Reads the next entry from the CSV stream.
    ///
    /// # Returns
    /// - `Ok(Some(entry))` if an entry is successfully read
    /// - `Ok(None)` if there are no more records to read
    /// - `Err(CodecError::Format(_))` if the record is malformed or rejected by the parser
    /// - `Err(CodecError::Resource(_))` if the stream fails or the reader is closed
    fn read(&self) -> ItemReaderResult<E> {
        let (fields, line_number) = {
            let mut guard = self.source.borrow_mut();
            let source = guard.as_mut().ok_or_else(closed)?;

            let line = source.next_record_line()?;
            self.capture_headers(source)?;

            let line_number = source.record_line();
            let fields = self
                .tokenizer
                .split(line.as_deref())
                .map_err(|error| error.at_line(line_number))?;

            match fields {
                Some(fields) => (fields, line_number),
                None => return Ok(None),
            }
        };

        let context = ParsingContext::new(&fields, &self.dialect)
            .with_headers(self.headers())
            .with_line_number(line_number);

        self.parser
            .parse(&context)
            .map(Some)
            .map_err(|error| error.at_line(line_number))
    }

    /// Releases the underlying stream. Closing twice is a no-op.
    fn close(&self) -> Result<(), CodecError> {
        if self.source.borrow_mut().take().is_some() {
            debug!("CSV reader closed");
        }
        Ok(())
    }
}

fn closed() -> CodecError {
    CodecError::Resource(io::Error::new(
        io::ErrorKind::NotConnected,
        "the reader is closed",
    ))
}

/// Iterator over the entries of a [`CsvEntryReader`].
pub struct Entries<'a, R, E, P> {
    reader: &'a CsvEntryReader<R, E, P>,
}

impl<R: Read, E, P: EntryParser<E>> Iterator for Entries<'_, R, E, P> {
    type Item = Result<E, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read().transpose()
    }
}

/// A builder for configuring CSV entry reading.
///
/// # Default Configuration
///
/// - Dialect: [`Dialect::default`] (semicolon, header skipped, blank lines ignored)
/// - All tokens preserved: consecutive delimiters produce empty fields
/// - Buffer capacity: 8 KiB
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::dialect::DialectBuilder;
/// use csv_codec_rs::core::item::{ItemReader, ParsingContext};
/// use csv_codec_rs::item::csv::csv_reader::CsvEntryReaderBuilder;
/// use csv_codec_rs::CodecError;
///
/// let dialect = DialectBuilder::new()
///     .delimiter('|')
///     .skip_header(false)
///     .build()
///     .unwrap();
///
/// let reader = CsvEntryReaderBuilder::new()
///     .dialect(dialect)
///     .preserve_all_tokens(false)
///     .from_reader("a||b".as_bytes(), |context: &ParsingContext<'_>| {
///         Ok::<usize, CodecError>(context.len())
///     });
///
/// assert_eq!(reader.read().unwrap(), Some(2));
/// ```
pub struct CsvEntryReaderBuilder {
    dialect: Dialect,
    preserve_all_tokens: bool,
    capacity: usize,
}

impl Default for CsvEntryReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvEntryReaderBuilder {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            preserve_all_tokens: true,
            capacity: 8 * 1024,
        }
    }

    /// Sets the dialect used to skip lines and split records.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Whether consecutive and boundary delimiters produce empty fields
    /// (`true`, the default) or collapse.
    pub fn preserve_all_tokens(mut self, yes: bool) -> Self {
        self.preserve_all_tokens = yes;
        self
    }

    /// Sets the capacity of the read buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Creates a `CsvEntryReader` from any source implementing `Read`, such
    /// as files, byte slices or network streams.
    pub fn from_reader<R, E, P>(self, rdr: R, parser: P) -> CsvEntryReader<R, E, P>
    where
        R: Read,
        P: EntryParser<E>,
    {
        let buffered = BufReader::with_capacity(self.capacity, rdr);
        debug!("CSV reader opened with {:?}", self.dialect);

        CsvEntryReader {
            source: RefCell::new(Some(LineSource::new(buffered, self.dialect))),
            headers: OnceCell::new(),
            tokenizer: Tokenizer::new(&self.dialect).preserve_all_tokens(self.preserve_all_tokens),
            dialect: self.dialect,
            parser,
            _pd: PhantomData,
        }
    }

    /// Creates a `CsvEntryReader` from a file path.
    ///
    /// # Errors
    /// Returns a [`CodecError::Resource`] if the file cannot be opened.
    pub fn from_path<Q, E, P>(self, path: Q, parser: P) -> Result<CsvEntryReader<File, E, P>, CodecError>
    where
        Q: AsRef<Path>,
        P: EntryParser<E>,
    {
        let file = File::open(path)?;
        Ok(self.from_reader(file, parser))
    }

    /// Opens the file `E::FILE_NAME` inside `dir`.
    ///
    /// An absent file yields `Ok(None)` when the entry is marked optional and
    /// a [`CodecError::Resource`] otherwise.
    pub fn from_entry_dir<Q, E, P>(
        self,
        dir: Q,
        parser: P,
    ) -> Result<Option<CsvEntryReader<File, E, P>>, CodecError>
    where
        Q: AsRef<Path>,
        E: EntryFile,
        P: EntryParser<E>,
    {
        let path = dir.as_ref().join(E::FILE_NAME);
        match File::open(&path) {
            Ok(file) => Ok(Some(self.from_reader(file, parser))),
            Err(error) if error.kind() == io::ErrorKind::NotFound && E::OPTIONAL => {
                debug!("Optional entry file {} is absent", path.display());
                Ok(None)
            }
            Err(error) => Err(CodecError::Resource(io::Error::new(
                error.kind(),
                format!("{}: {error}", path.display()),
            ))),
        }
    }
}
