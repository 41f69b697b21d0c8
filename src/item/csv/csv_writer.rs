use std::{
    cell::RefCell,
    fs::File,
    io::{self, Write},
    marker::PhantomData,
    path::Path,
};

use log::{debug, warn};

use crate::{
    core::{
        dialect::Dialect,
        item::{EntryConverter, ItemWriter, ItemWriterResult},
    },
    error::CodecError,
    item::csv::lines::{LineSink, Terminator},
};

struct WriterState<W: Write> {
    sink: LineSink<W>,
    pending_header: Option<Vec<String>>,
}

impl<W: Write> WriterState<W> {
    /// Writes the pending header and flushes, then gives the stream up
    /// whatever the outcome. Output still buffered after a failed flush is
    /// dropped rather than written again.
    fn finish(mut self) -> Result<(), CodecError> {
        let result = self.write_header().and_then(|_| self.sink.flush());
        drop(self.sink.discard());
        result
    }

    fn write_header(&mut self) -> Result<(), CodecError> {
        if let Some(header) = self.pending_header.take() {
            debug!("Writing header: {header:?}");
            self.sink.write_fields(&header)?;
        }
        Ok(())
    }
}

/// A CSV entry writer that implements the `ItemWriter` trait.
///
/// Every entry is converted to raw fields by the [`EntryConverter`], joined
/// with the dialect (quoting fields that need it) and appended to the
/// output followed by the configured [`Terminator`].
///
/// The output is buffered. It is flushed by `flush`, `close`, `into_inner`
/// and, on a best-effort basis, when the writer is dropped.
pub struct CsvEntryWriter<W: Write, E, C> {
    state: RefCell<Option<WriterState<W>>>,
    converter: C,
    _pd: PhantomData<fn(&E)>,
}

impl<W: Write, E, C: EntryConverter<E>> ItemWriter<E> for CsvEntryWriter<W, E, C> {
    fn write(&self, entry: &E) -> ItemWriterResult {
        let mut guard = self.state.borrow_mut();
        let state = guard.as_mut().ok_or_else(closed)?;

        let fields = self.converter.convert(entry)?;
        state.write_header()?;
        state.sink.write_fields(&fields)
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// Note that this also flushes the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        let mut guard = self.state.borrow_mut();
        guard.as_mut().ok_or_else(closed)?.sink.flush()
    }

    /// Flushes the pending output then releases the stream, even when the
    /// flush failed. Output left buffered by a failed flush is discarded,
    /// not retried. Closing twice is a no-op.
    fn close(&self) -> ItemWriterResult {
        let Some(state) = self.state.borrow_mut().take() else {
            return Ok(());
        };

        let result = state.finish();
        match &result {
            Ok(()) => debug!("CSV writer closed"),
            Err(error) => warn!("CSV writer closed with a failed flush: {error}"),
        }
        result
    }
}

impl<W: Write, E, C> CsvEntryWriter<W, E, C> {
    /// Flushes the buffer and returns the underlying stream.
    ///
    /// # Errors
    /// Returns a [`CodecError::Resource`] if the writer is already closed or
    /// the final flush fails.
    pub fn into_inner(mut self) -> Result<W, CodecError> {
        let mut state = self.state.get_mut().take().ok_or_else(closed)?;
        state.write_header()?;
        state.sink.into_inner()
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().is_none()
    }
}

impl<W: Write, E, C> Drop for CsvEntryWriter<W, E, C> {
    fn drop(&mut self) {
        if let Some(state) = self.state.get_mut().take() {
            if let Err(error) = state.finish() {
                warn!("CSV writer dropped without a successful flush: {error}");
            }
        }
    }
}

fn closed() -> CodecError {
    CodecError::Resource(io::Error::new(
        io::ErrorKind::NotConnected,
        "the writer is closed",
    ))
}

/// A builder for configuring CSV entry writing.
///
/// # Default Configuration
///
/// - Dialect: [`Dialect::default`]
/// - Terminator: [`Terminator::LF`]
/// - No header row
/// - Buffer capacity: 8 KiB
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// use csv_codec_rs::core::dialect::Dialect;
/// use csv_codec_rs::core::item::{EntryConverter, ItemWriter};
/// use csv_codec_rs::item::csv::csv_writer::CsvEntryWriterBuilder;
/// use csv_codec_rs::CodecError;
///
/// struct City {
///     name: &'static str,
///     population: u64,
/// }
///
/// struct CityConverter;
///
/// impl EntryConverter<City> for CityConverter {
///     fn convert(&self, city: &City) -> Result<Vec<String>, CodecError> {
///         Ok(vec![city.name.to_string(), city.population.to_string()])
///     }
///
///     fn header(&self) -> Option<Vec<String>> {
///         Some(vec!["city".to_string(), "popcount".to_string()])
///     }
/// }
///
/// # fn main() { example().unwrap(); }
/// fn example() -> Result<(), Box<dyn Error>> {
///     let wtr = CsvEntryWriterBuilder::new()
///         .dialect(Dialect::regional())
///         .has_headers(true)
///         .from_writer(vec![], CityConverter);
///
///     wtr.write(&City { name: "Boston", population: 4628910 })?;
///     wtr.write(&City { name: "Concord, MA", population: 42695 })?;
///
///     let data = String::from_utf8(wtr.into_inner()?)?;
///     assert_eq!(data, "\
/// city,popcount
/// Boston,4628910
/// \"Concord, MA\",42695
/// ");
///     Ok(())
/// }
/// ```
pub struct CsvEntryWriterBuilder {
    dialect: Dialect,
    terminator: Terminator,
    has_headers: bool,
    capacity: usize,
}

impl Default for CsvEntryWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvEntryWriterBuilder {
    pub fn new() -> CsvEntryWriterBuilder {
        CsvEntryWriterBuilder {
            dialect: Dialect::default(),
            terminator: Terminator::default(),
            has_headers: false,
            capacity: 8 * 1024,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> CsvEntryWriterBuilder {
        self.dialect = dialect;
        self
    }

    pub fn terminator(mut self, terminator: Terminator) -> CsvEntryWriterBuilder {
        self.terminator = terminator;
        self
    }

    /// Emits the converter's header row once, before the first entry. A
    /// writer closed without entries still writes it.
    pub fn has_headers(mut self, yes: bool) -> CsvEntryWriterBuilder {
        self.has_headers = yes;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> CsvEntryWriterBuilder {
        self.capacity = capacity;
        self
    }

    pub fn from_writer<W, E, C>(self, wtr: W, converter: C) -> CsvEntryWriter<W, E, C>
    where
        W: Write,
        C: EntryConverter<E>,
    {
        let pending_header = if self.has_headers {
            converter.header()
        } else {
            None
        };
        debug!("CSV writer opened with {:?}", self.dialect);

        CsvEntryWriter {
            state: RefCell::new(Some(WriterState {
                sink: LineSink::with_capacity(self.capacity, wtr, self.dialect, self.terminator),
                pending_header,
            })),
            converter,
            _pd: PhantomData,
        }
    }

    /// Creates (or truncates) the file at `path` and writes to it.
    ///
    /// # Errors
    /// Returns a [`CodecError::Resource`] if the file cannot be created.
    pub fn from_path<Q, E, C>(self, path: Q, converter: C) -> Result<CsvEntryWriter<File, E, C>, CodecError>
    where
        Q: AsRef<Path>,
        C: EntryConverter<E>,
    {
        let file = File::create(path)?;
        Ok(self.from_writer(file, converter))
    }
}
