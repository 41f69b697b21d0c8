use std::io::{self, BufRead, BufWriter, Write};

use log::debug;

use crate::{
    core::{
        dialect::Dialect,
        tokenizer::{Tokenizer, join},
    },
    error::CodecError,
};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Yields logical record lines from a buffered character stream.
///
/// Skips the header line once when the dialect says so (keeping it for
/// later inspection), comment lines always and blank lines when the dialect
/// ignores them. A record whose quoted field spans several physical lines is
/// reassembled into one logical line, keeping the embedded line breaks.
pub struct LineSource<R> {
    reader: R,
    dialect: Dialect,
    tokenizer: Tokenizer,
    header_pending: bool,
    header: Option<String>,
    physical_lines: usize,
    record_line: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, dialect: Dialect) -> Self {
        Self {
            reader,
            tokenizer: Tokenizer::new(&dialect),
            header_pending: dialect.skip_header(),
            dialect,
            header: None,
            physical_lines: 0,
            record_line: 0,
        }
    }

    /// Next logical record line without its terminator, `None` once the
    /// stream is exhausted.
    ///
    /// A stream ending inside a quoted field yields the incomplete record;
    /// splitting it reports the unterminated quote.
    pub fn next_record_line(&mut self) -> Result<Option<String>, CodecError> {
        loop {
            let Some(mut record) = self.read_physical()? else {
                return Ok(None);
            };
            let start = self.physical_lines;

            if !self.header_pending && self.dialect.is_comment(&record) {
                continue;
            }

            while !self.tokenizer.is_balanced(&record) {
                match self.read_physical()? {
                    Some(next) => record.push_str(&next),
                    None => break,
                }
            }
            strip_terminator(&mut record);

            if self.header_pending {
                self.header_pending = false;
                debug!("Header skipped: {record}");
                self.header = Some(record);
                continue;
            }

            if self.dialect.ignore_empty_lines() && record.trim().is_empty() {
                continue;
            }

            self.record_line = start;
            return Ok(Some(record));
        }
    }

    /// The skipped header line, once it has been read.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// 1-based physical line on which the last returned record started.
    pub fn record_line(&self) -> usize {
        self.record_line
    }

    fn read_physical(&mut self) -> Result<Option<String>, CodecError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).map_err(|error| {
            if error.kind() == io::ErrorKind::InvalidData {
                CodecError::Format(format!(
                    "line {}: stream is not valid UTF-8",
                    self.physical_lines + 1
                ))
            } else {
                CodecError::Resource(error)
            }
        })?;

        if read == 0 {
            return Ok(None);
        }

        if self.physical_lines == 0 && line.starts_with(BYTE_ORDER_MARK) {
            line.remove(0);
        }
        self.physical_lines += 1;
        Ok(Some(line))
    }
}

fn strip_terminator(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

/// Record terminator appended after each written line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    /// Unix-style `\n`
    #[default]
    LF,
    /// Windows-style `\r\n`
    CRLF,
}

impl Terminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminator::LF => "\n",
            Terminator::CRLF => "\r\n",
        }
    }
}

/// Appends joined, terminated lines to a buffered output stream.
pub struct LineSink<W: Write> {
    writer: BufWriter<W>,
    dialect: Dialect,
    terminator: Terminator,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, dialect: Dialect, terminator: Terminator) -> Self {
        Self {
            writer: BufWriter::new(writer),
            dialect,
            terminator,
        }
    }

    pub fn with_capacity(capacity: usize, writer: W, dialect: Dialect, terminator: Terminator) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, writer),
            dialect,
            terminator,
        }
    }

    /// Joins `fields` with the dialect and appends the line and its
    /// terminator.
    pub fn write_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), CodecError> {
        let line = join(fields, &self.dialect);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(self.terminator.as_str().as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the buffer and returns the underlying stream.
    pub fn into_inner(self) -> Result<W, CodecError> {
        self.writer
            .into_inner()
            .map_err(|error| CodecError::Resource(error.into_error()))
    }

    /// Returns the underlying stream, dropping whatever is still buffered.
    pub fn discard(self) -> W {
        let (writer, _buffered) = self.writer.into_parts();
        writer
    }
}
