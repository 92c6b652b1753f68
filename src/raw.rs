//! Physical-line framing and field tokenization.
//!
//! The engines operate on *raw rows*: vectors of string fields. This
//! module turns an input stream into raw rows one physical line at a
//! time and raw rows back into lines, delegating field splitting and
//! joining to the `csv` crate. A blank line maps to a zero-field row
//! in both directions; that is what makes the table-separator
//! convention visible to the engines, since a whole-stream csv reader
//! would swallow blank records.

use crate::error::Result;
use std::io::{BufRead, BufReader, Lines, Read, Write};

/// Formatting knobs handed through to the csv tokenizer.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    /// Field delimiter (default `,`)
    pub delimiter: u8,

    /// Quote character (default `"`)
    pub quote: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Reads one raw row per physical line.
pub struct RawReader<R: Read> {
    lines: Lines<BufReader<R>>,
    dialect: Dialect,
}

impl<R: Read> RawReader<R> {
    pub fn new(reader: R, dialect: Dialect) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            dialect,
        }
    }

    /// Next raw row, `None` at end of input. A blank line yields an
    /// empty vector.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        let line = match self.lines.next() {
            Some(line) => line?,
            None => return Ok(None),
        };
        // lines() strips '\n' but keeps a '\r' from CRLF input
        let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
        if line.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.dialect.delimiter)
            .quote(self.dialect.quote)
            .from_reader(line.as_bytes());
        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Ok(Some(Vec::new()));
        }
        Ok(Some(record.iter().map(str::to_string).collect()))
    }
}

/// Writes one physical line per raw row.
pub struct RawWriter<W: Write> {
    out: W,
    dialect: Dialect,
}

impl<W: Write> RawWriter<W> {
    pub fn new(out: W, dialect: Dialect) -> Self {
        Self { out, dialect }
    }

    /// Write one raw row as a line. An empty row becomes a bare
    /// newline, the table-separator form.
    pub fn write_row(&mut self, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            self.out.write_all(b"\n")?;
            return Ok(());
        }
        let mut line = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.dialect.delimiter)
                .quote(self.dialect.quote)
                .from_writer(&mut line);
            writer.write_record(fields)?;
            writer.flush()?;
        }
        self.out.write_all(&line)?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
