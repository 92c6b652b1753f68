//! Writing engine: header stringification and row emission.

use crate::error::{Error, Result};
use crate::raw::{Dialect, RawWriter};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tcsv_core::{CastError, FuncHandle, FuncRegistry, Header, Row, Value};
use tracing::debug;

/// Builds a [`Writer`] with non-default settings.
#[derive(Debug, Clone)]
pub struct WriterBuilder {
    dialect: Dialect,
    ignore_value_errors: bool,
}

impl WriterBuilder {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            // writing is best-effort by default: a failing stringify
            // func falls back to the generic conversion
            ignore_value_errors: true,
        }
    }

    /// Field delimiter, `,` unless set.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.dialect.delimiter = delimiter;
        self
    }

    /// Quote character, `"` unless set.
    pub fn quote(mut self, quote: u8) -> Self {
        self.dialect.quote = quote;
        self
    }

    /// Whether a failing stringify function keeps the cell's value
    /// instead of failing the row. On by default.
    pub fn ignore_value_errors(mut self, yes: bool) -> Self {
        self.ignore_value_errors = yes;
        self
    }

    /// Build a writer over an output sink.
    pub fn from_writer<W: Write>(&self, writer: W) -> Writer<W> {
        Writer {
            raw: RawWriter::new(writer, self.dialect),
            funcs: FuncRegistry::writer_builtins(),
            header_names: Vec::new(),
            ignore_value_errors: self.ignore_value_errors,
        }
    }

    /// Build a writer creating a file.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(self.from_writer(File::create(path)?))
    }
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming writer for typed-CSV data.
///
/// Emits header rows from [`Header`] lists, content rows from
/// [`Row`]s and blank separator rows between tables.
pub struct Writer<W: Write> {
    raw: RawWriter<W>,
    funcs: FuncRegistry,
    header_names: Vec<String>,
    ignore_value_errors: bool,
}

impl Writer<File> {
    /// Create a file with default settings.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: Write> Writer<W> {
    /// Wrap an output sink with default settings.
    pub fn from_writer(writer: W) -> Self {
        WriterBuilder::new().from_writer(writer)
    }

    /// Register `func` for stringify-spec lookups under `name`,
    /// replacing any existing entry.
    pub fn add_func<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Value, &[String]) -> std::result::Result<Value, CastError> + Send + Sync + 'static,
    {
        self.funcs.add_func(name, func);
    }

    /// The writer's function registry. Parsing a header cell against
    /// it yields headers whose resolved type this writer accepts.
    pub fn funcs(&self) -> &FuncRegistry {
        &self.funcs
    }

    /// Column names declared by the last header row, in order.
    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    /// Write a header row and make `headers` the active table columns.
    /// The swap is atomic: a stringification failure leaves the
    /// previous table in place and writes nothing.
    pub fn write_header(&mut self, headers: &[Header]) -> Result<()> {
        let mut fields = Vec::with_capacity(headers.len());
        for header in headers {
            fields.push(header.to_field(&self.funcs)?);
        }
        self.header_names = headers.iter().map(|h| h.name().to_string()).collect();
        debug!("writing header {:?}", self.header_names);
        self.raw.write_row(&fields)
    }

    /// Write one content row with the generic stringification only.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        self.write_row_with(row, &HashMap::new())
    }

    /// Write one content row. `specs` maps column names to stringify
    /// specs (`FUNC|ARG|...`) applied before emission; other cells use
    /// the generic conversion. Cells are written in the row's own
    /// insertion order, whatever the active header order is.
    pub fn write_row_with(&mut self, row: &Row, specs: &HashMap<String, String>) -> Result<()> {
        let mut fields = Vec::with_capacity(row.len());
        for (name, value) in row.iter() {
            let value = match specs.get(name) {
                Some(spec) => {
                    let (func_name, args) = tcsv_core::split_spec(spec);
                    let handle = self
                        .funcs
                        .resolve(func_name)
                        .ok_or_else(|| tcsv_core::Error::UnknownConvert(func_name.to_string()))?;
                    self.invoke(name, &handle, value.clone(), &args)?
                }
                None => value.clone(),
            };
            fields.push(value.to_string());
        }
        self.raw.write_row(&fields)
    }

    /// Write every row with the generic stringification.
    pub fn write_rows<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        self.write_rows_with(rows, &HashMap::new())
    }

    /// Write every row, reusing `specs` for each one.
    pub fn write_rows_with<'a, I>(&mut self, rows: I, specs: &HashMap<String, String>) -> Result<()>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        for row in rows {
            self.write_row_with(row, specs)?;
        }
        Ok(())
    }

    /// Write a blank separator row, ending the current table.
    pub fn write_empty_row(&mut self) -> Result<()> {
        self.raw.write_row(&[])
    }

    /// Flush the underlying sink. Closing it stays the caller's job.
    pub fn flush(&mut self) -> Result<()> {
        self.raw.flush()
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.raw.into_inner()
    }

    /// Single policy point for value errors: under
    /// `ignore_value_errors` the failing call's input is kept,
    /// otherwise the error propagates with the column name attached.
    fn invoke(
        &self,
        column: &str,
        handle: &FuncHandle,
        value: Value,
        args: &[String],
    ) -> Result<Value> {
        match handle.call(value.clone(), args) {
            Ok(converted) => Ok(converted),
            Err(err) if self.ignore_value_errors => {
                debug!("column '{column}': ignoring {err}");
                Ok(value)
            }
            Err(err) => Err(Error::Codec(tcsv_core::Error::Cast {
                column: column.to_string(),
                source: err,
            })),
        }
    }
}
