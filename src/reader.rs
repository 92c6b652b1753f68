//! Reading engine: multi-table iteration and per-cell typing.

use crate::error::{Error, Result};
use crate::raw::{Dialect, RawReader};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tcsv_core::{CastError, FuncHandle, FuncRegistry, Header, Row, TypeFunc, Value};
use tracing::debug;

/// Where the reader stands between raw rows.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReadState {
    /// The next non-blank row is a header row.
    AwaitingHeader,

    /// The next non-blank row is a content row.
    InTable,
}

/// Builds a [`Reader`] with non-default settings.
#[derive(Debug, Clone)]
pub struct ReaderBuilder {
    dialect: Dialect,
    ignore_value_errors: bool,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            ignore_value_errors: false,
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

    /// Keep a cell's value instead of failing the row when a
    /// conversion rejects it. Off by default.
    pub fn ignore_value_errors(mut self, yes: bool) -> Self {
        self.ignore_value_errors = yes;
        self
    }

    /// Build a reader over an input stream.
    pub fn from_reader<R: Read>(&self, reader: R) -> Reader<R> {
        Reader {
            raw: RawReader::new(reader, self.dialect),
            funcs: FuncRegistry::reader_builtins(),
            state: ReadState::AwaitingHeader,
            headers: Vec::new(),
            header_names: Vec::new(),
            table_index: None,
            ignore_value_errors: self.ignore_value_errors,
        }
    }

    /// Build a reader over a file.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(self.from_reader(File::open(path)?))
    }
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming reader for typed-CSV data.
///
/// Yields one [`Row`] per content row, detecting blank-line table
/// boundaries and applying each column's convert and type-cast
/// functions on the way.
pub struct Reader<R: Read> {
    raw: RawReader<R>,
    funcs: FuncRegistry,
    state: ReadState,
    headers: Vec<Header>,
    header_names: Vec<String>,
    table_index: Option<usize>,
    ignore_value_errors: bool,
}

impl Reader<File> {
    /// Open a file with default settings.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: Read> Reader<R> {
    /// Wrap an input stream with default settings.
    pub fn from_reader(reader: R) -> Self {
        ReaderBuilder::new().from_reader(reader)
    }

    /// Register `func` for `:TYPE` and convert-spec lookups under
    /// `name`, replacing any existing entry. Headers parsed from this
    /// point on see the new entry; already-installed headers keep the
    /// functions they resolved.
    pub fn add_func<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Value, &[String]) -> std::result::Result<Value, CastError> + Send + Sync + 'static,
    {
        self.funcs.add_func(name, func);
    }

    /// The reader's function registry.
    pub fn funcs(&self) -> &FuncRegistry {
        &self.funcs
    }

    /// Ordered column names of the current table; empty before the
    /// first header row.
    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    /// Zero-based index of the current table; `None` before the first
    /// header row.
    pub fn table_index(&self) -> Option<usize> {
        self.table_index
    }

    /// Fetch the next content row, consuming blank separators and
    /// header rows on the way. `Ok(None)` means end of input.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        loop {
            let fields = match self.raw.read_row()? {
                Some(fields) => fields,
                None => return Ok(None),
            };
            if fields.is_empty() {
                self.state = ReadState::AwaitingHeader;
                continue;
            }
            match self.state {
                ReadState::AwaitingHeader => self.install_headers(&fields)?,
                ReadState::InTable => return Ok(Some(self.typed_row(fields)?)),
            }
        }
    }

    /// Iterator over all remaining content rows.
    pub fn rows(&mut self) -> Rows<'_, R> {
        Rows { reader: self }
    }

    /// Parse a header row and make it the current table. The swap is
    /// atomic: a parse failure leaves the previous table installed.
    fn install_headers(&mut self, fields: &[String]) -> Result<()> {
        let mut headers = Vec::with_capacity(fields.len());
        for field in fields {
            headers.push(Header::parse(field, &self.funcs)?);
        }
        self.header_names = headers.iter().map(|h| h.name().to_string()).collect();
        self.headers = headers;
        self.table_index = Some(self.table_index.map_or(0, |i| i + 1));
        self.state = ReadState::InTable;
        debug!(
            "table {}: installed header {:?}",
            self.table_index.unwrap_or(0),
            self.header_names
        );
        Ok(())
    }

    /// Convert one raw content row. Pairing is positional and stops at
    /// the shorter of header list and field list.
    fn typed_row(&self, fields: Vec<String>) -> Result<Row> {
        let mut row = Row::new();
        for (header, field) in self.headers.iter().zip(fields) {
            let value = self.process_value(header, Value::Str(field))?;
            row.insert(header.name(), value);
        }
        Ok(row)
    }

    /// Run one cell through its column's convert spec, then its type
    /// cast.
    fn process_value(&self, header: &Header, mut value: Value) -> Result<Value> {
        if let Some(spec) = header.convert_spec() {
            let (func_name, args) = tcsv_core::split_spec(spec);
            let handle = self
                .funcs
                .resolve(func_name)
                .ok_or_else(|| tcsv_core::Error::UnknownConvert(func_name.to_string()))?;
            value = self.invoke(header.name(), &handle, value, &args)?;
        }
        if let Some(type_func) = header.type_func() {
            let handle = match type_func {
                TypeFunc::Resolved(handle) => handle.clone(),
                TypeFunc::Named(name) => self
                    .funcs
                    .resolve(name)
                    .ok_or_else(|| tcsv_core::Error::UnknownType(name.to_string()))?,
            };
            value = self.invoke(header.name(), &handle, value, &[])?;
        }
        Ok(value)
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

/// Iterator over content rows. Created by [`Reader::rows`].
pub struct Rows<'r, R: Read> {
    reader: &'r mut Reader<R>,
}

impl<R: Read> Iterator for Rows<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_starts_awaiting_header() {
        let reader = Reader::from_reader("".as_bytes());
        assert_eq!(reader.state, ReadState::AwaitingHeader);
        assert_eq!(reader.table_index(), None);
        assert!(reader.header_names().is_empty());
    }

    #[test]
    fn test_blank_rows_reset_state() {
        let data = "a:int\n1\n\n\n\nb\nx\n";
        let mut reader = Reader::from_reader(data.as_bytes());
        assert!(reader.read_row().unwrap().is_some());
        assert_eq!(reader.state, ReadState::InTable);
        let row = reader.read_row().unwrap().unwrap();
        assert_eq!(row.get("b"), Some(&Value::Str("x".to_string())));
        assert_eq!(reader.table_index(), Some(1));
    }

    #[test]
    fn test_failed_header_keeps_previous_table() {
        let data = "a:int\n1\n\n:bad\nb\nx\n";
        let mut reader = Reader::from_reader(data.as_bytes());
        assert!(reader.read_row().unwrap().is_some());
        assert!(reader.read_row().is_err());
        // the failed install left table 0 in place
        assert_eq!(reader.header_names(), ["a"]);
        assert_eq!(reader.table_index(), Some(0));
        // the bad row was consumed; the next non-blank row opens a table
        let row = reader.read_row().unwrap().unwrap();
        assert_eq!(row.get("b"), Some(&Value::Str("x".to_string())));
        assert_eq!(reader.header_names(), ["b"]);
        assert_eq!(reader.table_index(), Some(1));
    }
}
