//! Reading and writing for CSV files with typed column headers.
//!
//! The format is ordinary character-delimited text with two twists:
//!
//! - each header cell may carry a type cast and a convert pipeline:
//!   `NAME[:TYPE][=FUNC|ARG|...]`
//! - a blank line ends the current table; the next non-blank line is
//!   the header row of a new table
//!
//! Reading yields [`Row`]s of typed [`Value`]s; writing turns
//! [`Header`]s and rows back into text.
//!
//! ```
//! use tcsv::Reader;
//!
//! let data = "name:str,age:int\nJohn,24\n";
//! let mut reader = Reader::from_reader(data.as_bytes());
//! while let Some(row) = reader.read_row()? {
//!     assert_eq!(row.get("age").and_then(|v| v.as_i64()), Some(24));
//! }
//! # Ok::<(), tcsv::Error>(())
//! ```

pub mod error;
pub mod raw;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use raw::Dialect;
pub use reader::{Reader, ReaderBuilder, Rows};
pub use writer::{Writer, WriterBuilder};

pub use tcsv_core::{CastError, Error as CodecError, FuncRegistry, Header, Row, TypeFunc, Value};
