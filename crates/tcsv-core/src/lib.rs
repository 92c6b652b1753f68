//! Core model for the typed-header CSV format.
//!
//! This crate holds everything the reading and writing engines share:
//!
//! - [`Value`] and [`Row`]: typed cells and ordered row mappings
//! - [`Header`]: one column's name, type cast and convert spec, plus
//!   the `NAME[:TYPE][=CONVERT_SPEC]` cell grammar
//! - [`FuncRegistry`]: named conversion functions, built-in and
//!   user-registered
//! - [`Error`] and [`CastError`]: the codec error kinds
//!
//! The engines themselves (tokenization, table-boundary detection,
//! row emission) live in the `tcsv` crate.

pub mod error;
pub mod funcs;
pub mod header;
pub mod values;

pub use error::{CastError, Error, Result};
pub use funcs::{split_spec, ConvertFn, FuncHandle, FuncRegistry};
pub use header::{Header, TypeFunc, DEFAULT_TYPE};
pub use values::{Row, Value};
