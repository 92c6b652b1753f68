//! Column headers and the header-cell grammar.
//!
//! A header cell reads `NAME[:TYPE][=CONVERT_SPEC]`. The first `=`
//! starts the convert spec, which runs to the end of the cell (so
//! spec arguments may contain `:`, as strptime formats do); the first
//! `:` before that starts the type name. The name keeps its
//! whitespace verbatim; the type token and the convert spec are
//! trimmed.

use crate::error::{Error, Result};
use crate::funcs::{FuncHandle, FuncRegistry};

/// The type applied when a header cell carries no `:TYPE` token.
pub const DEFAULT_TYPE: &str = "str";

/// Reference to a type-cast function.
#[derive(Debug, Clone)]
pub enum TypeFunc {
    /// A bare function name, written verbatim. Used when building
    /// headers for writing.
    Named(String),

    /// A function resolved against a registry when the header was
    /// parsed. Stays bound to that function even if the registry
    /// changes afterwards.
    Resolved(FuncHandle),
}

impl TypeFunc {
    /// The function name this reference stands for.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Resolved(handle) => handle.name(),
        }
    }
}

/// One column of a table: its name, optional type-cast function and
/// optional convert spec.
///
/// Headers come out of [`Header::parse`] when reading, or are built
/// directly when writing:
///
/// ```
/// use tcsv_core::Header;
///
/// let header = Header::typed("age", "int").with_convert("default|0");
/// assert_eq!(header.type_name(), Some("int"));
/// ```
#[derive(Debug, Clone)]
pub struct Header {
    name: String,
    type_func: Option<TypeFunc>,
    convert_func_args: Option<String>,
}

impl Header {
    /// Header with no type cast at all.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_func: None,
            convert_func_args: None,
        }
    }

    /// Header whose values are cast with the named function.
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_func: Some(TypeFunc::Named(type_name.into())),
            convert_func_args: None,
        }
    }

    /// Attach a convert spec (`FUNC|ARG|...`). An empty spec means no
    /// conversion.
    pub fn with_convert(mut self, spec: impl Into<String>) -> Self {
        let spec = spec.into();
        self.convert_func_args = if spec.is_empty() { None } else { Some(spec) };
        self
    }

    /// Parse one raw header cell against `registry`.
    ///
    /// The name is taken verbatim; the type token and the convert
    /// spec are trimmed. An absent type defaults to [`DEFAULT_TYPE`];
    /// a type that is empty after trimming (`name:`) disables casting
    /// for the column.
    pub fn parse(field: &str, registry: &FuncRegistry) -> Result<Self> {
        let (head, spec) = match field.find('=') {
            Some(at) => (&field[..at], Some(field[at + 1..].trim())),
            None => (field, None),
        };
        let (name, type_token) = match head.find(':') {
            Some(at) => (&head[..at], Some(head[at + 1..].trim())),
            None => (head, None),
        };
        if name.is_empty() {
            return Err(Error::InvalidHeader(field.to_string()));
        }
        let type_func = match type_token {
            Some("") => None,
            Some(type_name) => Some(resolve_type(type_name, registry)?),
            None => Some(resolve_type(DEFAULT_TYPE, registry)?),
        };
        let convert_func_args = match spec {
            Some("") | None => None,
            Some(spec) => Some(spec.to_string()),
        };
        Ok(Self {
            name: name.to_string(),
            type_func,
            convert_func_args,
        })
    }

    /// Render this header as a raw header cell. A resolved type
    /// function is reverse-mapped through `registry` and must still be
    /// its current entry.
    pub fn to_field(&self, registry: &FuncRegistry) -> Result<String> {
        let mut field = self.name.clone();
        match &self.type_func {
            None => {}
            Some(TypeFunc::Named(name)) => {
                field.push(':');
                field.push_str(name);
            }
            Some(TypeFunc::Resolved(handle)) => {
                if !registry.is_current(handle) {
                    return Err(Error::TypeFuncNotRegistered(handle.name().to_string()));
                }
                field.push(':');
                field.push_str(handle.name());
            }
        }
        if let Some(spec) = &self.convert_func_args {
            field.push('=');
            field.push_str(spec);
        }
        Ok(field)
    }

    /// Column name, the key of this column in row mappings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type-cast function reference, if any.
    pub fn type_func(&self) -> Option<&TypeFunc> {
        self.type_func.as_ref()
    }

    /// Name of the type-cast function, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_func.as_ref().map(TypeFunc::name)
    }

    /// The raw convert spec, if any.
    pub fn convert_spec(&self) -> Option<&str> {
        self.convert_func_args.as_deref()
    }
}

fn resolve_type(type_name: &str, registry: &FuncRegistry) -> Result<TypeFunc> {
    registry
        .resolve(type_name)
        .map(TypeFunc::Resolved)
        .ok_or_else(|| Error::UnknownType(type_name.to_string()))
}
