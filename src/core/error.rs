use std::fmt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    InvalidArgument,
    Internal,
    QuerySyntax,
    EmptyIndex,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    /// Malformed query expression; echoes both the fragment and the full input
    pub fn query_syntax(message: &str, fragment: &str, input: &str) -> Self {
        Error {
            kind: ErrorKind::QuerySyntax,
            context: format!("{} at '{}' in query '{}'", message, fragment, input),
        }
    }

    pub fn empty_index() -> Self {
        Error {
            kind: ErrorKind::EmptyIndex,
            context: "no index has been built yet; build one before running queries".to_string(),
        }
    }

    pub fn is_query_syntax(&self) -> bool {
        self.kind == ErrorKind::QuerySyntax
    }

    pub fn is_empty_index(&self) -> bool {
        self.kind == ErrorKind::EmptyIndex
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A document skipped during a build. Never aborts the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisWarning {
    pub ordinal: usize,        // Position of the document in the input sequence
    pub field: Option<String>,
    pub reason: String,
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "document #{} field '{}': {}", self.ordinal, field, self.reason),
            None => write!(f, "document #{}: {}", self.ordinal, self.reason),
        }
    }
}
