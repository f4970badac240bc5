use crate::library::LibraryError;
use crate::locale::LocalizationError;
use dotmark_parser::ParseError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors raised while expanding a document. Every variant belongs to one [ErrorKind].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unresolved reference: no function named '{0}'")]
    UnresolvedReference(String),
    #[error("ambiguous reference: '{name}' is defined in {}; qualify it as 'library/{name}'", .libraries.join(", "))]
    AmbiguousReference { name: String, libraries: Vec<String> },
    #[error("invalid call to '{function}': {reason}")]
    InvalidCall { function: String, reason: String },
    #[error("{0}")]
    Runtime(String),
    #[error("{what} limit of {limit} exceeded")]
    RecursionLimit { what: &'static str, limit: usize },
    #[error("cannot convert '{value}' to {target}")]
    Conversion { value: String, target: String },
    #[error("no such element: {0}")]
    NoSuchElement(String),
    #[error(transparent)]
    Localization(#[from] LocalizationError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("i/o error: {0}")]
    Io(String),
}

impl Error {
    pub fn invalid_call(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidCall {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(ParseError::Lexical { .. }) => ErrorKind::Lexical,
            Error::Parse(ParseError::Syntax { .. }) => ErrorKind::Syntax,
            Error::UnresolvedReference(_) | Error::AmbiguousReference { .. } => {
                ErrorKind::UnresolvedReference
            }
            Error::InvalidCall { .. } => ErrorKind::InvalidCall,
            Error::Runtime(_) | Error::RecursionLimit { .. } | Error::Library(_) => {
                ErrorKind::Runtime
            }
            Error::Conversion { .. } => ErrorKind::Conversion,
            Error::NoSuchElement(_) => ErrorKind::NoSuchElement,
            Error::Localization(_) => ErrorKind::Localization,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether no error handler may recover from this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Lexical | ErrorKind::Syntax)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    UnresolvedReference,
    InvalidCall,
    Runtime,
    Conversion,
    NoSuchElement,
    Localization,
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::UnresolvedReference => "unresolved reference",
            ErrorKind::InvalidCall => "invalid call",
            ErrorKind::Runtime => "runtime error",
            ErrorKind::Conversion => "conversion error",
            ErrorKind::NoSuchElement => "no such element",
            ErrorKind::Localization => "localization error",
            ErrorKind::Io => "i/o error",
        };
        write!(f, "{}", name)
    }
}
