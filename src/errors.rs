use std::{fmt, io};
use quick_xml::events::attributes::AttrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required attribute missing or not numeric.
    MalformedInput,
    /// A node tag clashes with a fixed point column and the policy rejects it.
    TagCollision,
    /// Input unreadable, not XML, or output not writable.
    Resource,
    Config,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::MalformedInput,
            message: message.into(),
        }
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Resource,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Config,
            message: message.into(),
        }
    }

    pub fn tag_collision(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::TagCollision,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::resource(value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::resource(value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::resource(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::resource(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::resource(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
