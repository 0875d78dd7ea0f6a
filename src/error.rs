use std::fmt;

use failure::Backtrace;
use failure::Context;
use failure::Fail;

/// Error information returned by this crate's fallible operations.
#[derive(Debug)]
pub struct Error(Context<ErrorKind>);

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.0.get_context().clone()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Error {
        Error(inner)
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.0.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.0.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Exhaustive list of possible errors emitted by this crate.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "{} failed due to coordination service error", _0)]
    Backend(&'static str),

    #[fail(display = "connection to coordination service '{}' failed", _0)]
    BackendConnect(String),

    #[fail(display = "failed to decode {}", _0)]
    Decode(&'static str),

    #[fail(display = "failed to serialize HA descriptor")]
    DescriptorEncode,

    #[fail(display = "malformed HA descriptor document (line {}, column {})", _0, _1)]
    DescriptorParse(usize, usize),

    #[fail(display = "invalid value '{}' for descriptor attribute '{}'", _1, _0)]
    InvalidAttribute(String, String),

    #[fail(display = "invalid value '{}' for HA parameter '{}'", _1, _0)]
    InvalidParam(String, String),

    #[fail(display = "descriptor attribute '{}' is required", _0)]
    MissingAttribute(&'static str),
}

/// Short form alias for functions returning `Error`s.
pub type Result<T> = ::std::result::Result<T, Error>;
