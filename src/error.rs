use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Why a command failed; each maps to a non-zero exit.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not set up {_0}")]
    Setup(#[error(not(source))] &'static str),
    #[display("couldn't communicate with {_0}")]
    Communication(#[error(not(source))] &'static str),
    #[display("cancelled")]
    Cancelled,
}
