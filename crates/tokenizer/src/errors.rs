use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("input contains no words after normalisation")]
    EmptyInput,

    #[error("word {0:?} is not part of the vocabulary")]
    UnknownWord(String),

    #[error("token id {id} is out of range for a vocabulary of {len} words")]
    UnknownId { id: u32, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
