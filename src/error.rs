use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read of {width} bytes at offset {offset} overruns input of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("Ran out of ASCII tokens")]
    TokensExhausted,

    #[error("Invalid numeric token: {0:?}")]
    InvalidNumber(String),

    #[error("Decode worker stopped before reporting a result")]
    WorkerGone,

    #[error("Decode failed: {0}")]
    Failed(String),
}
