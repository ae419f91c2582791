use thiserror::Error;

use crate::addr::Addr;

pub type Result<T> = std::result::Result<T, R2Error>;

#[derive(Error, Debug)]
pub enum R2Error {
    #[error("pipe i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not locate the radare2 binary: {0}")]
    ToolNotFound(#[from] which::Error),
    #[error("the radare2 process closed its pipe")]
    PipeClosed,
    #[error("command must not contain a line break: {0:?}")]
    BadCommand(String),
    #[error("response to {cmd:?} is not valid JSON: {source}")]
    MalformedResponse {
        cmd: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected response shape: expected {expected}, got {got}")]
    UnexpectedShape {
        expected: &'static str,
        got: &'static str,
    },
    #[error("invalid register: {0}")]
    InvalidRegister(String),
    #[error("no function at {0}")]
    NoSuchFunction(Addr),
    #[error("response is not a hex byte string: {0:?}")]
    BadHex(String),
    #[error("not an address: {0:?}")]
    BadAddress(String),
    #[error("range end {end} lies before start {start}")]
    BadRange { start: Addr, end: Addr },
}
