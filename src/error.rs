use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems getting a program image into memory. Execution never starts
/// after one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't read program image: {0}")]
    Io(#[from] io::Error),

    #[error("program image is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("couldn't find program image {name:?} (searched {searched:?})")]
    NotFound { name: PathBuf, searched: Vec<PathBuf> },
}

/// Fatal conditions raised while executing a program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("stack overflow: call at {pc:#05X} with all 15 stack levels in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of range: {len} byte(s) at {addr:#06X}")]
    AddressOutOfRange { addr: usize, len: usize },
}

/// Everything that can stop the host loop.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}
