use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong getting a program image into memory. Nothing
/// in here is ever raised while the machine is running.
#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("ROM not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("ROM could not be read: {0}")]
    Unreadable(#[from] io::Error),

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },
}
