use crate::error::RomLoadError;
use crate::memory::CHIP8_MAX_PROGRAM_BYTES;
use log::info;
use std::fs;
use std::io;
use std::path::Path;

/// Read a raw program image from disk. Images that could never fit in
/// program memory are rejected here, before the machine sees them.
pub fn read_rom(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RomLoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => RomLoadError::Unreadable(e),
    })?;
    if bytes.len() > CHIP8_MAX_PROGRAM_BYTES {
        return Err(RomLoadError::TooLarge {
            size: bytes.len(),
            max: CHIP8_MAX_PROGRAM_BYTES,
        });
    }
    info!("read {} byte ROM from {}", bytes.len(), path.display());
    Ok(bytes)
}
