//! Buffer helpers

use crate::error::{Error, Result};
use alloc::vec::Vec;

/// Allocate a zeroed buffer, reporting exhaustion instead of aborting
pub fn try_alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf)
}
