use alloc::vec::Vec;

use crate::PackStreamError;

#[inline]
pub fn try_reserve<T>(
    v: &mut Vec<T>,
    additional: usize,
    offset: usize,
) -> Result<(), PackStreamError> {
    let needed = v
        .len()
        .checked_add(additional)
        .ok_or_else(|| PackStreamError::alloc_failed(offset))?;
    if needed <= v.capacity() {
        return Ok(());
    }
    v.try_reserve(additional)
        .map_err(|_| PackStreamError::alloc_failed(offset))
}

/// Allocate room for a decoded container of `declared` items.
///
/// Every encoded item takes at least one byte, so a buffer with `remaining` bytes left cannot
/// hold more than `remaining` items; capping the reservation keeps forged lengths from
/// allocating more than the input size.
#[inline]
pub fn vec_for_declared<T>(declared: usize, remaining: usize) -> Vec<T> {
    Vec::with_capacity(declared.min(remaining))
}
