//! # Endian Normalization
//!
//! All multi-byte integers on disk are little-endian. Codecs emit and consume
//! native byte order; the functions here bridge the two by reversing each
//! `elem_size`-wide group on big-endian targets and doing nothing on
//! little-endian ones. The transform is its own inverse, so the same
//! functions serve both the write and the read pipeline.
//!
//! Fixed codecs normalize their whole payload as one group (a 16-byte UUID is
//! one 16-byte integer for this purpose); flexible codecs normalize per
//! element (a UTF-16 payload is a run of 2-byte groups).

use std::borrow::Cow;

/// Reverses every `elem_size`-wide group of `buf`. The length of `buf` must
/// be a multiple of `elem_size`.
fn swap_elements(buf: &mut [u8], elem_size: usize) {
    debug_assert!(elem_size > 0);
    debug_assert_eq!(buf.len() % elem_size, 0);
    if elem_size <= 1 {
        return;
    }
    for chunk in buf.chunks_exact_mut(elem_size) {
        chunk.reverse();
    }
}

/// Normalizes a native-order buffer to little-endian in place.
pub fn to_disk(buf: &mut [u8], elem_size: usize) {
    #[cfg(target_endian = "big")]
    swap_elements(buf, elem_size);
    #[cfg(not(target_endian = "big"))]
    {
        let _ = (buf, elem_size);
    }
}

/// Normalizes a little-endian payload slice to native order, borrowing when
/// no transform is required.
pub fn from_disk(bytes: &[u8], elem_size: usize) -> Cow<'_, [u8]> {
    #[cfg(target_endian = "big")]
    {
        let mut owned = bytes.to_vec();
        swap_elements(&mut owned, elem_size);
        Cow::Owned(owned)
    }
    #[cfg(not(target_endian = "big"))]
    {
        let _ = elem_size;
        Cow::Borrowed(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_reverses_each_group() {
        let mut buf = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_elements(&mut buf, 4);
        assert_eq!(buf, [4, 3, 2, 1, 8, 7, 6, 5]);
    }

    #[test]
    fn swap_is_involutive() {
        let original = [9u8, 8, 7, 6, 5, 4];
        let mut buf = original;
        swap_elements(&mut buf, 2);
        swap_elements(&mut buf, 2);
        assert_eq!(buf, original);
    }

    #[test]
    fn single_byte_groups_are_untouched() {
        let mut buf = [1u8, 2, 3];
        swap_elements(&mut buf, 1);
        assert_eq!(buf, [1, 2, 3]);
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn little_endian_targets_pass_through() {
        let mut buf = [1u8, 2, 3, 4];
        to_disk(&mut buf, 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(matches!(from_disk(&buf, 4), Cow::Borrowed(_)));
    }
}
