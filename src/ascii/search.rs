//! Byte-search primitives over small separator sets.

use memchr::{memchr, memchr2, memchr3, memmem};

/// Index of the first byte of `haystack` that is in `set`.
#[inline]
pub fn find_any(haystack: &[u8], set: &[u8]) -> Option<usize> {
    match *set {
        [] => None,
        [a] => memchr(a, haystack),
        [a, b] => memchr2(a, b, haystack),
        [a, b, c] => memchr3(a, b, c, haystack),
        _ => haystack.iter().position(|byte| set.contains(byte)),
    }
}

/// Index of the first byte of `haystack` that is NOT in `set`.
#[inline]
pub fn find_not_any(haystack: &[u8], set: &[u8]) -> Option<usize> {
    haystack.iter().position(|byte| !set.contains(byte))
}

/// Index of the first occurrence of the literal `needle`.
///
/// An empty needle matches at offset zero.
#[inline]
pub fn find_sequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    memmem::find(haystack, needle)
}
