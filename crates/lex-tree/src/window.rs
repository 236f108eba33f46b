//! Sibling windows.
//!
//! Long sibling lists (a chapter with hundreds of sections) are never
//! materialized in full around an amendment; only a bounded window of
//! neighbours on each side of the target is kept for context.

use std::ops::Range;

use tracing::warn;

/// Default number of siblings kept on each side of the target.
pub const DEFAULT_RADIUS: usize = 3;

/// Index range of the window around `target`, or `None` if it is absent.
///
/// The window spans `radius` siblings on each side of the target and is
/// clamped at both ends of the list.
pub fn locate_window<T, K, F>(siblings: &[T], target: &K, radius: usize, key: F) -> Option<Range<usize>>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let idx = siblings.iter().position(|s| key(s) == *target)?;
    let start = idx.saturating_sub(radius);
    let end = idx.saturating_add(radius).saturating_add(1).min(siblings.len());
    Some(start..end)
}

/// Contiguous slice of at most `2 * radius + 1` siblings centred on `target`.
///
/// If `target` is not among `siblings` the whole list is returned unchanged.
pub fn sibling_window<'a, T, K, F>(siblings: &'a [T], target: &K, radius: usize, key: F) -> &'a [T]
where
    K: PartialEq + std::fmt::Debug,
    F: Fn(&T) -> K,
{
    match locate_window(siblings, target, radius, key) {
        Some(range) => &siblings[range],
        None => {
            warn!(?target, len = siblings.len(), "window target not among siblings; keeping full list");
            siblings
        }
    }
}
