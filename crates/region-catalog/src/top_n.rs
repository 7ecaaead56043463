//! Partial selection of the greatest N elements

use std::cmp::Ordering;

/// Return the `n` greatest items under `less`, greatest first.
///
/// `less` must be a strict weak ordering. When `n` covers the whole input
/// every item is returned, sorted; `n == 0` returns nothing. The order of
/// items that compare equal is unspecified.
///
/// Runs a quickselect partition before sorting, so only the selected prefix
/// pays for the sort.
pub fn top_n<T, I, F>(items: I, less: F, n: usize) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T, &T) -> bool,
{
    if n == 0 {
        return Vec::new();
    }

    let mut items: Vec<T> = items.into_iter().collect();
    let greatest_first = |a: &T, b: &T| {
        if less(b, a) {
            Ordering::Less
        } else if less(a, b) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    };

    if n < items.len() {
        items.select_nth_unstable_by(n - 1, greatest_first);
        items.truncate(n);
    }
    items.sort_unstable_by(greatest_first);
    items
}
