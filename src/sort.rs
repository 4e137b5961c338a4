//! Sorting routines over already-built sequences.
//!
//! -   `MergeSort`: a stable, comparator-driven merge sort.
//! -   `RadixSort`: a stable base-10 radix sort on an integer key.
//!
//! Both hold their strategy (the comparator, or the key extractor) so that
//! one sorter can be set up once and applied to many sequences.

use std::mem;

/// Radix of the digit passes.
const RADIX: u64 = 10;

/// A stable merge sort, ordering elements by a strict less-than comparator.
///
/// #   Example
///
/// ```
/// use shelving::MergeSort;
///
/// let mut words = vec!["pear", "fig", "apple", "kiwi"];
///
/// let mut sorter = MergeSort::new(|a: &&str, b: &&str| a.len() < b.len());
/// sorter.sort(&mut words);
/// assert_eq!(vec!["fig", "pear", "kiwi", "apple"], words);
///
/// sorter.set_comparator(|a, b| a < b);
/// sorter.sort(&mut words);
/// assert_eq!(vec!["apple", "fig", "kiwi", "pear"], words);
/// ```
pub struct MergeSort<'a, T> {
    less: Box<dyn Fn(&T, &T) -> bool + 'a>,
}

impl<'a, T> MergeSort<'a, T> {
    /// Creates a sorter ordering elements by `less`.
    pub fn new<F>(less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'a,
    {
        Self { less: Box::new(less) }
    }

    /// Replaces the comparator used by subsequent sorts.
    pub fn set_comparator<F>(&mut self, less: F)
    where
        F: Fn(&T, &T) -> bool + 'a,
    {
        self.less = Box::new(less);
    }

    /// Sorts `items` in place.
    pub fn sort(&self, items: &mut Vec<T>) {
        *items = self.sorted(mem::take(items));
    }

    /// Returns `items`, sorted.
    ///
    /// Elements which compare equal keep their relative order.
    pub fn sorted(&self, mut items: Vec<T>) -> Vec<T> {
        if items.len() < 2 {
            return items;
        }

        let right = items.split_off(items.len().div_ceil(2));
        let left = self.sorted(items);
        let right = self.sorted(right);

        self.merge(left, right)
    }

    fn merge(&self, left: Vec<T>, right: Vec<T>) -> Vec<T> {
        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();

        loop {
            let take_right = match (left.peek(), right.peek()) {
                //  Only a strictly smaller right element overtakes the left one.
                (Some(l), Some(r)) => (self.less)(r, l),
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => break,
            };

            let next = if take_right { right.next() } else { left.next() };
            merged.extend(next);
        }

        merged
    }
}

/// A stable least-significant-digit radix sort on an integer key.
///
/// Keys are split by sign before the digit passes, so negative keys sort
/// correctly too.
///
/// #   Example
///
/// ```
/// use shelving::RadixSort;
///
/// let mut values = vec![170, 45, 75, 90, 802, 24, 2, 66];
/// RadixSort::new(|v: &i64| *v).sort(&mut values);
///
/// assert_eq!(vec![2, 24, 45, 66, 75, 90, 170, 802], values);
/// ```
pub struct RadixSort<'a, T> {
    key: Box<dyn Fn(&T) -> i64 + 'a>,
}

impl<'a, T> RadixSort<'a, T> {
    /// Creates a sorter ordering elements by the integer `key`.
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> i64 + 'a,
    {
        Self { key: Box::new(key) }
    }

    /// Replaces the key extractor used by subsequent sorts.
    pub fn set_key<F>(&mut self, key: F)
    where
        F: Fn(&T) -> i64 + 'a,
    {
        self.key = Box::new(key);
    }

    /// Sorts `items` in place, ascending by key.
    pub fn sort(&self, items: &mut Vec<T>) {
        let (negative, positive): (Vec<_>, Vec<_>) = items
            .drain(..)
            .map(|item| ((self.key)(&item), item))
            .partition(|(key, _)| *key < 0);

        //  Larger magnitudes first among negative keys.
        let negative = sort_by_magnitude(negative, true);
        let positive = sort_by_magnitude(positive, false);

        items.extend(negative.into_iter().chain(positive).map(|(_, item)| item));
    }
}

//  Stable LSD passes over the base-10 digits of `|key|`.
fn sort_by_magnitude<T>(mut keyed: Vec<(i64, T)>, descending: bool) -> Vec<(i64, T)> {
    let Some(max) = keyed.iter().map(|(key, _)| key.unsigned_abs()).max() else {
        return keyed;
    };

    let mut divisor = 1u64;
    for _ in 0..digit_count(max) {
        keyed = counting_pass(keyed, divisor, descending);
        divisor = divisor.saturating_mul(RADIX);
    }

    keyed
}

//  Number of base-10 digits of `value`, 0 having one digit.
fn digit_count(mut value: u64) -> u32 {
    let mut count = 1;
    while value >= RADIX {
        value /= RADIX;
        count += 1;
    }
    count
}

//  One stable counting sort on the digit selected by `divisor`.
fn counting_pass<T>(keyed: Vec<(i64, T)>, divisor: u64, descending: bool) -> Vec<(i64, T)> {
    let digit = |key: i64| {
        let d = ((key.unsigned_abs() / divisor) % RADIX) as usize;
        if descending {
            RADIX as usize - 1 - d
        } else {
            d
        }
    };

    let mut starts = [0usize; RADIX as usize];
    for (key, _) in &keyed {
        starts[digit(*key)] += 1;
    }

    let mut total = 0;
    for start in starts.iter_mut() {
        let count = *start;
        *start = total;
        total += count;
    }

    let mut placed: Vec<Option<(i64, T)>> = (0..keyed.len()).map(|_| None).collect();
    for (key, item) in keyed {
        let bucket = &mut starts[digit(key)];
        placed[*bucket] = Some((key, item));
        *bucket += 1;
    }

    placed.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {

    use super::*;

    use proptest::prelude::*;

    #[test]
    fn merge_sort_is_stable() {
        let tagged = vec![(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd'), (1, 'e'), (3, 'f')];

        let sorter = MergeSort::new(|a: &(i32, char), b: &(i32, char)| a.0 < b.0);
        let sorted = sorter.sorted(tagged);

        assert_eq!(vec![(1, 'b'), (1, 'e'), (2, 'd'), (3, 'a'), (3, 'c'), (3, 'f')], sorted);
    }

    #[test]
    fn merge_sort_handles_trivial_inputs() {
        let sorter = MergeSort::new(|a: &u8, b: &u8| a < b);

        let mut empty: Vec<u8> = Vec::new();
        sorter.sort(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![7];
        sorter.sort(&mut single);
        assert_eq!(vec![7], single);
    }

    #[test]
    fn merge_sort_comparator_borrows_context() {
        let titles = ["Zorba", "Aeneid", "Moby Dick"];
        let mut ids = vec![0usize, 1, 2];

        MergeSort::new(|a: &usize, b: &usize| titles[*a] < titles[*b]).sort(&mut ids);

        assert_eq!(vec![1, 2, 0], ids);
    }

    #[test]
    fn radix_sort_classic() {
        let mut values = vec![170, 45, 75, 90, 802, 24, 2, 66];
        RadixSort::new(|v: &i64| *v).sort(&mut values);
        assert_eq!(vec![2, 24, 45, 66, 75, 90, 170, 802], values);
    }

    #[test]
    fn radix_sort_negative_keys() {
        let mut values = vec![-5, 12, 0, -130, 7, -5, i64::MIN, i64::MAX, -1];
        RadixSort::new(|v: &i64| *v).sort(&mut values);
        assert_eq!(vec![i64::MIN, -130, -5, -5, -1, 0, 7, 12, i64::MAX], values);
    }

    #[test]
    fn radix_sort_is_stable() {
        let mut tagged = vec![(21, 'a'), (-3, 'b'), (21, 'c'), (-3, 'd'), (4, 'e')];
        RadixSort::new(|t: &(i64, char)| t.0).sort(&mut tagged);
        assert_eq!(vec![(-3, 'b'), (-3, 'd'), (4, 'e'), (21, 'a'), (21, 'c')], tagged);
    }

    #[test]
    fn radix_sort_set_key() {
        let mut words = vec!["ccc", "a", "bb"];
        let mut sorter = RadixSort::new(|w: &&str| w.len() as i64);
        sorter.sort(&mut words);
        assert_eq!(vec!["a", "bb", "ccc"], words);

        sorter.set_key(|w| -(w.len() as i64));
        sorter.sort(&mut words);
        assert_eq!(vec!["ccc", "bb", "a"], words);
    }

    #[test]
    fn digit_counts() {
        assert_eq!(1, digit_count(0));
        assert_eq!(1, digit_count(9));
        assert_eq!(2, digit_count(10));
        assert_eq!(20, digit_count(u64::MAX));
    }

    proptest! {
        #[test]
        fn merge_sort_matches_std_stable_sort(items in proptest::collection::vec((0u8..8, any::<u16>()), 0..200)) {
            let mut expected = items.clone();
            expected.sort_by_key(|item| item.0);

            let sorted = MergeSort::new(|a: &(u8, u16), b: &(u8, u16)| a.0 < b.0).sorted(items);
            prop_assert_eq!(expected, sorted);
        }

        #[test]
        fn radix_sort_matches_std_stable_sort(items in proptest::collection::vec((any::<i64>(), any::<u8>()), 0..200)) {
            let mut expected = items.clone();
            expected.sort_by_key(|item| item.0);

            let mut sorted = items;
            RadixSort::new(|item: &(i64, u8)| item.0).sort(&mut sorted);
            prop_assert_eq!(expected, sorted);
        }
    }
}
