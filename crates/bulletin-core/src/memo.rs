//! Identity-keyed memoization for derived views.
//!
//! Derived views are recomputed only when one of their inputs changes by
//! *identity*. Slices return new `Arc`s on every mutation and keep the old
//! `Arc` otherwise, so a pointer comparison is both correct and O(1).
//!
//! Small value inputs (ids, flags, counters) compare by value; see
//! [`impl_same_input_by_value!`](crate::impl_same_input_by_value).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Input comparison used by memoized selectors.
pub trait SameInput {
    /// Whether `self` and `other` denote the same input for caching purposes.
    fn same_input(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameInput for Arc<T> {
    fn same_input(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Implement [`SameInput`] by value equality for small `Eq` types.
#[macro_export]
macro_rules! impl_same_input_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::memo::SameInput for $ty {
                fn same_input(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_same_input_by_value!(bool, u32, u64, usize, i32, i64, String, &'static str);

impl<A: SameInput, B: SameInput> SameInput for (A, B) {
    fn same_input(&self, other: &Self) -> bool {
        self.0.same_input(&other.0) && self.1.same_input(&other.1)
    }
}

impl<A: SameInput, B: SameInput, C: SameInput> SameInput for (A, B, C) {
    fn same_input(&self, other: &Self) -> bool {
        self.0.same_input(&other.0) && self.1.same_input(&other.1) && self.2.same_input(&other.2)
    }
}

/// Single-slot memoized computation.
///
/// Holds the last input and output. The compute closure runs under the slot
/// lock, so it must not call back into the same `Memo`.
pub struct Memo<I, O> {
    name: &'static str,
    slot: Mutex<Option<(I, O)>>,
    recomputations: AtomicU64,
}

impl<I: SameInput, O: Clone> Memo<I, O> {
    /// Create an empty memo. The name only appears in trace logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
            recomputations: AtomicU64::new(0),
        }
    }

    /// Return the cached output if `input` is the same as last time,
    /// otherwise run `compute` and cache its result.
    pub fn get(&self, input: I, compute: impl FnOnce(&I) -> O) -> O {
        let mut slot = self.slot.lock();
        if let Some((cached_input, cached)) = slot.as_ref() {
            if cached_input.same_input(&input) {
                return cached.clone();
            }
        }
        let output = compute(&input);
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(selector = self.name, "recomputed");
        *slot = Some((input, output.clone()));
        output
    }

    /// Number of times the computation has run.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

impl<I, O> std::fmt::Debug for Memo<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.name)
            .field("recomputations", &self.recomputations.load(Ordering::Relaxed))
            .finish()
    }
}

/// Memoized computation with one slot per parameter key.
///
/// Used for parameterized selectors ("posts by user X") so that alternating
/// between keys does not evict each other's cached result. A recompute for a
/// new input drops the slots of every other key that still holds an old one.
pub struct KeyedMemo<K, I, O> {
    name: &'static str,
    slots: Mutex<HashMap<K, (I, O)>>,
    recomputations: AtomicU64,
}

impl<K, I, O> KeyedMemo<K, I, O>
where
    K: Eq + Hash + Clone,
    I: SameInput,
    O: Clone,
{
    /// Create an empty keyed memo.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
            recomputations: AtomicU64::new(0),
        }
    }

    /// Return the cached output for `key` if `input` is the same as last
    /// time for that key, otherwise recompute.
    pub fn get(&self, key: &K, input: I, compute: impl FnOnce(&I, &K) -> O) -> O {
        let mut slots = self.slots.lock();
        if let Some((cached_input, cached)) = slots.get(key) {
            if cached_input.same_input(&input) {
                return cached.clone();
            }
        }
        let output = compute(&input, key);
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        // Slots computed from an older input can never hit again.
        slots.retain(|_, (cached_input, _)| cached_input.same_input(&input));
        tracing::trace!(selector = self.name, live = slots.len(), "recomputed");
        slots.insert(key.clone(), (input, output.clone()));
        output
    }

    /// Number of times the computation has run, across all keys.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    /// Number of keys with a cached value.
    pub fn cached_keys(&self) -> usize {
        self.slots.lock().len()
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

impl<K, I, O> std::fmt::Debug for KeyedMemo<K, I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedMemo")
            .field("name", &self.name)
            .field("recomputations", &self.recomputations.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_reuses_result_for_same_arc() {
        let memo: Memo<Arc<Vec<i32>>, Arc<i32>> = Memo::new("sum");
        let input = Arc::new(vec![1, 2, 3]);

        let first = memo.get(Arc::clone(&input), |v| Arc::new(v.iter().sum()));
        let second = memo.get(Arc::clone(&input), |v| Arc::new(v.iter().sum()));

        assert_eq!(*first, 6);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memo.recomputations(), 1);
    }

    #[test]
    fn test_memo_recomputes_for_equal_but_distinct_arc() {
        let memo: Memo<Arc<Vec<i32>>, i32> = Memo::new("sum");
        memo.get(Arc::new(vec![1, 2]), |v| v.iter().sum());
        memo.get(Arc::new(vec![1, 2]), |v| v.iter().sum());
        assert_eq!(memo.recomputations(), 2);
    }

    #[test]
    fn test_memo_tuple_input() {
        let memo: Memo<(Arc<Vec<i32>>, i32), usize> = Memo::new("count_gt");
        let data = Arc::new(vec![1, 5, 10]);

        let count = |(v, min): &(Arc<Vec<i32>>, i32)| v.iter().filter(|x| *x > min).count();
        assert_eq!(memo.get((Arc::clone(&data), 2), count), 2);
        assert_eq!(memo.get((Arc::clone(&data), 2), count), 2);
        assert_eq!(memo.recomputations(), 1);

        assert_eq!(memo.get((Arc::clone(&data), 7), count), 1);
        assert_eq!(memo.recomputations(), 2);
    }

    #[test]
    fn test_keyed_memo_keeps_one_slot_per_key() {
        let memo: KeyedMemo<String, Arc<Vec<&'static str>>, usize> = KeyedMemo::new("by_prefix");
        let words = Arc::new(vec!["apple", "avocado", "banana"]);
        let count = |w: &Arc<Vec<&'static str>>, prefix: &String| {
            w.iter().filter(|s| s.starts_with(prefix.as_str())).count()
        };

        let a = "a".to_string();
        let b = "b".to_string();
        assert_eq!(memo.get(&a, Arc::clone(&words), count), 2);
        assert_eq!(memo.get(&b, Arc::clone(&words), count), 1);
        assert_eq!(memo.get(&a, Arc::clone(&words), count), 2);

        assert_eq!(memo.recomputations(), 2);
        assert_eq!(memo.cached_keys(), 2);
    }

    #[test]
    fn test_keyed_memo_drops_slots_for_stale_input() {
        let memo: KeyedMemo<u32, Arc<Vec<u32>>, usize> = KeyedMemo::new("multiples");
        let count = |v: &Arc<Vec<u32>>, k: &u32| v.iter().filter(|x| *x % k == 0).count();

        let first = Arc::new(vec![2, 3, 4]);
        for key in 1..=5 {
            memo.get(&key, Arc::clone(&first), count);
        }
        assert_eq!(memo.cached_keys(), 5);

        let second = Arc::new(vec![6]);
        assert_eq!(memo.get(&2, Arc::clone(&second), count), 1);
        assert_eq!(memo.cached_keys(), 1);

        assert_eq!(memo.get(&3, Arc::clone(&second), count), 1);
        assert_eq!(memo.cached_keys(), 2);
        assert_eq!(memo.recomputations(), 7);
    }

    #[test]
    fn test_memo_clear() {
        let memo: Memo<u32, u32> = Memo::new("double");
        memo.get(2, |x| x * 2);
        memo.clear();
        memo.get(2, |x| x * 2);
        assert_eq!(memo.recomputations(), 2);
    }
}
