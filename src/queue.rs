use std::{
    collections::{HashSet, VecDeque},
    hash::Hash,
};

/// Items that may carry a memoization key.
///
/// Items without a key are always admitted to a [`QueueOnce`].
pub trait Memoize {
    type Key: Eq + Hash;

    fn memo_key(&self) -> Option<Self::Key>;
}

/// FIFO queue that admits each keyed item at most once over its lifetime.
///
/// The memo is never flushed: an item popped long ago still blocks a later
/// push with the same key.
pub struct QueueOnce<T: Memoize> {
    items: VecDeque<T>,
    memo: HashSet<T::Key>,
}

impl<T: Memoize> QueueOnce<T> {
    pub fn new() -> Self {
        QueueOnce {
            items: VecDeque::new(),
            memo: HashSet::new(),
        }
    }

    /// Enqueues `item` unless an item with the same key was pushed before.
    /// Returns whether the item was admitted.
    pub fn push(&mut self, item: T) -> bool {
        if let Some(key) = item.memo_key() {
            if !self.memo.insert(key) {
                return false;
            }
        }
        self.items.push_back(item);
        true
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Memoize> Default for QueueOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(Option<u32>, &'static str);

    impl Memoize for Item {
        type Key = u32;

        fn memo_key(&self) -> Option<u32> {
            self.0
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = QueueOnce::new();
        queue.push(Item(Some(1), "a"));
        queue.push(Item(Some(2), "b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(Item(Some(1), "a")));
        assert_eq!(queue.pop(), Some(Item(Some(2), "b")));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_keyed_items_admitted_once() {
        let mut queue = QueueOnce::new();
        assert!(queue.push(Item(Some(1), "a")));
        assert!(!queue.push(Item(Some(1), "again")));
        queue.pop();
        // Still remembered after being popped
        assert!(!queue.push(Item(Some(1), "later")));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unkeyed_items_always_admitted() {
        let mut queue = QueueOnce::new();
        assert!(queue.push(Item(None, "x")));
        assert!(queue.push(Item(None, "x")));
        assert_eq!(queue.len(), 2);
    }
}
