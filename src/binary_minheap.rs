use std::fmt::{self, Debug, Formatter};

use crate::error::{IPQError, IPQResult};

/// Heap position of an index, or `Absent` if the index is not in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Absent,
    At(usize),
}

/// Binary min-heap over a fixed universe of indices `0..capacity`.
///
/// Every index carries at most one priority at a time. Besides the usual
/// push/pop operations, the heap tracks the position of each index, so the
/// priority of an arbitrary index can be changed and an arbitrary index can
/// be removed in `O(log n)`. This is what Dijkstra-like algorithms need for
/// their "decrease key" step.
pub struct IndexedBinaryHeap<P> {
    priorities: Vec<Option<P>>,
    heap: Vec<usize>,
    positions: Vec<Position>,
}

/// Get the left child position of `pos`
fn get_left(pos: usize) -> usize {
    2 * pos + 1
}

/// Get the right child position of `pos`
fn get_right(pos: usize) -> usize {
    2 * pos + 2
}

/// Get the parent position of `pos`. Must not be called for the root.
fn get_parent(pos: usize) -> usize {
    (pos - 1) / 2
}

impl<P: PartialOrd> IndexedBinaryHeap<P> {
    /// Create a new `IndexedBinaryHeap` that accepts the indices `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        log::debug!("Creating indexed binary heap with capacity {}", capacity);
        Self {
            priorities: (0..capacity).map(|_| None).collect(),
            heap: Vec::with_capacity(capacity),
            positions: vec![Position::Absent; capacity],
        }
    }

    /// Number of indices this heap can hold
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices currently in the heap
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` if the heap contains `index`.
    /// Indices outside of the capacity are never contained.
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.positions.get(index), Some(Position::At(_)))
    }

    /// Get the priority of `index`, or `None` if `index` is not in the heap
    pub fn priority_of(&self, index: usize) -> Option<&P> {
        if self.contains(index) {
            self.priorities[index].as_ref()
        } else {
            None
        }
    }

    /// Push `index` with `priority` on the heap.
    /// Does nothing if `index` is already contained; the old priority is kept.
    pub fn insert(&mut self, priority: P, index: usize) -> IPQResult<()> {
        self.check_index(index)?;
        if self.contains(index) {
            log::trace!("Index {} already in heap, ignoring insert", index);
            return Ok(());
        }

        let pos = self.heap.len();
        self.priorities[index] = Some(priority);
        self.heap.push(index);
        self.positions[index] = Position::At(pos);
        self.swim(pos);
        Ok(())
    }

    /// Get the minimum priority and its index without removing it
    pub fn peek_min(&self) -> IPQResult<(&P, usize)> {
        match self.heap.first() {
            Some(&index) => Ok((self.priority_at_index(index), index)),
            None => Err(IPQError::EmptyQueue),
        }
    }

    /// Remove the minimum index from the heap and return it with its priority
    pub fn extract_min(&mut self) -> IPQResult<(P, usize)> {
        if self.is_empty() {
            return Err(IPQError::EmptyQueue);
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);
        let min_index = self.remove_last();
        self.sink(0);

        let priority = self.take_priority(min_index);
        Ok((priority, min_index))
    }

    /// Alias of [`peek_min`](Self::peek_min)
    pub fn top(&self) -> IPQResult<(&P, usize)> {
        self.peek_min()
    }

    /// Remove the minimum index from the heap, discarding it
    pub fn pop(&mut self) -> IPQResult<()> {
        self.extract_min().map(|_| ())
    }

    /// Remove `index` from the heap and return its priority.
    /// Returns `None` if `index` is not contained.
    pub fn erase(&mut self, index: usize) -> IPQResult<Option<P>> {
        self.check_index(index)?;
        let pos = match self.positions[index] {
            Position::At(pos) => pos,
            Position::Absent => {
                log::trace!("Index {} not in heap, ignoring erase", index);
                return Ok(None);
            }
        };

        let last = self.heap.len() - 1;
        self.swap(pos, last);
        self.remove_last();
        if pos < self.heap.len() {
            self.swim(pos);
            self.sink(pos);
        }

        Ok(Some(self.take_priority(index)))
    }

    /// Set the priority of `index` to `priority`.
    /// Inserts `index` if it is not contained yet.
    pub fn change_key(&mut self, priority: P, index: usize) -> IPQResult<()> {
        self.check_index(index)?;
        match self.positions[index] {
            Position::Absent => self.insert(priority, index),
            Position::At(pos) => {
                self.priorities[index] = Some(priority);
                // At most one of both actually moves the index
                self.swim(pos);
                if let Position::At(pos) = self.positions[index] {
                    self.sink(pos);
                }
                Ok(())
            }
        }
    }

    /// Remove all indices from the heap
    pub fn clear(&mut self) {
        for &index in &self.heap {
            self.positions[index] = Position::Absent;
            self.priorities[index] = None;
        }
        self.heap.clear();
    }

    /// Iterate over all `(priority, index)` pairs in heap order, which is
    /// not sorted
    pub fn iter(&self) -> impl Iterator<Item = (&P, usize)> + '_ {
        self.heap.iter().map(move |&index| (self.priority_at_index(index), index))
    }

    /// Drain the heap into a vector sorted by ascending priority
    pub fn into_sorted_vec(mut self) -> Vec<(P, usize)> {
        let mut sorted = Vec::with_capacity(self.len());
        while let Ok(entry) = self.extract_min() {
            sorted.push(entry);
        }
        sorted
    }

    /// Fail with `IndexOutOfRange` if `index` exceeds the capacity
    fn check_index(&self, index: usize) -> IPQResult<()> {
        if index < self.capacity() {
            Ok(())
        } else {
            Err(IPQError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            })
        }
    }

    /// Priority of a contained index
    fn priority_at_index(&self, index: usize) -> &P {
        match &self.priorities[index] {
            Some(priority) => priority,
            None => unreachable!("index {} in heap without priority", index),
        }
    }

    /// Priority of the index at heap position `pos`
    fn priority_at(&self, pos: usize) -> &P {
        self.priority_at_index(self.heap[pos])
    }

    /// Move the priority of a removed index out of its slot
    fn take_priority(&mut self, index: usize) -> P {
        match self.priorities[index].take() {
            Some(priority) => priority,
            None => unreachable!("index {} removed without priority", index),
        }
    }

    /// Set `index` at heap position `pos`
    fn set_index_and_pos(&mut self, index: usize, pos: usize) {
        self.heap[pos] = index;
        self.positions[index] = Position::At(pos);
    }

    /// Swap the indices at heap positions `a` and `b`
    fn swap(&mut self, a: usize, b: usize) {
        let a_index = self.heap[a];
        let b_index = self.heap[b];

        self.set_index_and_pos(a_index, b);
        self.set_index_and_pos(b_index, a);
    }

    /// Drop the last heap position and mark its index absent
    fn remove_last(&mut self) -> usize {
        match self.heap.pop() {
            Some(index) => {
                self.positions[index] = Position::Absent;
                index
            }
            None => unreachable!("remove_last called on empty heap"),
        }
    }

    /// Move the index at `pos` up while its priority is smaller than its parent's
    fn swim(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = get_parent(pos);
            if self.priority_at(pos) < self.priority_at(parent) {
                self.swap(parent, pos);
                pos = parent;
            } else {
                break;
            }
        }
    }

    /// Move the index at `pos` down while its priority is greater than its
    /// smaller child's
    fn sink(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = get_left(pos);
            if left >= len {
                break;
            }

            let right = get_right(pos);
            let mut smallest = left;
            if right < len && self.priority_at(left) > self.priority_at(right) {
                smallest = right;
            }

            if self.priority_at(pos) <= self.priority_at(smallest) {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

impl<P: PartialOrd + Debug> Debug for IndexedBinaryHeap<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedBinaryHeap")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
