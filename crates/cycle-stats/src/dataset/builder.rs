use crate::error::{AnalysisError, Result};

/// Append-only sequence that only accepts an item at its current length.
///
/// Used where records are produced by enumerating paired inputs: an index
/// that skips ahead or repeats indicates an assembly bug and is rejected.
///
/// # Examples
///
/// ```
/// use cycle_stats::dataset::SequentialBuilder;
///
/// let mut builder = SequentialBuilder::new();
/// builder.push_at(0, "first").unwrap();
/// builder.push_at(1, "second").unwrap();
/// assert!(builder.push_at(3, "skipped").is_err());
/// assert_eq!(builder.finish(), vec!["first", "second"]);
/// ```
#[derive(Debug, Clone)]
pub struct SequentialBuilder<T> {
    items: Vec<T>,
}

impl<T> SequentialBuilder<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// The only index [`push_at`](Self::push_at) will accept next.
    pub fn next_index(&self) -> usize {
        self.items.len()
    }

    /// Append `item`, which must be at `index == self.next_index()`.
    pub fn push_at(&mut self, index: usize, item: T) -> Result<()> {
        let expected = self.items.len();
        if index != expected {
            return Err(AnalysisError::OutOfOrderIndex {
                expected,
                got: index,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn finish(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for SequentialBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
