//! Directional cursors over a collection or index.

use crate::Record;

/// Iteration direction for a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Forward,
    /// Descending key order.
    Reverse,
}

/// A directional iterator over records, supporting skip-ahead and early
/// termination.
///
/// A cursor is only valid inside the read unit that produced it; it borrows
/// the records it walks and never materializes skipped ones.
pub struct Cursor<'a> {
    inner: Box<dyn Iterator<Item = &'a Record> + 'a>,
}

impl<'a> Cursor<'a> {
    /// Builds a cursor from an ordered iterator, reversing it when asked.
    pub(crate) fn from_iter<I>(iter: I, direction: Direction) -> Self
    where
        I: DoubleEndedIterator<Item = &'a Record> + 'a,
    {
        let inner: Box<dyn Iterator<Item = &'a Record> + 'a> = match direction {
            Direction::Forward => Box::new(iter),
            Direction::Reverse => Box::new(iter.rev()),
        };
        Self { inner }
    }

    /// Advances past `n` records without materializing them.
    pub fn advance(&mut self, n: u64) {
        for _ in 0..n {
            if self.inner.next().is_none() {
                break;
            }
        }
    }

    /// Yields the next record in cursor order, or `None` at the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a Record> {
        self.inner.next()
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::key::KeyValue;
    use serde_json::json;

    fn seeded() -> Collection {
        let mut c = Collection::new("id");
        for id in 1..=5 {
            c.insert(
                KeyValue::Integer(id),
                json!({"id": id}).as_object().cloned().unwrap(),
            );
        }
        c
    }

    fn drain(cursor: &mut Cursor<'_>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(r) = cursor.next() {
            out.push(r.get("id").and_then(|v| v.as_i64()).unwrap());
        }
        out
    }

    #[test]
    fn advance_skips_records() {
        let c = seeded();
        let mut cursor = c.cursor(Direction::Forward);
        cursor.advance(2);
        assert_eq!(drain(&mut cursor), vec![3, 4, 5]);
    }

    #[test]
    fn advance_past_end_is_exhausted() {
        let c = seeded();
        let mut cursor = c.cursor(Direction::Forward);
        cursor.advance(99);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn reverse_then_advance() {
        let c = seeded();
        let mut cursor = c.cursor(Direction::Reverse);
        cursor.advance(1);
        assert_eq!(drain(&mut cursor), vec![4, 3, 2, 1]);
    }
}
