//! Source spans for annotation and DDL text.

use std::ops::Range;

/// A byte range in annotation or DDL source text.
pub type Span = Range<usize>;

/// A value tagged with the span it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    /// The wrapped value.
    pub node: T,
    /// Where the value appears in source text.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Creates a new spanned value.
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Maps the inner value while preserving the span.
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

/// Joins two spans into the smallest span covering both.
pub fn join(a: &Span, b: &Span) -> Span {
    a.start.min(b.start)..a.end.max(b.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanned_map_keeps_span() {
        let spanned = Spanned::new("int", 3..6).map(str::len);
        assert_eq!(spanned.node, 3);
        assert_eq!(spanned.span, 3..6);
    }

    #[test]
    fn join_covers_both() {
        assert_eq!(join(&(4..6), &(1..3)), 1..6);
        assert_eq!(join(&(2..2), &(2..9)), 2..9);
    }
}
