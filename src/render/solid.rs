// src/render/solid.rs

/// An inclusive range of screen columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub first: i32,
    pub last: i32,
}

impl Span {
    pub const fn new(first: i32, last: i32) -> Self {
        Span { first, last }
    }

    pub fn len(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            (self.last as i64 - self.first as i64 + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// Columns already covered by nearer solid walls this frame.
///
/// Kept sorted and non-overlapping, with sentinel spans covering everything left of
/// column 0 and everything from the screen width rightwards.
#[derive(Debug, Clone)]
pub struct SolidSpans {
    spans: Vec<Span>,
}

impl SolidSpans {
    pub fn new(width: usize) -> Self {
        let mut spans = SolidSpans {
            spans: Vec::with_capacity(64),
        };
        spans.reset(width);
        spans
    }

    /// Back to a fully open screen of `width` columns.
    pub fn reset(&mut self, width: usize) {
        self.spans.clear();
        self.spans.push(Span::new(i32::MIN, -1));
        self.spans.push(Span::new(width as i32, i32::MAX));
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// True once every column is covered.
    pub fn is_full(&self) -> bool {
        self.spans.len() == 1
    }

    pub fn is_solid(&self, column: i32) -> bool {
        let index = self.spans.partition_point(|s| s.last < column);
        self.spans
            .get(index)
            .map_or(false, |s| s.first <= column)
    }

    /// Collects the uncovered parts of `first..=last` into `out`, left to right.
    pub fn visible_ranges(&self, first: i32, last: i32, out: &mut Vec<Span>) {
        out.clear();
        if first > last {
            return;
        }

        let mut cursor = first;
        let start = self.spans.partition_point(|s| s.last < first);
        for span in &self.spans[start..] {
            if span.first > last {
                break;
            }
            if span.first > cursor {
                out.push(Span::new(cursor, span.first - 1));
            }
            cursor = cursor.max(span.last.saturating_add(1));
            if cursor > last || span.last == i32::MAX {
                return;
            }
        }
        if cursor <= last {
            out.push(Span::new(cursor, last));
        }
    }

    /// Covers `first..=last`, merging with any touching or overlapping spans.
    pub fn mark_solid(&mut self, first: i32, last: i32) {
        if first > last {
            return;
        }

        let start = self
            .spans
            .partition_point(|s| s.last < first.saturating_sub(1));
        let end = self
            .spans
            .partition_point(|s| s.first <= last.saturating_add(1));

        if start >= end {
            self.spans.insert(start, Span::new(first, last));
        } else {
            let merged = Span::new(
                first.min(self.spans[start].first),
                last.max(self.spans[end - 1].last),
            );
            self.spans.splice(start..end, std::iter::once(merged));
        }
    }
}
