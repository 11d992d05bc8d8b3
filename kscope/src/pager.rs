//! Paginated table walker.
//!
//! Large sparse tables are listed a page at a time. Each call resumes from a
//! [`PageCursor`], emits at most `budget` live entries and either leaves the
//! cursor on the next unseen live entry ([`PageStatus::More`]) or wraps it to
//! the start of the table ([`PageStatus::Complete`]).
//!
//! # Cursor Semantics
//!
//! ```text
//! slots:   0    1    2    3    4          budget = 2
//!          A   free  B   free  C
//!
//! call 1:  A, B          cursor -> 4   More
//! call 2:  C             cursor -> 0   Complete
//! call 3:  A, B          cursor -> 4   More
//! ```
//!
//! The cursor is a position, not an identity. If the table changes between
//! calls the next page simply starts at whatever now lives at that position.
//! A page whose last row is also the last live entry of the table completes
//! the pass; there is never a trailing empty page.

use log::debug;

/// Whether a page ended the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// The budget ran out; the next call continues where this one stopped
    More,
    /// The end of the table was reached; the next call starts over
    Complete,
}

/// Rows emitted by one call, with their table index
#[derive(Debug)]
pub struct Page<'a, T> {
    pub rows: Vec<(usize, &'a T)>,
    pub status: PageStatus,
}

/// Resume position for one paginated listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    position: usize,
}

impl PageCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next page starts scanning from
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Start the next page at the top of the table
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Emit the next page of live entries
    ///
    /// A budget of zero is treated as one. A cursor beyond the end of
    /// `entries` (the table shrank) restarts at the top.
    pub fn next_page<'a, T>(
        &mut self,
        entries: &'a [T],
        budget: usize,
        is_live: impl Fn(&T) -> bool,
    ) -> Page<'a, T> {
        let budget = budget.max(1);
        if self.position >= entries.len() {
            self.position = 0;
        }

        let mut rows = Vec::with_capacity(budget.min(entries.len()));
        let live = entries.iter().enumerate().skip(self.position).filter(|&(_, e)| is_live(e));
        for (index, entry) in live {
            if rows.len() == budget {
                debug!("Page stopped at index {index} after {budget} rows");
                self.position = index;
                return Page { rows, status: PageStatus::More };
            }
            rows.push((index, entry));
        }

        debug!("Page reached end of table after {} rows", rows.len());
        self.position = 0;
        Page { rows, status: PageStatus::Complete }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `None` is a free slot
    type Slot = Option<&'static str>;

    fn names<'a>(page: &Page<'a, Slot>) -> Vec<&'a str> {
        page.rows.iter().filter_map(|(_, slot)| **slot).collect()
    }

    #[test]
    fn test_three_live_entries_budget_two() {
        let table: [Slot; 5] = [Some("A"), None, Some("B"), None, Some("C")];
        let mut cursor = PageCursor::new();

        let first = cursor.next_page(&table, 2, Option::is_some);
        assert_eq!(names(&first), ["A", "B"]);
        assert_eq!(first.status, PageStatus::More);
        assert_eq!(cursor.position(), 4);

        let second = cursor.next_page(&table, 2, Option::is_some);
        assert_eq!(names(&second), ["C"]);
        assert_eq!(second.status, PageStatus::Complete);
        assert_eq!(cursor.position(), 0);

        let third = cursor.next_page(&table, 2, Option::is_some);
        assert_eq!(names(&third), names(&first));
        assert_eq!(third.status, PageStatus::More);
    }

    #[test]
    fn test_full_pass_visits_every_live_entry_once() {
        // K live entries scattered among free slots, for several budgets
        let table: Vec<Option<usize>> =
            (0..40).map(|i| if i % 3 == 1 { None } else { Some(i) }).collect();
        let live: Vec<usize> = table.iter().flatten().copied().collect();
        let k = live.len();

        for budget in 1..=k + 1 {
            let mut cursor = PageCursor::new();
            let calls = k.div_ceil(budget);
            let mut seen = Vec::new();
            for call in 1..=calls {
                let page = cursor.next_page(&table, budget, Option::is_some);
                let expected = if call == calls { PageStatus::Complete } else { PageStatus::More };
                assert_eq!(page.status, expected, "budget={budget} call={call}");
                seen.extend(page.rows.iter().filter_map(|(_, v)| **v));
            }
            assert_eq!(seen, live, "budget={budget}");
            assert_eq!(cursor.position(), 0);
        }
    }

    #[test]
    fn test_exact_multiple_completes_on_last_full_page() {
        let table: [Slot; 4] = [Some("A"), Some("B"), Some("C"), Some("D")];
        let mut cursor = PageCursor::new();
        assert_eq!(cursor.next_page(&table, 2, Option::is_some).status, PageStatus::More);
        let last = cursor.next_page(&table, 2, Option::is_some);
        assert_eq!(names(&last), ["C", "D"]);
        assert_eq!(last.status, PageStatus::Complete);
    }

    #[test]
    fn test_empty_table_completes_immediately() {
        let table: [Slot; 6] = [None; 6];
        for budget in [0, 1, 5, 100] {
            let mut cursor = PageCursor::new();
            let page = cursor.next_page(&table, budget, Option::is_some);
            assert!(page.rows.is_empty());
            assert_eq!(page.status, PageStatus::Complete);
        }

        let nothing: [Slot; 0] = [];
        let page = PageCursor::new().next_page(&nothing, 3, Option::is_some);
        assert_eq!(page.status, PageStatus::Complete);
    }

    #[test]
    fn test_cursor_past_shrunk_table_restarts() {
        let long: [Slot; 5] = [Some("A"), Some("B"), Some("C"), Some("D"), Some("E")];
        let short: [Slot; 2] = [Some("x"), Some("y")];
        let mut cursor = PageCursor::new();
        cursor.next_page(&long, 4, Option::is_some);
        assert_eq!(cursor.position(), 4);

        let page = cursor.next_page(&short, 4, Option::is_some);
        assert_eq!(names(&page), ["x", "y"]);
        assert_eq!(page.status, PageStatus::Complete);
    }

    #[test]
    fn test_zero_budget_acts_as_one() {
        let table: [Slot; 2] = [Some("A"), Some("B")];
        let mut cursor = PageCursor::new();
        let page = cursor.next_page(&table, 0, Option::is_some);
        assert_eq!(names(&page), ["A"]);
        assert_eq!(page.status, PageStatus::More);
    }

    #[test]
    fn test_reset() {
        let table: [Slot; 3] = [Some("A"), Some("B"), Some("C")];
        let mut cursor = PageCursor::new();
        cursor.next_page(&table, 1, Option::is_some);
        cursor.reset();
        assert_eq!(names(&cursor.next_page(&table, 1, Option::is_some)), ["A"]);
    }
}
