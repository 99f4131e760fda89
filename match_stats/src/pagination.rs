use log::debug;

use crate::config::{PagePlan, PageSpan};

/// Splits rows into pages, greedily and in order.
///
/// Rows are added to the current page until the next one would exceed the
/// page capacity; that row then opens a new page. The first page uses
/// `first_page_capacity` (it also carries the report header), every later
/// page uses `later_page_capacity`. A row taller than a whole page is placed
/// alone on its own page and overflows it.
///
/// Every row appears in exactly one span, spans are contiguous and in row
/// order. No rows give an empty plan.
pub fn plan(row_heights: &[u32], first_page_capacity: u32, later_page_capacity: u32) -> PagePlan {
    let mut spans: Vec<PageSpan> = Vec::new();
    let mut start_row: usize = 0;
    let mut used: u64 = 0;
    let mut capacity = first_page_capacity as u64;

    for (idx, &h) in row_heights.iter().enumerate() {
        let h = h as u64;
        if idx > start_row && used + h > capacity {
            spans.push(PageSpan {
                start_row,
                row_count: idx - start_row,
            });
            start_row = idx;
            used = 0;
            capacity = later_page_capacity as u64;
        }
        used += h;
        if idx == start_row && used > capacity {
            debug!(
                "plan: row {} ({} px) exceeds the page capacity ({} px), forced onto its own page",
                idx, h, capacity
            );
            spans.push(PageSpan {
                start_row,
                row_count: 1,
            });
            start_row = idx + 1;
            used = 0;
            capacity = later_page_capacity as u64;
        }
    }
    if start_row < row_heights.len() {
        spans.push(PageSpan {
            start_row,
            row_count: row_heights.len() - start_row,
        });
    }
    debug!(
        "plan: {} rows on {} pages (capacity {} px then {} px)",
        row_heights.len(),
        spans.len(),
        first_page_capacity,
        later_page_capacity
    );
    PagePlan { spans }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(p: &PagePlan) -> Vec<(usize, usize)> {
        p.spans.iter().map(|s| (s.start_row, s.row_count)).collect()
    }

    fn assert_covers(p: &PagePlan, n: usize) {
        assert_eq!(p.total_rows(), n);
        let mut next = 0;
        for s in p.spans.iter() {
            assert_eq!(s.start_row, next);
            assert!(s.row_count > 0);
            next += s.row_count;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn single_tall_row() {
        let p = plan(&[500], 100, 100);
        assert_eq!(spans(&p), vec![(0, 1)]);
    }

    #[test]
    fn empty_input() {
        let p = plan(&[], 100, 200);
        assert_eq!(p.page_count(), 0);
        assert_covers(&p, 0);
    }

    #[test]
    fn first_page_is_smaller() {
        let heights = [30, 30, 30, 30, 30, 30, 30];
        let p = plan(&heights, 60, 100);
        assert_eq!(spans(&p), vec![(0, 2), (2, 3), (5, 2)]);
        assert_covers(&p, heights.len());
        assert_eq!(p.page_of(4), Some(1));
        assert_eq!(p.page_of(7), None);
    }

    #[test]
    fn exact_fit_stays_on_page() {
        let p = plan(&[50, 50, 50], 100, 100);
        assert_eq!(spans(&p), vec![(0, 2), (2, 1)]);
    }

    #[test]
    fn tall_row_in_the_middle() {
        let heights = [40, 40, 250, 40, 40];
        let p = plan(&heights, 100, 100);
        assert_eq!(spans(&p), vec![(0, 2), (2, 1), (3, 2)]);
        assert_covers(&p, heights.len());
    }

    #[test]
    fn zero_capacity_still_progresses() {
        let heights = [10, 0, 10];
        let p = plan(&heights, 0, 0);
        assert_covers(&p, heights.len());
        assert_eq!(spans(&p), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn coverage_on_mixed_heights() {
        let heights: Vec<u32> = (0..200).map(|i| (i * 37 % 90) + 5).collect();
        for (first, later) in [(50, 120), (300, 300), (1, 1000), (0, 80)] {
            let p = plan(&heights, first, later);
            assert_covers(&p, heights.len());
        }
    }
}
