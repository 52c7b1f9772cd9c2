use serde::{Deserialize, Serialize};

/// Pages shown without a gap when the total is this small.
const COMPACT_LIMIT: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSlot {
    Page(u32),
    Gap,
}

/// Current page and page count, always kept inside `1..=total_pages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    current_page: u32,
    total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
        }
    }
}

impl Pagination {
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn set_state(&mut self, page: i64, total_pages: i64) {
        let total = total_pages.clamp(1, u32::MAX as i64);
        self.total_pages = total as u32;
        self.current_page = page.clamp(1, total) as u32;
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn page_numbers(&self) -> Vec<PageSlot> {
        let total = self.total_pages;
        let current = self.current_page;

        if total <= COMPACT_LIMIT {
            return (1..=total).map(PageSlot::Page).collect();
        }

        if current <= 3 {
            return vec![
                PageSlot::Page(1),
                PageSlot::Page(2),
                PageSlot::Page(3),
                PageSlot::Page(4),
                PageSlot::Gap,
                PageSlot::Page(total),
            ];
        }

        if current >= total - 2 {
            return vec![
                PageSlot::Page(1),
                PageSlot::Gap,
                PageSlot::Page(total - 3),
                PageSlot::Page(total - 2),
                PageSlot::Page(total - 1),
                PageSlot::Page(total),
            ];
        }

        vec![
            PageSlot::Page(1),
            PageSlot::Gap,
            PageSlot::Page(current - 1),
            PageSlot::Page(current),
            PageSlot::Page(current + 1),
            PageSlot::Gap,
            PageSlot::Page(total),
        ]
    }

    /// Page-change intent for `page`; `None` when out of range or already current.
    pub fn request(&self, page: i64) -> Option<u32> {
        if page < 1 || page > self.total_pages as i64 {
            return None;
        }
        let page = page as u32;
        (page != self.current_page).then_some(page)
    }

    pub fn request_previous(&self) -> Option<u32> {
        self.request(self.current_page as i64 - 1)
    }

    pub fn request_next(&self) -> Option<u32> {
        self.request(self.current_page as i64 + 1)
    }

    pub fn request_first(&self) -> Option<u32> {
        self.request(1)
    }

    pub fn request_last(&self) -> Option<u32> {
        self.request(self.total_pages as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use PageSlot::{Gap, Page};

    fn at(page: i64, total: i64) -> Pagination {
        let mut pagination = Pagination::default();
        pagination.set_state(page, total);
        pagination
    }

    #[test]
    fn small_totals_show_every_page() {
        for total in 1..=5 {
            for page in 1..=total {
                let expected: Vec<_> = (1..=total as u32).map(Page).collect();
                assert_eq!(at(page, total).page_numbers(), expected);
            }
        }
    }

    #[test]
    fn ten_pages_at_start_middle_and_end() {
        assert_eq!(
            at(1, 10).page_numbers(),
            vec![Page(1), Page(2), Page(3), Page(4), Gap, Page(10)]
        );
        assert_eq!(
            at(10, 10).page_numbers(),
            vec![Page(1), Gap, Page(7), Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            at(5, 10).page_numbers(),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Gap, Page(10)]
        );
    }

    #[test]
    fn window_boundaries_pick_the_right_row() {
        assert_eq!(
            at(3, 10).page_numbers(),
            vec![Page(1), Page(2), Page(3), Page(4), Gap, Page(10)]
        );
        assert_eq!(
            at(4, 10).page_numbers(),
            vec![Page(1), Gap, Page(3), Page(4), Page(5), Gap, Page(10)]
        );
        assert_eq!(
            at(8, 10).page_numbers(),
            vec![Page(1), Gap, Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn set_state_clamps_any_input() {
        let inputs = [
            i64::MIN,
            -7,
            -1,
            0,
            1,
            2,
            9,
            u32::MAX as i64,
            u32::MAX as i64 + 10,
            i64::MAX,
        ];
        for page in inputs {
            for total in inputs {
                let pagination = at(page, total);
                assert!(pagination.total_pages() >= 1);
                assert!(pagination.current_page() >= 1);
                assert!(pagination.current_page() <= pagination.total_pages());
            }
        }
    }

    #[test]
    fn empty_result_set_is_one_page() {
        let pagination = at(3, 0);
        assert_eq!(pagination.current_page(), 1);
        assert_eq!(pagination.total_pages(), 1);
        assert!(!pagination.has_previous());
        assert!(!pagination.has_next());
    }

    #[test]
    fn navigation_affordances_follow_position() {
        let middle = at(2, 3);
        assert!(middle.has_previous());
        assert!(middle.has_next());
        assert_eq!(middle.request_previous(), Some(1));
        assert_eq!(middle.request_next(), Some(3));

        let last = at(3, 3);
        assert!(!last.has_next());
        assert_eq!(last.request_next(), None);
        assert_eq!(last.request_last(), None);
        assert_eq!(last.request_first(), Some(1));
    }

    #[test]
    fn request_ignores_invalid_and_current_pages() {
        let pagination = at(2, 4);
        assert_eq!(pagination.request(0), None);
        assert_eq!(pagination.request(-3), None);
        assert_eq!(pagination.request(5), None);
        assert_eq!(pagination.request(2), None);
        assert_eq!(pagination.request(4), Some(4));
    }
}
