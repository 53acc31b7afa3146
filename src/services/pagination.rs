use serde::{Deserialize, Serialize};

pub const MENU_PAGE_SIZE: i64 = 6;
pub const ADMIN_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_NUMBER: i64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub per_page: i64,
}

impl Page {
    /// Page numbers are 1-based and clamped to `1..=MAX_PAGE_NUMBER`.
    pub fn new(number: Option<i64>, per_page: i64) -> Self {
        Page {
            number: number.unwrap_or(1).clamp(1, MAX_PAGE_NUMBER),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        Paginated {
            items,
            page: page.number,
            per_page: page.per_page,
            total,
            total_pages: total_pages(total, page.per_page),
        }
    }

    /// Slices an already-loaded, already-filtered list.
    pub fn from_vec(all: Vec<T>, page: Page) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();

        Paginated::new(items, page, total)
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Query-string parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped_and_offset_computed() {
        assert_eq!(Page::new(None, 10).offset(), 0);
        assert_eq!(Page::new(Some(0), 10).number, 1);
        assert_eq!(Page::new(Some(-4), 10).number, 1);
        assert_eq!(Page::new(Some(3), 6).offset(), 12);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let page = Page::new(Some(i64::MAX), 10);
        assert_eq!(page.number, MAX_PAGE_NUMBER);
        assert_eq!(page.offset(), (MAX_PAGE_NUMBER - 1) * 10);

        let past_end = Paginated::from_vec(vec![1, 2, 3], page);
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn envelope_uses_snake_case_keys() {
        let paged = Paginated::new(vec![1], Page::new(Some(1), 10), 1);
        let json = serde_json::to_value(&paged).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "items": [1], "page": 1, "per_page": 10, "total": 1, "total_pages": 1 })
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(13, 6), 3);
    }

    #[test]
    fn from_vec_slices_the_requested_page() {
        let paged = Paginated::from_vec((1..=13).collect::<Vec<_>>(), Page::new(Some(3), 6));
        assert_eq!(paged.items, vec![13]);
        assert_eq!(paged.total, 13);
        assert_eq!(paged.total_pages, 3);

        let past_end = Paginated::from_vec(vec![1, 2], Page::new(Some(5), 6));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.page, 5);
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = ListQuery { search: Some("   ".into()), ..Default::default() };
        assert_eq!(query.search_term(), None);

        let query = ListQuery { search: Some(" Meja ".into()), ..Default::default() };
        assert_eq!(query.search_term().as_deref(), Some("meja"));
    }
}
