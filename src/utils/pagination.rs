use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Resolve a raw `?page=` value against the number of pages.
///
/// Missing or non-numeric values select the first page. Numbers outside
/// `1..=num_pages` select the last page.
pub fn resolve_page_number(raw: Option<&str>, num_pages: usize) -> usize {
    match raw.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) if n >= 1 && (n as usize) <= num_pages => n as usize,
        Some(Ok(_)) => num_pages,
    }
}

/// Where a requested page falls in a listing of `count` items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindow {
    pub page: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn new(count: usize, raw_page: Option<&str>, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        // An empty listing still has one (empty) page.
        let num_pages = count.div_ceil(per_page).max(1);
        PageWindow {
            page: resolve_page_number(raw_page, num_pages),
            num_pages,
            count,
            per_page,
        }
    }

    /// Items to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            page: self.page,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.page < self.num_pages,
            has_previous: self.page > 1,
        }
    }
}
