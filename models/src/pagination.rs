use serde::Serialize;

/// One page of an already-filtered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub per_page: usize,
}

/// Splits result sets into fixed-size pages. The requested page number is
/// taken as untrusted text: junk or out-of-range values are clamped instead
/// of failing, so a stale link still renders a page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Paginator { per_page: per_page.max(1) }
    }

    pub fn page<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let total_items = items.len();
        let total_pages = total_items.div_ceil(self.per_page).max(1);
        let number = match requested.and_then(|raw| raw.trim().parse::<usize>().ok()) {
            Some(n) if n >= 1 => n.min(total_pages),
            _ => 1,
        };
        let start = (number - 1) * self.per_page;
        let page_items = items.into_iter().skip(start).take(self.per_page).collect();
        Page {
            items: page_items,
            number,
            total_pages,
            total_items,
            per_page: self.per_page,
        }
    }
}
