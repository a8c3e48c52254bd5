use serde::Serialize;

/// Maximum number of page links a pager shows at once.
const WINDOW: u32 = 5;

/// Number of pages needed for `total` items, `per_page` at a time.
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    total.div_ceil(per_page) as u32
}

/// Clamp a requested page into `1..=max(total_pages, 1)`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Slice of `items` shown on `page`, after clamping the page.
pub fn paginate<T>(items: &[T], page: u32, per_page: u32) -> &[T] {
    let per_page = per_page.max(1) as usize;
    let pages = total_pages(items.len() as u64, per_page as u32);
    let page = clamp_page(page, pages) as usize;
    let start = (page - 1) * per_page;
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

/// Case-insensitive substring match of `term` against any of `fields`.
/// A blank term matches everything.
pub fn matches_search<'a, I>(fields: I, term: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Everything a pager needs to render itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: u32,
    pub total_pages: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub pages: Vec<u32>,
}

impl PageWindow {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let last = total_pages.max(1);
        let page = clamp_page(page, total_pages);

        let span = WINDOW.min(last);
        let mut start = page.saturating_sub(WINDOW / 2).max(1);
        if start + span - 1 > last {
            start = last + 1 - span;
        }

        Self {
            page,
            total_pages,
            prev: (page > 1).then(|| page - 1),
            next: (page < total_pages).then(|| page + 1),
            pages: (start..start + span).collect(),
        }
    }

    pub fn from_total(page: u32, total: u64, per_page: u32) -> Self {
        Self::new(page, total_pages(total, per_page))
    }
}
