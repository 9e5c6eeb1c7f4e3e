use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Normalized offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl PageParams {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

impl From<PageQuery> for PageParams {
    fn from(query: PageQuery) -> Self {
        Self::new(query.page, query.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let total = total.max(0);
        let limit = params.limit.max(1) as i64;
        let total_pages = ((total + limit - 1) / limit) as u32;

        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::new(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 20 });
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(PageParams::new(Some(0), Some(0)), PageParams { page: 1, limit: 1 });
        assert_eq!(PageParams::new(Some(3), Some(500)).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageParams::new(Some(3), Some(25)).offset(), 50);
        assert_eq!(PageParams::new(Some(1), Some(100)).offset(), 0);
    }

    #[test]
    fn test_total_pages() {
        let params = PageParams::new(Some(1), Some(20));
        assert_eq!(Page::<()>::new(vec![], 0, params).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], 1, params).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 20, params).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 21, params).total_pages, 2);
    }

    #[test]
    fn test_map_preserves_metadata() {
        let page = Page::new(vec![1, 2, 3], 43, PageParams::new(Some(2), Some(3)));
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total, 43);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_pages, 15);
    }
}
