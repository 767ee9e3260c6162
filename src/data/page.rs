use crate::{
    data::list_query::{DEFAULT_LIMIT, DEFAULT_PAGE, ListQuery, MAX_LIMIT},
    error::ApiError,
};
use serde::{Deserialize, Serialize};

///the query string exactly as an API caller sent it
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl From<&ListQuery> for RawListParams {
    fn from(query: &ListQuery) -> Self {
        Self {
            search: Some(query.search.clone()),
            page: Some(query.page.to_string()),
            limit: Some(query.limit.to_string()),
        }
    }
}

///a validated request for one page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    ///unlike [`ListQuery::decode`], nothing malformed gets quietly defaulted here
    pub fn parse(
        RawListParams {
            search,
            page,
            limit,
        }: RawListParams,
    ) -> Result<Self, ApiError> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or(ApiError::InvalidPage)?,
        };
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                .ok_or(ApiError::InvalidLimit)?,
        };

        Ok(Self {
            search: search.filter(|search| !search.is_empty()),
            page,
            limit,
        })
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        Self {
            page,
            limit,
            total_items,
            total_pages: total_items.div_ceil(u64::from(limit.max(1))),
        }
    }

    ///1-indexed position of the first item on this page, or 0 if there is nothing on it
    pub fn first_item(&self) -> u64 {
        let start = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) + 1;
        if start > self.total_items { 0 } else { start }
    }

    ///0 whenever [`Self::first_item`] is, so a page past the end reads "0 to 0"
    pub fn last_item(&self) -> u64 {
        if self.first_item() == 0 {
            return 0;
        }
        (u64::from(self.page) * u64::from(self.limit)).min(self.total_items)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
