//! The dashboard's view state, as it lives in the URL.
//!
//! Decoding here is deliberately forgiving: anything missing or garbled falls back to the default,
//! since the only thing producing these strings is our own UI. The API does its own strict parsing
//! in [`crate::data::page::PageRequest`].

use std::fmt::{Display, Formatter};
use url::form_urlencoded;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub search: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn new(search: impl Into<String>, page: u32, limit: u32) -> Self {
        Self {
            search: search.into(),
            page,
            limit,
        }
    }

    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    ///canonical query string, leaving out anything that is at its default
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair("search", &self.search);
        }
        if self.page != DEFAULT_PAGE {
            serializer.append_pair("page", &self.page.to_string());
        }
        if self.limit != DEFAULT_LIMIT {
            serializer.append_pair("limit", &self.limit.to_string());
        }
        serializer.finish()
    }

    pub fn decode(query: &str) -> Self {
        let mut decoded = Self::default();

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "search" => decoded.search = value.into_owned(),
                "page" => {
                    decoded.page = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|page| *page >= 1)
                        .unwrap_or(DEFAULT_PAGE);
                }
                "limit" => {
                    decoded.limit = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                        .unwrap_or(DEFAULT_LIMIT);
                }
                _ => {}
            }
        }

        decoded
    }

    ///link to the dashboard showing this state
    pub fn to_href(&self) -> String {
        if self.is_default() {
            "/".to_string()
        } else {
            format!("/?{}", self.encode())
        }
    }

    ///a fresh search always starts back at the first page
    #[must_use]
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            page: DEFAULT_PAGE,
            limit: self.limit,
        }
    }

    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            search: self.search.clone(),
            page: page.max(1),
            limit: self.limit,
        }
    }
}

impl Display for ListQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
