//! Getting a page of students for the dashboard, either over HTTP or straight from the store.

use crate::{
    data::{
        StudentStore,
        list_query::ListQuery,
        page::{Page, RawListParams},
        student::{PgStudentStore, Student},
    },
    error::{BuildHttpClientSnafu, ClassboardResult},
    routes::students_api::search_students,
};
use snafu::{ResultExt, Snafu};
use std::{future::Future, time::Duration};

pub mod cache;

///all the presentation layer ever gets told - details stay in the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(display("Failed to fetch students"))]
pub struct FetchError;

pub trait FetchPage: Send + Sync {
    fn fetch(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Student>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    api_base: String,
}

impl HttpFetcher {
    pub fn new(api_base: impl Into<String>) -> ClassboardResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("classboard/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(10))
                .build()
                .context(BuildHttpClientSnafu)?,
            api_base: api_base.into(),
        })
    }

    pub fn url_for(&self, query: &ListQuery) -> String {
        let encoded = query.encode();
        if encoded.is_empty() {
            format!("{}/api/students", self.api_base)
        } else {
            format!("{}/api/students?{encoded}", self.api_base)
        }
    }
}

impl FetchPage for HttpFetcher {
    async fn fetch(&self, query: &ListQuery) -> Result<Page<Student>, FetchError> {
        let url = self.url_for(query);

        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!(?e, %url, "Unable to reach students API");
            FetchError
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %url, %body, "Students API returned an error");
            return Err(FetchError);
        }

        response.json().await.map_err(|e| {
            warn!(?e, %url, "Unable to decode students API response");
            FetchError
        })
    }
}

///skips the network and runs the same search the API would
#[derive(Debug, Clone)]
pub struct StoreFetcher<S> {
    store: S,
}

impl<S: StudentStore> StoreFetcher<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: StudentStore> FetchPage for StoreFetcher<S> {
    async fn fetch(&self, query: &ListQuery) -> Result<Page<Student>, FetchError> {
        search_students(&self.store, RawListParams::from(query))
            .await
            .map_err(|e| {
                warn!(error = ?e, %query, "Unable to search students");
                FetchError
            })
    }
}

#[derive(Debug, Clone)]
pub enum PageFetcher {
    Http(HttpFetcher),
    Store(StoreFetcher<PgStudentStore>),
}

impl FetchPage for PageFetcher {
    async fn fetch(&self, query: &ListQuery) -> Result<Page<Student>, FetchError> {
        match self {
            Self::Http(http) => http.fetch(query).await,
            Self::Store(store) => store.fetch(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStudentStore;
    use axum::{Json, Router, extract::Query, routing::get};
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    async fn serve(store: MemoryStudentStore) -> String {
        let app = Router::new().route(
            "/api/students",
            get(move |Query(params): Query<RawListParams>| {
                let store = store.clone();
                async move { search_students(&store, params).await.map(Json) }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    #[test]
    fn url_leaves_out_defaults() {
        let fetcher = HttpFetcher::new("http://localhost:8080").unwrap();
        assert_eq!(
            fetcher.url_for(&ListQuery::default()),
            "http://localhost:8080/api/students"
        );
        assert_eq!(
            fetcher.url_for(&ListQuery::new("ann", 2, 10)),
            "http://localhost:8080/api/students?search=ann&page=2"
        );
    }

    #[tokio::test]
    async fn http_round_trip() {
        let base = serve(MemoryStudentStore::with_names(&["Anna", "Bob", "Hannah"])).await;
        let fetcher = HttpFetcher::new(base).unwrap();

        let page = fetcher.fetch(&ListQuery::new("ann", 1, 10)).await.unwrap();
        let names: Vec<_> = page.data.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, ["Anna", "Hannah"]);
        assert_eq!(page.pagination.total_items, 2);
    }

    #[tokio::test]
    async fn http_error_status_is_generic() {
        let store = MemoryStudentStore::with_names(&["Anna"]);
        store.set_broken(true);
        let fetcher = HttpFetcher::new(serve(store).await).unwrap();

        let err = fetcher.fetch(&ListQuery::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch students");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(format!("http://{addr}")).unwrap();
        assert_eq!(fetcher.fetch(&ListQuery::default()).await, Err(FetchError));
    }

    #[tokio::test]
    async fn store_fetcher_paginates() {
        let names: Vec<String> = (1..=15).map(|i| format!("Student {i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let fetcher = StoreFetcher::new(MemoryStudentStore::with_names(&names));

        let page = fetcher.fetch(&ListQuery::new("", 2, 10)).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.pagination.total_pages, 2);
    }
}
