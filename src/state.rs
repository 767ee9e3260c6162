use crate::{
    blob_store::BlobStore,
    config::RuntimeConfiguration,
    data::student::PgStudentStore,
    error::{ClassboardResult, MigrateSnafu, OpenDatabaseSnafu},
    fetch::{HttpFetcher, PageFetcher, StoreFetcher, cache::QueryCache},
    maud_conveniences::render_nav,
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ClassboardState {
    pool: Pool<Postgres>,
    students: PgStudentStore,
    student_pages: QueryCache<PageFetcher>,
    blob_store: Option<Arc<BlobStore>>,
}

impl ClassboardState {
    pub async fn new(
        options: PgPoolOptions,
        config: RuntimeConfiguration,
    ) -> ClassboardResult<Self> {
        let pool = options
            .connect(&config.db_config().get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        let blob_store = match config.s3_config() {
            Some(s3_config) => {
                info!(bucket = %s3_config.bucket_name, "Blob store configured");
                Some(Arc::new(BlobStore::new(
                    s3_config.bucket()?,
                    s3_config.base_path.clone(),
                )))
            }
            None => None,
        };

        Self::from_pool(pool, &config, blob_store)
    }

    ///builds everything on top of an existing pool, without touching the database
    pub fn from_pool(
        pool: Pool<Postgres>,
        config: &RuntimeConfiguration,
        blob_store: Option<Arc<BlobStore>>,
    ) -> ClassboardResult<Self> {
        let dashboard_config = config.dashboard_config();
        let students = PgStudentStore::new(pool.clone());

        let fetcher = match &dashboard_config.api_base {
            Some(api_base) => {
                info!(%api_base, "Dashboard will fetch students over HTTP");
                PageFetcher::Http(HttpFetcher::new(api_base.clone())?)
            }
            None => PageFetcher::Store(StoreFetcher::new(students.clone())),
        };

        Ok(Self {
            pool,
            students,
            student_pages: QueryCache::new(
                fetcher,
                dashboard_config.stale_after,
                dashboard_config.retain_for,
            ),
            blob_store,
        })
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :), and to allow direct html! usage
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Manager's Dashboard" }
                }
                body class="bg-[#f2f5fa] min-h-screen w-full text-[#1a1a1a]" {
                    (render_nav())
                    (markup)
                }
            }
        }
    }

    pub const fn students(&self) -> &PgStudentStore {
        &self.students
    }

    pub const fn student_pages(&self) -> &QueryCache<PageFetcher> {
        &self.student_pages
    }

    ///no route serves objects, this is for code embedding the library
    pub fn blob_store(&self) -> Option<Arc<BlobStore>> {
        self.blob_store.clone()
    }

    pub async fn sensible_shutdown(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}
