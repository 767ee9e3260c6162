use crate::{
    config::{dashboard::DashboardConfig, s3::S3Config},
    error::{BadEnvVarSnafu, ClassboardResult, ParsePortSnafu},
};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

pub mod dashboard;
pub mod s3;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    dashboard_config: Arc<DashboardConfig>,
    s3_config: Option<Arc<S3Config>>,
}

impl RuntimeConfiguration {
    pub fn new() -> ClassboardResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            dashboard_config: Arc::new(DashboardConfig::new()?),
            s3_config: S3Config::new()?.map(Arc::new),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn dashboard_config(&self) -> Arc<DashboardConfig> {
        self.dashboard_config.clone()
    }

    pub fn s3_config(&self) -> Option<Arc<S3Config>> {
        self.s3_config.clone()
    }

    #[cfg(test)]
    pub fn for_tests(db_config: DbConfig, dashboard_config: DashboardConfig) -> Self {
        Self {
            db_config: Arc::new(db_config),
            dashboard_config: Arc::new(dashboard_config),
            s3_config: None,
        }
    }
}

///reads an env var that has to be there
pub fn required_var(name: &'static str) -> ClassboardResult<String> {
    var(name).context(BadEnvVarSnafu { name })
}

///reads an env var that can be missing or empty
pub fn optional_var(name: &'static str) -> Option<String> {
    var(name).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> ClassboardResult<Self> {
        Ok(Self {
            user: required_var("DB_USER")?,
            password: SecretString::from(required_var("DB_PASSWORD")?),
            path: required_var("DB_PATH")?,
            port: required_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: required_var("DB_NAME")?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(port: u16) -> Self {
        Self {
            user: "classboard".into(),
            password: SecretString::from("classboard"),
            path: "127.0.0.1".into(),
            port,
            database: "classboard".into(),
        }
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
