use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use serde::Serialize;
use snafu::Snafu;
use std::{num::ParseIntError, path::PathBuf};

pub type ClassboardResult<T> = Result<T, ClassboardError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClassboardError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error commiting SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse `{}` as a number of seconds", name))]
    ParseSeconds {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to convert {} to a `jiff::Timestamp`", original))]
    InvalidTimestamp {
        source: jiff::Error,
        original: time::OffsetDateTime,
    },
    #[snafu(display("Error building HTTP client"))]
    BuildHttpClient { source: reqwest::Error },
    #[snafu(display("Error with S3 Credentials"))]
    S3Creds {
        source: s3::creds::error::CredentialsError,
    },
    #[snafu(display("Error with S3"))]
    S3 { source: s3::error::S3Error },
    #[snafu(display("Unable to find object {:?} in bucket", key))]
    MissingObject { key: String },
    #[snafu(display("Object {:?} was not valid UTF-8", key))]
    ObjectNotUtf8 {
        source: std::string::FromUtf8Error,
        key: String,
    },
    #[snafu(display("Unable to write object to {:?}", path))]
    WriteObject {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl IntoResponse for ClassboardError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found

        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Classboard Error "}
                    span {(desc)}
                }
            }
        };

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::CommitTransaction { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParsePort { .. } | Self::ParseSeconds { .. } => ISE,
            Self::InvalidTimestamp { .. } => ISE,
            Self::BuildHttpClient { .. } => ISE,
            Self::S3Creds { .. } | Self::S3 { .. } => ISE,
            Self::MissingObject { .. } => NF,
            Self::ObjectNotUtf8 { .. } => ISE,
            Self::WriteObject { .. } => ISE,
        };

        error!(?self, "Error!");
        (status_code, Html(basic_error(self.to_string()))).into_response()
    }
}

///errors from the JSON API - only the display message ever reaches the caller
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("Method not allowed"))]
    MethodNotAllowed,
    #[snafu(display("Invalid page number"))]
    InvalidPage,
    #[snafu(display("Invalid limit (must be 1-100)"))]
    InvalidLimit,
    ///the query string couldn't even be split into parameters, eg. a repeated key
    #[snafu(display("Invalid query string"))]
    InvalidQuery {
        source: axum::extract::rejection::QueryRejection,
    },
    #[snafu(display("Internal server error"))]
    Storage { source: ClassboardError },
}

#[derive(Serialize, Debug)]
pub struct ApiErrorBody {
    pub error: String,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidPage | Self::InvalidLimit | Self::InvalidQuery { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage { source } => error!(?source, "Storage error serving API request"),
            _ => debug!(error = %self, "Rejected API request"),
        }

        (
            self.status_code(),
            Json(ApiErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
