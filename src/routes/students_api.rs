use crate::{
    data::{
        StudentStore,
        page::{Page, PageRequest, Pagination, RawListParams},
        student::Student,
    },
    error::{ApiError, InvalidQuerySnafu, StorageSnafu},
    state::ClassboardState,
};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use snafu::ResultExt;

///validate, then read the page and its count in one go
pub async fn search_students<S: StudentStore>(
    store: &S,
    params: RawListParams,
) -> Result<Page<Student>, ApiError> {
    let request = PageRequest::parse(params)?;
    let (data, total_items) = store.find_page(&request).await.context(StorageSnafu)?;

    Ok(Page {
        data,
        pagination: Pagination::new(request.page, request.limit, total_items),
    })
}

pub async fn get_students(
    State(state): State<ClassboardState>,
    params: Result<Query<RawListParams>, QueryRejection>,
) -> Result<Json<Page<Student>>, ApiError> {
    let Query(params) = params.context(InvalidQuerySnafu)?;
    search_students(state.students(), params).await.map(Json)
}

pub async fn api_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
