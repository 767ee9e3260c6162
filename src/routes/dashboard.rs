use crate::{
    data::{
        list_query::{DEFAULT_LIMIT, ListQuery},
        page::Pagination,
    },
    display::{PageLink, StudentRow, page_numbers, result_summary, search_banner},
    fetch::{FetchError, cache::CachedPage},
    maud_conveniences::{error_banner, render_table, spinner, title},
    state::ClassboardState,
};
use axum::extract::{RawQuery, State};
use jiff::Timestamp;
use maud::{Markup, html};

fn query_from(raw: Option<String>) -> ListQuery {
    let mut query = ListQuery::decode(raw.as_deref().unwrap_or_default());
    query.search = query.search.trim().to_string();
    query
}

fn table_url(path: &str, query: &ListQuery) -> String {
    let encoded = query.encode();
    if encoded.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{encoded}")
    }
}

pub async fn get_dashboard(
    State(state): State<ClassboardState>,
    RawQuery(raw): RawQuery,
) -> Markup {
    let query = query_from(raw);

    state.render(html! {
        div class="px-16 py-14" {
            div class="flex flex-col gap-4" {
                (title("Manager's Dashboard"))
                div class="text-base" {"Monitor student progress and engagement across your assigned course"}
            }
            (render_search(&query))
            div id="students_table" hx-get=(table_url("/internal/students_table", &query)) hx-trigger="load" hx-swap="outerHTML" {
                div class="bg-white p-8 flex items-center justify-center space-x-2 text-gray-600" {
                    (spinner())
                    p {"Loading students..."}
                }
            }
        }
    })
}

fn render_search(query: &ListQuery) -> Markup {
    let cleared = query.with_search("");

    html! {
        form method="get" action="/" class="w-full max-w-[528px] pb-7 pt-6" {
            div class="flex items-center bg-[#f2f5fa] rounded-xl border border-[#b9b9b9] overflow-hidden" {
                input type="text" name="search" value=(query.search) placeholder="search students by name"
                    class="flex-1 border-0 bg-transparent px-3 py-4 text-base focus:outline-none" {}
                @if query.limit != DEFAULT_LIMIT {
                    input type="hidden" name="limit" value=(query.limit) {}
                }
                @if !query.search.is_empty() {
                    a href=(cleared.to_href()) class="text-[#9d9d9d] hover:text-[#1a1a1a] px-2" title="Clear search" {"✕"}
                }
                button type="submit" class="bg-[#f9663a] hover:bg-[#e55a35] text-white rounded-xl px-8 py-4 m-1 font-medium" {"Search"}
            }
        }
    }
}

pub async fn internal_get_students_table(
    State(state): State<ClassboardState>,
    RawQuery(raw): RawQuery,
) -> Markup {
    let query = query_from(raw);
    let result = state.student_pages().get(&query).await;
    render_students_table(&query, result, Timestamp::now())
}

pub async fn internal_post_students_table_retry(
    State(state): State<ClassboardState>,
    RawQuery(raw): RawQuery,
) -> Markup {
    let query = query_from(raw);
    info!(%query, "Manual retry of students table");
    let result = state.student_pages().refetch(&query).await;
    render_students_table(&query, result, Timestamp::now())
}

pub fn render_students_table(
    query: &ListQuery,
    result: Result<CachedPage, FetchError>,
    now: Timestamp,
) -> Markup {
    let reload_url = table_url("/internal/students_table", query);

    let CachedPage {
        page,
        is_refetching,
        error,
    } = match result {
        Ok(cached) => cached,
        Err(e) => {
            return html! {
                div id="students_table" class="bg-white" {
                    (render_fetch_error(query, e))
                }
            };
        }
    };
    //a failed refresh waits for the Retry button rather than polling
    let poll = is_refetching && error.is_none();

    let rows: Vec<[Markup; 6]> = page
        .data
        .iter()
        .map(|student| StudentRow::new(student, now))
        .map(|row| {
            [
                html! {(row.name)},
                html! {(row.company)},
                html! {(row.course)},
                html! {
                    div class="flex items-center justify-center gap-3" {
                        div class="relative w-20 h-2 bg-[#e4e4e4] rounded-full overflow-hidden" {
                            div class="h-full rounded-full" style={"width: " (row.progress_width()) "%; background-color: " (row.band.colour()) ";"} {}
                        }
                        span class="font-medium text-sm w-7" {(row.progress_label())}
                    }
                },
                html! {(row.last_activity)},
                html! {
                    button type="button" class="bg-[#264ac4] hover:bg-[#1e3a9a] text-white rounded-3xl text-sm px-3 py-1" {"Mark Reviewed"}
                },
            ]
        })
        .collect();
    let empty = rows.is_empty();

    html! {
        //while a stale page is being refreshed, poll once more to pick the fresh one up
        div id="students_table" class="bg-white shadow-sm"
            hx-get=[poll.then_some(reload_url.as_str())] hx-trigger=[poll.then_some("load delay:1s")] hx-swap="outerHTML" {
            @if let Some(e) = error {
                (render_fetch_error(query, e))
            }
            @if !query.search.is_empty() {
                div class="p-4 bg-blue-50 border-b flex items-center justify-between text-blue-700" {
                    p {(search_banner(&query.search, page.pagination.total_items))}
                    @if is_refetching {
                        (spinner())
                    }
                }
            }
            (render_table(["Student Name", "Company", "Course", "Progress", "Last Activity", "Action"], rows))
            @if empty {
                p class="py-8 text-center text-gray-500" {
                    @if query.search.is_empty() {
                        "No students found"
                    } @else {
                        "No students found matching \"" (query.search) "\""
                    }
                }
            }
            (render_pagination(query, &page.pagination, is_refetching))
        }
    }
}

fn render_fetch_error(query: &ListQuery, e: FetchError) -> Markup {
    error_banner(
        e.to_string(),
        html! {
            button hx-post=(table_url("/internal/students_table/retry", query)) hx-target="#students_table" hx-swap="outerHTML"
                class="bg-red-600 hover:bg-red-700 text-white text-sm rounded px-3 py-1" {"Retry"}
        },
    )
}

fn render_pagination(
    query: &ListQuery,
    pagination: &Pagination,
    is_refetching: bool,
) -> Markup {
    let links = page_numbers(u64::from(pagination.page), pagination.total_pages);
    if links.is_empty() {
        return html! {};
    }

    let current = pagination.page;
    let has_previous = current > 1;
    let has_next = u64::from(current) < pagination.total_pages;
    let link_class = |active: bool| {
        if active {
            "px-3 py-1 rounded border border-[#264ac4] text-[#264ac4] font-bold"
        } else {
            "px-3 py-1 rounded hover:bg-gray-200"
        }
    };

    html! {
        div class="p-4 border-t bg-gray-50 flex items-center justify-between" {
            div class="text-sm text-gray-600" {
                @if pagination.first_item() > 0 {
                    (result_summary(pagination))
                }
            }
            nav class={"flex items-center gap-1 " (if is_refetching { "opacity-50" } else { "" })} aria-label="pagination" {
                @if has_previous {
                    a href=(query.with_page(current - 1).to_href()) class=(link_class(false)) {"Previous"}
                } @else {
                    span class="px-3 py-1 opacity-50" {"Previous"}
                }
                @for link in links {
                    @match link {
                        PageLink::Number(n) => {
                            a href=(query.with_page(u32::try_from(n).unwrap_or(u32::MAX)).to_href())
                                class=(link_class(n == u64::from(current))) {(n)}
                        },
                        PageLink::Ellipsis => span class="px-2" {"…"},
                    }
                }
                @if has_next {
                    a href=(query.with_page(current + 1).to_href()) class=(link_class(false)) {"Next"}
                } @else {
                    span class="px-3 py-1 opacity-50" {"Next"}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{memory::student, page::Page, student::Student};
    use std::sync::Arc;

    fn now() -> Timestamp {
        "2026-10-17T12:00:00Z".parse().unwrap()
    }

    fn cached(data: Vec<Student>, pagination: Pagination) -> CachedPage {
        CachedPage {
            page: Arc::new(Page { data, pagination }),
            is_refetching: false,
            error: None,
        }
    }

    #[test]
    fn query_from_is_tolerant_and_trims() {
        assert_eq!(
            query_from(Some("search=+ann+&page=zz".into())),
            ListQuery::new("ann", 1, 10)
        );
        assert_eq!(query_from(None), ListQuery::default());
    }

    #[test]
    fn rows_show_derived_fields() {
        let mut anna = student(1, "Anna");
        anna.enrollments[0].progress_percent = 75;
        let mut bob = student(2, "Bob");
        bob.enrollments[0].progress_percent = 25;
        bob.last_activity_at = Some(now());

        let html = render_students_table(
            &ListQuery::default(),
            Ok(cached(vec![anna, bob], Pagination::new(1, 10, 2))),
            now(),
        )
        .into_string();

        assert!(html.contains("No activity"));
        assert!(html.contains("Just now"));
        assert!(html.contains("#10b981"));
        assert!(html.contains("#f9663a"));
        assert!(html.contains("75%"));
        assert!(!html.contains("Retry"));
    }

    #[test]
    fn errors_offer_a_retry() {
        let html = render_students_table(&ListQuery::new("ann", 2, 10), Err(FetchError), now())
            .into_string();

        assert!(html.contains("Failed to fetch students"));
        assert!(html.contains("/internal/students_table/retry?search=ann&amp;page=2"));
    }

    #[test]
    fn empty_search_result_says_so() {
        let html = render_students_table(
            &ListQuery::new("zzz", 1, 10),
            Ok(cached(vec![], Pagination::new(1, 10, 0))),
            now(),
        )
        .into_string();

        assert!(html.contains("No students found matching &quot;zzz&quot;"));
        assert!(!html.contains("Showing"));
    }

    #[test]
    fn pagination_links_keep_the_search() {
        let data = (1..=10).map(|i| student(i, "Ann")).collect();
        let html = render_students_table(
            &ListQuery::new("ann", 1, 10),
            Ok(cached(data, Pagination::new(1, 10, 25))),
            now(),
        )
        .into_string();

        assert!(html.contains("Showing 1 to 10 of 25 students"));
        assert!(html.contains("Found 25 students matching"));
        assert!(html.contains(r#"href="/?search=ann&amp;page=2""#));
        assert!(html.contains(r#"href="/?search=ann&amp;page=3""#));
        assert!(!html.contains("hx-trigger"));
    }

    #[test]
    fn page_past_the_end_has_no_summary() {
        let html = render_students_table(
            &ListQuery::new("", 5, 10),
            Ok(cached(vec![], Pagination::new(5, 10, 15))),
            now(),
        )
        .into_string();

        assert!(html.contains("No students found"));
        assert!(!html.contains("Showing"));
        assert!(html.contains(r#"href="/?page=4""#));
    }

    #[test]
    fn stale_pages_poll_for_the_fresh_one() {
        let mut stale = cached(vec![student(1, "Anna")], Pagination::new(1, 10, 1));
        stale.is_refetching = true;

        let html = render_students_table(&ListQuery::default(), Ok(stale), now()).into_string();
        assert!(html.contains(r#"hx-get="/internal/students_table""#));
        assert!(html.contains("load delay:1s"));
    }

    #[test]
    fn failed_refresh_shows_old_rows_with_a_retry() {
        let mut stale = cached(vec![student(1, "Anna")], Pagination::new(1, 10, 1));
        stale.error = Some(FetchError);

        let html = render_students_table(&ListQuery::new("ann", 1, 10), Ok(stale), now())
            .into_string();
        assert!(html.contains("Failed to fetch students"));
        assert!(html.contains("/internal/students_table/retry?search=ann"));
        assert!(html.contains("Anna"));
        assert!(!html.contains("hx-trigger"));
    }
}
