use crate::{
    data::{StudentStore, page::PageRequest},
    error::{
        ClassboardResult, CommitTransactionSnafu, GetDatabaseConnectionSnafu,
        InvalidTimestampSnafu, MakeQuerySnafu,
    },
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub progress_percent: i16,
    pub course: CourseRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub last_activity_at: Option<Timestamp>,
    pub company: Option<Company>,
    pub current_course: Option<CourseRef>,
    ///always in `position` order
    pub enrollments: Vec<Enrollment>,
}

impl Student {
    pub fn primary_enrollment(&self) -> Option<&Enrollment> {
        self.enrollments.first()
    }
}

#[derive(FromRow)]
struct StudentRow {
    id: Uuid,
    full_name: String,
    last_activity_at: Option<OffsetDateTime>,
    company_name: Option<String>,
    current_course_title: Option<String>,
}

#[derive(FromRow)]
struct EnrollmentRow {
    student_id: Uuid,
    progress_percent: i16,
    course_title: String,
}

///turns user search text into an `ILIKE` pattern that matches it anywhere, literally
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn to_timestamp(odt: OffsetDateTime) -> ClassboardResult<Timestamp> {
    Timestamp::from_nanosecond(odt.unix_timestamp_nanos())
        .context(InvalidTimestampSnafu { original: odt })
}

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    pool: Pool<Postgres>,
}

impl PgStudentStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

impl StudentStore for PgStudentStore {
    async fn find_page(&self, request: &PageRequest) -> ClassboardResult<(Vec<Student>, u64)> {
        let pattern = request.search.as_deref().map(contains_pattern);

        let mut tx = self.pool.begin().await.context(GetDatabaseConnectionSnafu)?;
        //one snapshot for the slice, its enrollments and the count
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .context(MakeQuerySnafu)?;

        let rows: Vec<StudentRow> = sqlx::query_as(
            "SELECT s.id, s.full_name, s.last_activity_at, c.name AS company_name, cc.title AS current_course_title
             FROM public.students s
             LEFT JOIN public.companies c ON c.id = s.company_id
             LEFT JOIN public.courses cc ON cc.id = s.current_course_id
             WHERE ($1::TEXT IS NULL OR s.full_name ILIKE $1 ESCAPE '\\')
             ORDER BY s.id ASC
             OFFSET $2 LIMIT $3",
        )
        .bind(pattern.as_deref())
        .bind(request.offset())
        .bind(i64::from(request.limit))
        .fetch_all(&mut *tx)
        .await
        .context(MakeQuerySnafu)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM public.students s WHERE ($1::TEXT IS NULL OR s.full_name ILIKE $1 ESCAPE '\\')",
        )
        .bind(pattern.as_deref())
        .fetch_one(&mut *tx)
        .await
        .context(MakeQuerySnafu)?;

        let mut enrollments: HashMap<Uuid, Vec<Enrollment>> = HashMap::new();
        if !rows.is_empty() {
            let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
            let enrollment_rows: Vec<EnrollmentRow> = sqlx::query_as(
                "SELECT e.student_id, e.progress_percent, co.title AS course_title
                 FROM public.enrollments e
                 INNER JOIN public.courses co ON co.id = e.course_id
                 WHERE e.student_id = ANY($1)
                 ORDER BY e.student_id, e.position ASC, e.id ASC",
            )
            .bind(ids.as_slice())
            .fetch_all(&mut *tx)
            .await
            .context(MakeQuerySnafu)?;

            for row in enrollment_rows {
                enrollments.entry(row.student_id).or_default().push(Enrollment {
                    progress_percent: row.progress_percent,
                    course: CourseRef {
                        title: row.course_title,
                    },
                });
            }
        }

        tx.commit().await.context(CommitTransactionSnafu)?;

        let students = rows
            .into_iter()
            .map(|row| {
                Ok(Student {
                    id: row.id,
                    full_name: row.full_name,
                    last_activity_at: row.last_activity_at.map(to_timestamp).transpose()?,
                    company: row.company_name.map(|name| Company { name }),
                    current_course: row.current_course_title.map(|title| CourseRef { title }),
                    enrollments: enrollments.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect::<ClassboardResult<Vec<_>>>()?;

        trace!(found = students.len(), total, "Fetched page of students");
        Ok((students, u64::try_from(total).unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pattern_wraps_and_escapes() {
        assert_eq!(contains_pattern("ann"), "%ann%");
        assert_eq!(contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn primary_enrollment_is_the_first() {
        let student = Student {
            id: Uuid::nil(),
            full_name: "Anna".into(),
            last_activity_at: None,
            company: None,
            current_course: None,
            enrollments: vec![
                Enrollment {
                    progress_percent: 40,
                    course: CourseRef {
                        title: "French A1".into(),
                    },
                },
                Enrollment {
                    progress_percent: 90,
                    course: CourseRef {
                        title: "French A2".into(),
                    },
                },
            ],
        };
        assert_eq!(
            student.primary_enrollment().map(|e| e.course.title.as_str()),
            Some("French A1")
        );
    }

    #[test]
    fn timestamps_convert_exactly() {
        let odt = OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap();
        assert_eq!(to_timestamp(odt).unwrap().as_second(), 1_760_000_000);
    }

    #[test]
    fn wire_shape_matches_dashboard_contract() {
        let student = Student {
            id: Uuid::from_u128(1),
            full_name: "Hannah".into(),
            last_activity_at: Some(Timestamp::from_second(0).unwrap()),
            company: Some(Company {
                name: "Acme".into(),
            }),
            current_course: None,
            enrollments: vec![Enrollment {
                progress_percent: 75,
                course: CourseRef {
                    title: "German B1".into(),
                },
            }],
        };

        assert_eq!(
            serde_json::to_value(&student).unwrap(),
            serde_json::json!({
                "id": "00000000-0000-0000-0000-000000000001",
                "fullName": "Hannah",
                "lastActivityAt": "1970-01-01T00:00:00Z",
                "company": {"name": "Acme"},
                "currentCourse": null,
                "enrollments": [{"progressPercent": 75, "course": {"title": "German B1"}}],
            })
        );
    }
}

///runs against a real postgres: `DATABASE_URL=... cargo test -- --ignored`
#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::data::page::RawListParams;
    use pretty_assertions::assert_eq;
    use sqlx::PgPool;

    async fn seed(pool: &PgPool) {
        let acme = Uuid::from_u128(100);
        let french_a1 = Uuid::from_u128(200);
        let french_a2 = Uuid::from_u128(201);

        sqlx::query("INSERT INTO public.companies (id, name) VALUES ($1, 'Acme')")
            .bind(acme)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO public.courses (id, title) VALUES ($1, 'French A1'), ($2, 'French A2')",
        )
        .bind(french_a1)
        .bind(french_a2)
        .execute(pool)
        .await
        .unwrap();

        for (id, name, company) in [
            (1, "Anna", Some(acme)),
            (2, "100% Hannah", None),
            (3, "Bob_x", Some(acme)),
            (4, "Joanne", None),
            (5, "Bobby", None),
        ] {
            sqlx::query(
                "INSERT INTO public.students (id, full_name, company_id, current_course_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::from_u128(id))
            .bind(name)
            .bind(company)
            .bind(french_a1)
            .execute(pool)
            .await
            .unwrap();
        }

        //inserted out of order, so only `position` can put A1 first
        for (id, course, progress, position) in [(10, french_a2, 90_i16, 2), (11, french_a1, 40, 1)] {
            sqlx::query(
                "INSERT INTO public.enrollments (id, student_id, course_id, progress_percent, position) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::from_u128(id))
            .bind(Uuid::from_u128(1))
            .bind(course)
            .bind(progress)
            .bind(position)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    async fn find(pool: &PgPool, search: &str, page: &str, limit: &str) -> (Vec<String>, u64) {
        let request = PageRequest::parse(RawListParams {
            search: Some(search.to_string()),
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
        })
        .unwrap();
        let (students, total) = PgStudentStore::new(pool.clone())
            .find_page(&request)
            .await
            .unwrap();
        (
            students.into_iter().map(|student| student.full_name).collect(),
            total,
        )
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn search_is_a_case_insensitive_substring(pool: PgPool) {
        seed(&pool).await;

        assert_eq!(
            find(&pool, "ANN", "1", "2").await,
            (vec!["Anna".to_string(), "100% Hannah".to_string()], 3)
        );
        assert_eq!(find(&pool, "ann", "2", "2").await, (vec!["Joanne".to_string()], 3));
        assert_eq!(find(&pool, "ann", "3", "2").await, (vec![], 3));
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn wildcards_in_the_search_are_literal(pool: PgPool) {
        seed(&pool).await;

        assert_eq!(find(&pool, "%", "1", "10").await, (vec!["100% Hannah".to_string()], 1));
        assert_eq!(find(&pool, "b_", "1", "10").await, (vec!["Bob_x".to_string()], 1));
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn no_search_lists_everyone_in_id_order(pool: PgPool) {
        seed(&pool).await;

        let (names, total) = find(&pool, "", "1", "10").await;
        assert_eq!(names, ["Anna", "100% Hannah", "Bob_x", "Joanne", "Bobby"]);
        assert_eq!(total, 5);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn records_carry_their_relations(pool: PgPool) {
        seed(&pool).await;

        let request = PageRequest::parse(RawListParams::default()).unwrap();
        let (students, _) = PgStudentStore::new(pool).find_page(&request).await.unwrap();

        let anna = &students[0];
        assert_eq!(anna.company, Some(Company { name: "Acme".into() }));
        assert_eq!(
            anna.current_course,
            Some(CourseRef {
                title: "French A1".into()
            })
        );
        let titles: Vec<_> = anna
            .enrollments
            .iter()
            .map(|e| (e.course.title.as_str(), e.progress_percent))
            .collect();
        assert_eq!(titles, [("French A1", 40_i16), ("French A2", 90_i16)]);
        assert_eq!(anna.last_activity_at, None);

        assert_eq!(students[1].company, None);
        assert!(students[1].enrollments.is_empty());
    }
}
