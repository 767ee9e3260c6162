//! An in-memory [`StudentStore`] for tests.

use crate::{
    data::{
        StudentStore,
        page::PageRequest,
        student::{Company, CourseRef, Enrollment, Student},
    },
    error::{ClassboardError, ClassboardResult},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct MemoryStudentStore {
    students: Arc<Vec<Student>>,
    broken: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl MemoryStudentStore {
    pub fn new(mut students: Vec<Student>) -> Self {
        students.sort_by_key(|student| student.id);
        Self {
            students: Arc::new(students),
            ..Self::default()
        }
    }

    pub fn with_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| student(i as u128 + 1, name))
                .collect(),
        )
    }

    ///every query fails from now on (or works again)
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

pub fn student(id: u128, name: &str) -> Student {
    Student {
        id: Uuid::from_u128(id),
        full_name: name.to_string(),
        last_activity_at: None,
        company: Some(Company {
            name: "Acme".into(),
        }),
        current_course: None,
        enrollments: vec![Enrollment {
            progress_percent: 50,
            course: CourseRef {
                title: "Spanish A1".into(),
            },
        }],
    }
}

impl StudentStore for MemoryStudentStore {
    async fn find_page(&self, request: &PageRequest) -> ClassboardResult<(Vec<Student>, u64)> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) {
            return Err(ClassboardError::MakeQuery {
                source: sqlx::Error::PoolTimedOut,
            });
        }

        let needle = request.search.as_deref().map(str::to_lowercase);
        let matching: Vec<&Student> = self
            .students
            .iter()
            .filter(|student| {
                needle
                    .as_deref()
                    .is_none_or(|needle| student.full_name.to_lowercase().contains(needle))
            })
            .collect();

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let data = matching
            .iter()
            .skip(offset)
            .take(request.limit as usize)
            .map(|student| (*student).clone())
            .collect();

        Ok((data, matching.len() as u64))
    }
}
