//! Everything the dashboard table shows that isn't straight off the record.

use crate::data::{page::Pagination, student::Student};
use jiff::Timestamp;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProgressBand {
    Good,
    Warning,
    Critical,
    NoData,
}

impl ProgressBand {
    ///no progress at all is its own band, never "critical"
    pub const fn for_progress(progress: Option<i16>) -> Self {
        match progress {
            Some(70..) => Self::Good,
            Some(30..=69) => Self::Warning,
            Some(1..=29) => Self::Critical,
            _ => Self::NoData,
        }
    }

    pub const fn colour(self) -> &'static str {
        match self {
            Self::Good => "#10b981",
            Self::Warning => "#f59e0b",
            Self::Critical => "#f9663a",
            Self::NoData => "#E4E4E4",
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

pub fn relative_time(last_activity: Option<Timestamp>, now: Timestamp) -> String {
    let Some(last_activity) = last_activity else {
        return "No activity".to_string();
    };

    let seconds = now.duration_since(last_activity).as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else {
        plural(days, "day")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRow {
    pub name: String,
    pub company: String,
    pub course: String,
    pub progress: Option<i16>,
    pub band: ProgressBand,
    pub last_activity: String,
}

impl StudentRow {
    pub fn new(student: &Student, now: Timestamp) -> Self {
        let primary = student.primary_enrollment();
        let progress = primary.map(|enrollment| enrollment.progress_percent);

        Self {
            name: student.full_name.clone(),
            company: student
                .company
                .as_ref()
                .map_or_else(|| "No Company".to_string(), |company| company.name.clone()),
            course: primary.map_or_else(|| "-".to_string(), |e| e.course.title.clone()),
            progress,
            band: ProgressBand::for_progress(progress),
            last_activity: relative_time(student.last_activity_at, now),
        }
    }

    pub fn progress_label(&self) -> String {
        self.progress
            .map_or_else(|| "-".to_string(), |progress| format!("{progress}%"))
    }

    ///bar width, clamped so bad data can't overflow the track
    pub fn progress_width(&self) -> i16 {
        self.progress.unwrap_or(0).clamp(0, 100)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PageLink {
    Number(u64),
    Ellipsis,
}

///the numbered links under the table: first three pages, a window around the current one, and
///the last page, with ellipses wherever pages get skipped
pub fn page_numbers(current: u64, total: u64) -> Vec<PageLink> {
    const MAX_VISIBLE_PAGES: u64 = 4;

    if total <= 1 {
        return vec![];
    }
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageLink::Number).collect();
    }

    let mut pages: Vec<u64> = vec![1, 2, 3];
    pages.extend(current.saturating_sub(1).max(4)..=(current + 1).min(total - 1));
    pages.push(total);
    pages.sort_unstable();
    pages.dedup();

    let mut links = Vec::with_capacity(pages.len() + 2);
    let mut previous = 0;
    for page in pages {
        match page - previous {
            1 => {}
            //an ellipsis standing in for a single page is just silly
            2 => links.push(PageLink::Number(previous + 1)),
            _ => links.push(PageLink::Ellipsis),
        }
        links.push(PageLink::Number(page));
        previous = page;
    }

    links
}

pub fn result_summary(pagination: &Pagination) -> String {
    format!(
        "Showing {} to {} of {} students",
        pagination.first_item(),
        pagination.last_item(),
        pagination.total_items
    )
}

pub fn search_banner(search: &str, total_items: u64) -> String {
    match total_items {
        0 => format!("No students found matching \"{search}\""),
        1 => format!("Found 1 student matching \"{search}\""),
        n => format!("Found {n} students matching \"{search}\""),
    }
}
