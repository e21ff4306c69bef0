//! Execution history queries and pagination.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::job::{ExecutionRecord, JobStatus};

/// Sort order by timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("invalid sort order '{}', expected asc or desc", other)),
        }
    }
}

/// Filter and window over the execution history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub name: Option<String>,
    pub status: Option<JobStatus>,
    /// Inclusive first day.
    pub start_date: Option<NaiveDate>,
    /// Inclusive last day.
    pub end_date: Option<NaiveDate>,
    pub offset: usize,
    pub limit: usize,
    pub sort: SortOrder,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            name: None,
            status: None,
            start_date: None,
            end_date: None,
            offset: 0,
            limit: 50,
            sort: SortOrder::Desc,
        }
    }
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Lower timestamp bound (inclusive).
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Upper timestamp bound (exclusive): midnight after the end date.
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Whether a record passes the filters (ignores offset and limit).
    pub fn matches(&self, record: &ExecutionRecord) -> bool {
        if let Some(ref name) = self.name {
            if &record.name != name {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(start) = self.start_bound() {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_bound() {
            if record.timestamp >= end {
                return false;
            }
        }
        true
    }
}

/// Pagination metadata for a page of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// Compute metadata for a 1-based `page` of `page_size` rows.
    pub fn new(total_count: usize, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let total_pages = total_count.div_ceil(page_size);
        Self {
            total_count,
            current_page: page,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// A page of history rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub data: Vec<ExecutionRecord>,
    pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(name: &str, status: JobStatus, ts: DateTime<Utc>) -> ExecutionRecord {
        ExecutionRecord {
            name: name.to_string(),
            timestamp: ts,
            status,
            output: String::new(),
        }
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_matches_name_and_status() {
        let ts = Utc::now();
        let query = HistoryQuery::new()
            .with_name("collect")
            .with_status(JobStatus::Ok);
        assert!(query.matches(&record_at("collect", JobStatus::Ok, ts)));
        assert!(!query.matches(&record_at("message", JobStatus::Ok, ts)));
        assert!(!query.matches(&record_at("collect", JobStatus::Failed, ts)));
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let query = HistoryQuery::new().with_date_range(Some(day), Some(day));

        let late = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();

        assert!(query.matches(&record_at("message", JobStatus::Ok, late)));
        assert!(!query.matches(&record_at("message", JobStatus::Ok, next)));
        assert!(!query.matches(&record_at("message", JobStatus::Ok, before)));
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(45, 2, 20);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_previous);

        let last = PageInfo::new(45, 3, 20);
        assert!(!last.has_next);

        let empty = PageInfo::new(0, 1, 20);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_previous);
    }
}
