//! Aggregation pipeline: raw GitHub documents in, ranked and bucketed tables out.
//!
//! Every transform here is pure and total. Raw responses are `serde_json::Value` documents;
//! each is first mapped into a typed record by an explicit function that supplies a default
//! for every optional field, then aggregated.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Author name used when a commit or contributor carries no identity.
pub const UNKNOWN: &str = "Unknown";

/// How many contributors the ranking keeps.
pub const TOP_CONTRIBUTORS: usize = 10;

/// Repository metadata shown as labeled key/value pairs.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RepositorySummary {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl RepositorySummary {
    pub fn from_document(doc: &Value) -> Self {
        Self {
            name: str_field(doc, "name"),
            full_name: str_field(doc, "full_name"),
            description: str_field(doc, "description"),
            stars: count_field(doc, "stargazers_count"),
            forks: count_field(doc, "forks_count"),
            watchers: count_field(doc, "watchers_count"),
            open_issues: count_field(doc, "open_issues_count"),
            language: str_field(doc, "language"),
            created_at: str_field(doc, "created_at"),
            updated_at: str_field(doc, "updated_at"),
        }
    }

    /// The summary as display rows, in the order the dashboard lists them.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        [
            ("Repository Name", text(&self.name)),
            ("Full Name", text(&self.full_name)),
            ("Description", text(&self.description)),
            ("Stars", self.stars.to_string()),
            ("Forks", self.forks.to_string()),
            ("Watchers", self.watchers.to_string()),
            ("Open Issues", self.open_issues.to_string()),
            ("Primary Language", text(&self.language)),
            ("Created At", text(&self.created_at)),
            ("Last Updated", text(&self.updated_at)),
        ]
        .into_iter()
        .map(|(label, value)| SummaryRow { label, value })
        .collect()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// Repository metadata as sent to the dashboard: the raw fields plus their labeled rows.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RepositoryInfo {
    #[serde(flatten)]
    pub summary: RepositorySummary,
    pub rows: Vec<SummaryRow>,
}

impl From<RepositorySummary> for RepositoryInfo {
    fn from(summary: RepositorySummary) -> Self {
        Self {
            rows: summary.rows(),
            summary,
        }
    }
}

/// A single commit, reduced to what the activity charts need.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub author_name: String,
    pub commit_timestamp: DateTime<Utc>,
    pub message: String,
}

impl CommitRecord {
    /// Maps a raw commit. Returns `None` when no usable timestamp is present.
    pub fn from_document(doc: &Value) -> Option<Self> {
        let commit = doc.get("commit");
        let author = commit.and_then(|c| c.get("author")).filter(|a| !a.is_null());

        let date = author
            .and_then(|a| a.get("date"))
            .or_else(|| commit?.get("committer")?.get("date"))
            .and_then(Value::as_str)?;

        Some(Self {
            author_name: author
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string(),
            commit_timestamp: parse_timestamp(date)?,
            message: commit
                .and_then(|c| c.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    pub fn year(&self) -> i32 {
        self.commit_timestamp.year()
    }

    pub fn month(&self) -> u32 {
        self.commit_timestamp.month()
    }

    pub fn iso_week(&self) -> u32 {
        self.commit_timestamp.iso_week().week()
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Commit count for one calendar period.
///
/// Charts label points by `period` alone, so the same month or week number from two
/// different years lands on the same label. `year` is kept so consumers can tell them apart.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PeriodCount {
    pub year: i32,
    pub period: u32,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    pub author_name: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CommitActivity {
    pub total_commits: usize,
    pub monthly: Vec<PeriodCount>,
    pub weekly: Vec<PeriodCount>,
    pub authors: Vec<AuthorCount>,
}

/// Buckets commits by `(year, month)` and by `(year, ISO week)`.
pub fn aggregate_commits(raw: &[Value]) -> CommitActivity {
    let records: Vec<CommitRecord> = raw.iter().filter_map(CommitRecord::from_document).collect();

    if records.len() < raw.len() {
        tracing::debug!(
            dropped = raw.len() - records.len(),
            "Skipped commits without a usable timestamp"
        );
    }

    CommitActivity {
        total_commits: records.len(),
        monthly: bucket(&records, CommitRecord::month),
        weekly: bucket(&records, CommitRecord::iso_week),
        authors: rank_by_count(records.iter().map(|r| r.author_name.as_str()))
            .into_iter()
            .map(|(author_name, count)| AuthorCount {
                author_name: author_name.to_string(),
                count,
            })
            .collect(),
    }
}

/// Groups by `(calendar year, period)`.
///
/// For ISO weeks this pairs the calendar year with the ISO week number, so the first days
/// of January can share a bucket with the last days of December of the same year (both
/// `(2024, 1)` for 2024-01-02 and 2024-12-31). That is a different effect from charts
/// labelling points by bare period number.
fn bucket(records: &[CommitRecord], period: fn(&CommitRecord) -> u32) -> Vec<PeriodCount> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for record in records {
        *counts.entry((record.year(), period(record))).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year, period), count)| PeriodCount {
            year,
            period,
            count,
        })
        .collect()
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ContributorRecord {
    pub user_name: String,
    pub contribution_count: u64,
    pub contribution_percentage: f64,
}

/// Ranks contributors by commit count and keeps the top ten.
///
/// Percentages are relative to every fetched contributor, not just the ones kept.
pub fn aggregate_contributors(raw: &[Value]) -> Vec<ContributorRecord> {
    let pairs: Vec<(String, u64)> = raw
        .iter()
        .map(|doc| {
            (
                str_field(doc, "login").unwrap_or_else(|| UNKNOWN.to_string()),
                count_field(doc, "contributions"),
            )
        })
        .collect();
    let total: u64 = pairs.iter().map(|(_, count)| count).sum();

    let mut records: Vec<ContributorRecord> = pairs
        .into_iter()
        .map(|(user_name, contribution_count)| ContributorRecord {
            contribution_percentage: percentage(contribution_count, total),
            user_name,
            contribution_count,
        })
        .collect();

    // `sort_by` is stable, so equal counts keep API order.
    records.sort_by(|a, b| b.contribution_count.cmp(&a.contribution_count));
    records.truncate(TOP_CONTRIBUTORS);
    records
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LanguageRecord {
    pub language_name: String,
    pub byte_count: u64,
    pub percentage: f64,
}

/// Converts a language→bytes mapping into percentage shares, largest first.
pub fn aggregate_languages(raw: &Value) -> Vec<LanguageRecord> {
    let Some(map) = raw.as_object() else {
        return Vec::new();
    };
    let total: u64 = map.values().map(|v| v.as_u64().unwrap_or(0)).sum();

    let mut records: Vec<LanguageRecord> = map
        .iter()
        .map(|(language, bytes)| {
            let byte_count = bytes.as_u64().unwrap_or(0);
            LanguageRecord {
                language_name: language.clone(),
                byte_count,
                percentage: percentage(byte_count, total),
            }
        })
        .collect();

    records.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    records
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StateCount {
    pub state: String,
    pub count: usize,
}

/// Per-state counts for pull requests or issues.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StateBreakdown {
    /// Every record fetched, including any without a `state`.
    pub total: usize,
    /// Most common state first.
    pub states: Vec<StateCount>,
}

impl StateBreakdown {
    #[cfg(test)]
    pub fn count_of(&self, state: &str) -> usize {
        self.states
            .iter()
            .find(|s| s.state == state)
            .map_or(0, |s| s.count)
    }
}

pub fn aggregate_pull_requests(raw: &[Value]) -> StateBreakdown {
    count_states(raw.iter())
}

/// Like [`aggregate_pull_requests`], after dropping anything the issues endpoint marks as
/// a pull request.
pub fn aggregate_issues(raw: &[Value]) -> StateBreakdown {
    count_states(raw.iter().filter(|doc| !is_pull_request(doc)))
}

/// The issues endpoint tags pull requests with a `pull_request` key, whatever its value.
pub fn is_pull_request(doc: &Value) -> bool {
    doc.get("pull_request").is_some()
}

fn count_states<'a>(docs: impl Iterator<Item = &'a Value>) -> StateBreakdown {
    let mut total = 0;
    let states = rank_by_count(docs.filter_map(|doc| {
        total += 1;
        doc.get("state").and_then(Value::as_str)
    }));

    StateBreakdown {
        total,
        states: states
            .into_iter()
            .map(|(state, count)| StateCount {
                state: state.to_string(),
                count,
            })
            .collect(),
    }
}

/// Counts occurrences, most frequent first, ties in first-seen order.
fn rank_by_count<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// `part / total × 100`, or `0.0` when there is nothing to divide by.
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

fn str_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn count_field(doc: &Value, key: &str) -> u64 {
    doc.get(key).and_then(Value::as_u64).unwrap_or(0)
}
