//! The per-query report handed to the dashboard.
//!
//! Each section carries either its finished table plus the charts to draw from it, or the
//! error that prevented it. A failed section never hides the others.

use crate::github::FetchError;
use crate::identity::RepositoryIdentity;
use crate::metrics::{
    CommitActivity, ContributorRecord, LanguageRecord, RepositoryInfo, StateBreakdown,
};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Table,
    KeyValue,
}

/// Which charts the dashboard draws for a table. Empty tables draw nothing.
pub trait Charted {
    fn charts(&self) -> Vec<ChartKind>;
}

impl Charted for RepositoryInfo {
    fn charts(&self) -> Vec<ChartKind> {
        vec![ChartKind::KeyValue]
    }
}

impl Charted for CommitActivity {
    fn charts(&self) -> Vec<ChartKind> {
        if self.total_commits == 0 {
            return Vec::new();
        }
        // Monthly and weekly series.
        vec![ChartKind::Line, ChartKind::Line]
    }
}

impl Charted for Vec<ContributorRecord> {
    fn charts(&self) -> Vec<ChartKind> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![ChartKind::Bar]
    }
}

impl Charted for Vec<LanguageRecord> {
    fn charts(&self) -> Vec<ChartKind> {
        if self.is_empty() {
            return Vec::new();
        }
        vec![ChartKind::Table, ChartKind::Bar]
    }
}

impl Charted for StateBreakdown {
    fn charts(&self) -> Vec<ChartKind> {
        if self.states.is_empty() {
            return Vec::new();
        }
        vec![ChartKind::Bar]
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionErrorKind {
    Transport,
    Status,
    Decode,
    InvalidRequest,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SectionError {
    pub kind: SectionErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
}

impl From<&FetchError> for SectionError {
    fn from(err: &FetchError) -> Self {
        let kind = match err {
            FetchError::Transport(_) => SectionErrorKind::Transport,
            FetchError::Status { .. } => SectionErrorKind::Status,
            FetchError::Decode(_) => SectionErrorKind::Decode,
            FetchError::InvalidRequest(_) => SectionErrorKind::InvalidRequest,
        };
        Self {
            kind,
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ok { charts: Vec<ChartKind>, data: T },
    Error { error: SectionError },
}

impl<T: Charted> Section<T> {
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Section::Ok {
                charts: data.charts(),
                data,
            },
            Err(err) => Section::Error {
                error: SectionError::from(&err),
            },
        }
    }
}

impl<T> Section<T> {
    #[cfg(test)]
    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ok { data, .. } => Some(data),
            Section::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&SectionError> {
        match self {
            Section::Ok { .. } => None,
            Section::Error { error } => Some(error),
        }
    }
}

/// Everything the dashboard renders for one repository.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RepoReport {
    pub repository: RepositoryIdentity,
    pub info: Section<RepositoryInfo>,
    pub commits: Section<CommitActivity>,
    pub contributors: Section<Vec<ContributorRecord>>,
    pub languages: Section<Vec<LanguageRecord>>,
    pub pull_requests: Section<StateBreakdown>,
    pub issues: Section<StateBreakdown>,
}

impl RepoReport {
    /// Number of sections that could not be produced.
    pub fn failed_sections(&self) -> usize {
        [
            self.info.error().is_some(),
            self.commits.error().is_some(),
            self.contributors.error().is_some(),
            self.languages.error().is_some(),
            self.pull_requests.error().is_some(),
            self.issues.error().is_some(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StateCount;

    #[test]
    fn test_ok_section_contract() {
        let section = Section::from_result(Ok(StateBreakdown {
            total: 1,
            states: vec![StateCount {
                state: "open".to_string(),
                count: 1,
            }],
        }));

        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["charts"][0], "bar");
        assert_eq!(json["data"]["total"], 1);
        assert_eq!(json["data"]["states"][0]["state"], "open");
    }

    #[test]
    fn test_empty_table_has_no_charts() {
        let section = Section::from_result(Ok(StateBreakdown {
            total: 0,
            states: vec![],
        }));

        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["charts"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["data"]["total"], 0);
    }

    #[test]
    fn test_status_error_section_contract() {
        let section: Section<RepositoryInfo> =
            Section::from_result(Err(FetchError::Status { status: 404 }));

        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "status");
        assert_eq!(json["error"]["code"], 404);
        assert!(json["error"]["message"].as_str().unwrap().contains("404"));
    }

    #[test]
    fn test_transport_error_has_no_code() {
        let section: Section<Vec<LanguageRecord>> =
            Section::from_result(Err(FetchError::Transport("connection refused".to_string())));

        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["error"]["kind"], "transport");
        assert!(json["error"].get("code").is_none());
    }

    #[test]
    fn test_invalid_request_is_not_a_transport_error() {
        let section: Section<Vec<LanguageRecord>> = Section::from_result(Err(
            FetchError::InvalidRequest("invalid uri character".to_string()),
        ));

        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["error"]["kind"], "invalid_request");
        assert!(json["error"].get("code").is_none());
    }
}
