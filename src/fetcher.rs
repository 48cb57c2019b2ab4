use crate::github::{FetchError, GitHubClient};
use crate::identity::RepositoryIdentity;
use crate::metrics::{self, RepositoryInfo, RepositorySummary};
use crate::report::{Charted, RepoReport, Section};

/// Fetches every section for a repository and aggregates it into a report.
///
/// Calls run one after another. A section whose call fails is reported as an error in
/// place; the remaining sections are still fetched.
pub async fn fetch_report(client: &GitHubClient, repo: &RepositoryIdentity) -> RepoReport {
    let info = section(
        repo,
        "info",
        client
            .repository(repo)
            .await
            .map(|doc| RepositoryInfo::from(RepositorySummary::from_document(&doc))),
    );

    let commits = section(
        repo,
        "commits",
        client
            .commits(repo)
            .await
            .map(|raw| metrics::aggregate_commits(&raw)),
    );

    let contributors = section(
        repo,
        "contributors",
        client
            .contributors(repo)
            .await
            .map(|raw| metrics::aggregate_contributors(&raw)),
    );

    let languages = section(
        repo,
        "languages",
        client
            .languages(repo)
            .await
            .map(|raw| metrics::aggregate_languages(&raw)),
    );

    let pull_requests = section(
        repo,
        "pull_requests",
        client
            .pull_requests(repo)
            .await
            .map(|raw| metrics::aggregate_pull_requests(&raw)),
    );

    let issues = section(
        repo,
        "issues",
        client
            .issues(repo)
            .await
            .map(|raw| metrics::aggregate_issues(&raw)),
    );

    let report = RepoReport {
        repository: repo.clone(),
        info,
        commits,
        contributors,
        languages,
        pull_requests,
        issues,
    };

    tracing::info!(
        repo = %repo,
        failed_sections = report.failed_sections(),
        "Report assembled"
    );

    report
}

fn section<T: Charted>(
    repo: &RepositoryIdentity,
    name: &'static str,
    result: Result<T, FetchError>,
) -> Section<T> {
    if let Err(e) = &result {
        tracing::warn!(repo = %repo, section = name, "Failed to fetch section: {}", e);
    }
    Section::from_result(result)
}
