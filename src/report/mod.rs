pub mod markdown;
pub mod metrics;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info};
use url::Url;

use crate::fetcher;
use crate::gitlab::merge_request::{MergeRequest, MergeRequestQuery, State};
use crate::gitlab::project::Project;
use crate::gitlab::Gitlab;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What to report on, as collected from the command line.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub username: String,
    pub state: State,
    pub projects: Vec<String>,
    pub since: Option<NaiveDate>,
    pub jobs: usize,
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub iid: u64,
    pub title: String,
    pub web_url: Url,
    pub created: String,
    pub merged: Option<String>,
    pub days_open: i64,
    pub link: String,
}

impl ReportRow {
    pub fn new(mr: &MergeRequest, now: DateTime<Utc>) -> Self {
        Self {
            iid: mr.iid,
            title: mr.title.clone(),
            web_url: mr.web_url.clone(),
            created: mr.created_at.format(DATE_FORMAT).to_string(),
            merged: mr.merged_at.map(|at| at.format(DATE_FORMAT).to_string()),
            days_open: metrics::days_open(mr.created_at, metrics::end_time(mr, now)),
            link: format!("[{}]({})", markdown::escape(&mr.title), mr.web_url),
        }
    }

    /// The date a report for `state` is about: merge date for merged
    /// requests, creation date otherwise.
    pub fn date(&self, state: State) -> &str {
        match (state, &self.merged) {
            (State::Merged, Some(merged)) => merged,
            _ => &self.created,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportGroup {
    pub project: Project,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub username: String,
    pub state: State,
    pub groups: Vec<ReportGroup>,
}

impl Report {
    /// Runs the whole pipeline. `None` means the user does not exist and
    /// nothing else was queried.
    pub async fn generate<G: Gitlab>(
        api: &G,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>> {
        let Some(user) = fetcher::resolve_user(api, &request.username).await? else {
            return Ok(None);
        };

        info!("Resolved {} to user id {}", user.username, user.id);

        let query = MergeRequestQuery::new(request.state, user.id);
        let mut merge_requests =
            fetcher::fetch_merge_requests(api, &query, &request.projects, request.jobs).await?;

        if let (State::Merged, Some(since)) = (request.state, request.since) {
            metrics::retain_merged_since(&mut merge_requests, since);
        }

        let report = Self::build(api, request, merge_requests, now).await;

        info!(
            "Reporting {} merge requests across {} projects",
            report.len(),
            report.groups.len()
        );

        Ok(Some(report))
    }

    /// Groups rows by project in order of first appearance, keeping the
    /// API's order inside each group.
    pub async fn build<G: Gitlab>(
        api: &G,
        request: &ReportRequest,
        merge_requests: Vec<MergeRequest>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_project: IndexMap<u64, Vec<ReportRow>> = IndexMap::new();
        for mr in &merge_requests {
            by_project
                .entry(mr.project_id)
                .or_default()
                .push(ReportRow::new(mr, now));
        }

        let mut projects = lookup_projects(api, by_project.keys().copied(), request.jobs).await;

        let groups = by_project
            .into_iter()
            .filter_map(|(id, rows)| {
                projects.remove(&id).map(|project| ReportGroup { project, rows })
            })
            .collect();

        Self {
            username: request.username.clone(),
            state: request.state,
            groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn empty_message(&self) -> String {
        format!(
            "No {} merge requests found for user {}",
            self.state, self.username
        )
    }
}

/// One lookup per distinct id. Projects whose lookup fails are left out.
async fn lookup_projects<G, I>(api: &G, ids: I, jobs: usize) -> HashMap<u64, Project>
where
    G: Gitlab,
    I: IntoIterator<Item = u64>,
{
    let mut seen = HashSet::new();
    let ids: Vec<u64> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    stream::iter(ids)
        .map(|id| async move { (id, api.project(id).await) })
        .buffered(jobs.max(1))
        .filter_map(|(id, project)| async move {
            match project {
                Ok(project) => {
                    debug!("Project {} is {}", project.id, project.name);
                    Some((id, project))
                }
                Err(e) => {
                    error!("Failed to look up project {id}, dropping its merge requests: {e:#}");
                    None
                }
            }
        })
        .collect()
        .await
}
