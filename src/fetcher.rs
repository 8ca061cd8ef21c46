use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::gitlab::merge_request::{MergeRequest, MergeRequestQuery};
use crate::gitlab::user::User;
use crate::gitlab::Gitlab;

/// First user matching `username`, `None` when the lookup comes back empty.
pub async fn resolve_user<G: Gitlab>(api: &G, username: &str) -> Result<Option<User>> {
    let users = api
        .find_users_by_username(username)
        .await
        .with_context(|| format!("Failed to look up user {username}"))?;

    Ok(users.into_iter().next())
}

/// With no `projects`, runs one instance-wide query whose failure is fatal.
/// Otherwise queries each project in the given order, at most `jobs` at a
/// time; a project whose fetch fails contributes nothing.
pub async fn fetch_merge_requests<G: Gitlab>(
    api: &G,
    query: &MergeRequestQuery,
    projects: &[String],
    jobs: usize,
) -> Result<Vec<MergeRequest>> {
    if projects.is_empty() {
        let merge_requests = api
            .merge_requests(None, query)
            .await
            .context("Failed to list merge requests")?;

        info!("Fetched {} merge requests", merge_requests.len());

        return Ok(merge_requests);
    }

    let per_project: Vec<Vec<MergeRequest>> = stream::iter(projects)
        .map(|project| async move {
            match api.merge_requests(Some(project.as_str()), query).await {
                Ok(merge_requests) => {
                    info!("Fetched {} merge requests from project {project}", merge_requests.len());
                    merge_requests
                }
                Err(e) => {
                    error!("Failed to fetch merge requests for project {project}: {e:#}");
                    Vec::new()
                }
            }
        })
        .buffered(jobs.max(1))
        .collect()
        .await;

    Ok(per_project.into_iter().flatten().collect())
}
