use super::Client;
use anyhow::Result;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub web_url: Url,
    pub project_id: u64,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub state: State,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[display(fmt="opened")]
    Opened,

    #[display(fmt="merged")]
    Merged,

    #[value(skip)]
    #[display(fmt="closed")]
    Closed,

    #[value(skip)]
    #[display(fmt="locked")]
    Locked,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeRequestQuery {
    pub state: State,
    pub author_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl MergeRequestQuery {
    pub fn new(state: State, author_id: u64) -> Self {
        Self {
            state,
            author_id,
            scope: None,
        }
    }
}

impl Client {
    /// Instance-wide listing. `scope=all` is forced, GitLab would otherwise
    /// only return merge requests created by the token owner.
    pub async fn get_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>> {
        let query = MergeRequestQuery {
            scope: Some(Scope::All),
            ..query.clone()
        };

        self.http_client.get_all("/api/v4/merge_requests", &query).await
    }

    /// `project` is either a numeric id or a `namespace/path` string.
    pub async fn get_project_merge_requests(
        &self,
        project: &str,
        query: &MergeRequestQuery,
    ) -> Result<Vec<MergeRequest>> {
        let url = format!(
            "/api/v4/projects/{}/merge_requests",
            urlencoding::encode(project),
        );

        self.http_client.get_all(url, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_request_is_parsed_from_api_json() {
        let mr: MergeRequest = serde_json::from_str(
            r#"{
                "id": 1001,
                "iid": 7,
                "title": "Add pagination",
                "web_url": "https://gitlab.example.com/group/api/-/merge_requests/7",
                "project_id": 10,
                "created_at": "2024-01-02T10:00:00.000Z",
                "merged_at": null,
                "state": "opened",
                "draft": false
            }"#,
        )
        .unwrap();

        assert_eq!(mr.iid, 7);
        assert_eq!(mr.project_id, 10);
        assert_eq!(mr.state, State::Opened);
        assert!(mr.merged_at.is_none());
    }

    #[test]
    fn query_serializes_state_and_author() {
        let query = MergeRequestQuery::new(State::Merged, 42);

        let value = serde_json::to_value(&query).unwrap();

        assert_eq!(value, serde_json::json!({ "state": "merged", "author_id": 42 }));
    }

    #[test]
    fn only_opened_and_merged_are_selectable() {
        use clap::ValueEnum;

        assert!(State::Opened.to_possible_value().is_some());
        assert!(State::Merged.to_possible_value().is_some());
        assert!(State::Closed.to_possible_value().is_none());
        assert!(State::Locked.to_possible_value().is_none());
    }
}
