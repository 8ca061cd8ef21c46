pub mod merge_request;
pub mod project;
pub mod user;

use anyhow::Result;

use self::merge_request::{MergeRequest, MergeRequestQuery};
use self::project::Project;
use self::user::User;

pub struct Client {
    pub http_client: crate::core::client::Client,
}

impl Client {
    pub fn new(config: &crate::core::config::Config) -> Result<Self> {
        Ok(Self {
            http_client: crate::core::client::Client::new(config)?,
        })
    }
}

/// The slice of the GitLab REST API the report pipeline consumes.
#[allow(async_fn_in_trait)]
pub trait Gitlab {
    async fn find_users_by_username(&self, username: &str) -> Result<Vec<User>>;

    /// Lists merge requests globally, or inside `project` when one is given.
    async fn merge_requests(
        &self,
        project: Option<&str>,
        query: &MergeRequestQuery,
    ) -> Result<Vec<MergeRequest>>;

    async fn project(&self, id: u64) -> Result<Project>;
}

impl Gitlab for Client {
    async fn find_users_by_username(&self, username: &str) -> Result<Vec<User>> {
        self.get_users_by_username(username).await
    }

    async fn merge_requests(
        &self,
        project: Option<&str>,
        query: &MergeRequestQuery,
    ) -> Result<Vec<MergeRequest>> {
        match project {
            Some(project) => self.get_project_merge_requests(project, query).await,
            None => self.get_merge_requests(query).await,
        }
    }

    async fn project(&self, id: u64) -> Result<Project> {
        self.get_project(id).await
    }
}
