use super::Client;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

impl Client {
    pub async fn get_project(&self, id: u64) -> Result<Project> {
        self.http_client.get(format!("/api/v4/projects/{id}"))
            .await
    }
}
