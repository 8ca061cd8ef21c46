use super::Client;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

#[derive(Serialize)]
struct UserQuery<'q> {
    username: &'q str,
}

impl Client {
    pub async fn get_users_by_username(&self, username: &str) -> Result<Vec<User>> {
        self.http_client.get_all("/api/v4/users", &UserQuery { username })
            .await
    }
}
