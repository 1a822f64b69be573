use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::User;
use crate::infrastructure::traits::{RepoResult, UserRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbUserRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbUserRepository { connection }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn find_user(&self, user_id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
    }
}
