use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::ContentRevalidation;
use crate::infrastructure::traits::{ContentRepository, RepoResult};
use async_trait::async_trait;
use di::{Ref, injectable};

#[injectable(ContentRepository)]
pub struct DbContentRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbContentRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbContentRepository { connection }
    }
}

#[async_trait]
impl ContentRepository for DbContentRepository {
    async fn record_revalidation(
        &self,
        revalidation: ContentRevalidation,
    ) -> RepoResult<ContentRevalidation> {
        sqlx::query_as(
            "INSERT INTO content_revalidations (id, document_type, slug, received_at) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(revalidation.id)
        .bind(revalidation.document_type)
        .bind(revalidation.slug)
        .bind(revalidation.received_at)
        .fetch_one(&**self.connection)
        .await
    }
}
