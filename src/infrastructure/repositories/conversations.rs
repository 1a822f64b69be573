use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Conversation, ConversationSummary, Project};
use crate::infrastructure::traits::{ConversationRepository, RepoResult};
use async_trait::async_trait;
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(ConversationRepository)]
pub struct DbConversationRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbConversationRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbConversationRepository { connection }
    }
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn find_project(&self, project_id: Uuid) -> RepoResult<Option<Project>> {
        sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&**self.connection)
            .await
    }

    async fn get_or_create_conversation(
        &self,
        conversation: Conversation,
    ) -> RepoResult<Conversation> {
        // The unique index on project_id makes concurrent callers converge on one row.
        sqlx::query(
            "INSERT INTO conversations (id, project_id, created_at, updated_at) VALUES (?, ?, ?, ?) ON CONFLICT (project_id) DO NOTHING",
        )
        .bind(conversation.id)
        .bind(conversation.project_id)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&**self.connection)
        .await?;

        sqlx::query_as("SELECT * FROM conversations WHERE project_id = ?")
            .bind(conversation.project_id)
            .fetch_one(&**self.connection)
            .await
    }

    async fn list_conversations(
        &self,
        viewer_id: Uuid,
        client_scope: Option<Uuid>,
    ) -> RepoResult<Vec<ConversationSummary>> {
        sqlx::query_as(
            r#"SELECT conversations.id, conversations.project_id, projects.name AS project_name,
                projects.client_id, users.name AS client_name,
                conversations.created_at, conversations.updated_at,
                (SELECT body FROM messages WHERE messages.conversation_id = conversations.id ORDER BY seq DESC LIMIT 1) AS last_message_body,
                (SELECT created_at FROM messages WHERE messages.conversation_id = conversations.id ORDER BY seq DESC LIMIT 1) AS last_message_at,
                (SELECT COUNT(*) FROM messages
                    WHERE messages.conversation_id = conversations.id
                    AND messages.author_id <> ?
                    AND messages.seq > COALESCE((SELECT last_read_seq FROM conversation_reads
                        WHERE conversation_reads.conversation_id = conversations.id AND conversation_reads.user_id = ?), 0)
                ) AS unread_count
            FROM conversations
            INNER JOIN projects ON projects.id = conversations.project_id
            INNER JOIN users ON users.id = projects.client_id
            WHERE (? IS NULL OR projects.client_id = ?)
            ORDER BY conversations.updated_at DESC, conversations.created_at DESC"#,
        )
        .bind(viewer_id)
        .bind(viewer_id)
        .bind(client_scope)
        .bind(client_scope)
        .fetch_all(&**self.connection)
        .await
    }

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
        client_scope: Option<Uuid>,
    ) -> RepoResult<Option<Conversation>> {
        sqlx::query_as(
            "SELECT conversations.id, conversations.project_id, conversations.created_at, conversations.updated_at FROM conversations INNER JOIN projects ON projects.id = conversations.project_id WHERE conversations.id = ? AND (? IS NULL OR projects.client_id = ?)",
        )
        .bind(conversation_id)
        .bind(client_scope)
        .bind(client_scope)
        .fetch_optional(&**self.connection)
        .await
    }
}
