use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::Message;
use crate::infrastructure::traits::{MessageRepository, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(MessageRepository)]
pub struct DbMessageRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbMessageRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbMessageRepository { connection }
    }
}

#[async_trait]
impl MessageRepository for DbMessageRepository {
    async fn list_messages(&self, conversation_id: Uuid) -> RepoResult<Vec<Message>> {
        sqlx::query_as(
            "SELECT messages.seq, messages.id, messages.conversation_id, messages.author_id, messages.body, messages.created_at, users.name AS author_name FROM messages LEFT JOIN users ON users.id = messages.author_id WHERE messages.conversation_id = ? ORDER BY messages.created_at ASC, messages.seq ASC",
        )
        .bind(conversation_id)
        .fetch_all(&**self.connection)
        .await
    }

    async fn create_message(&self, message: Message) -> RepoResult<Option<Message>> {
        let mut tx = self.connection.begin().await?;

        let touched = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(message.created_at)
            .bind(message.conversation_id)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let created = sqlx::query_as(
            "INSERT INTO messages (id, conversation_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?) RETURNING seq, id, conversation_id, author_id, body, created_at",
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.author_id)
        .bind(message.body)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn read_cursor(&self, conversation_id: Uuid, user_id: Uuid) -> RepoResult<i64> {
        let cursor: Option<i64> = sqlx::query_scalar(
            "SELECT last_read_seq FROM conversation_reads WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&**self.connection)
        .await?;

        Ok(cursor.unwrap_or(0))
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let mut tx = self.connection.begin().await?;

        // Must stay the first statement: the write lock is taken before any read, so
        // concurrent writers are waited on (busy_timeout) rather than failing the upgrade.
        let previous: i64 = sqlx::query_scalar(
            r#"INSERT INTO conversation_reads (conversation_id, user_id, last_read_seq, read_at) VALUES (?, ?, 0, ?)
            ON CONFLICT (conversation_id, user_id) DO UPDATE SET read_at = excluded.read_at
            RETURNING last_read_seq"#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .bind(read_at)
        .fetch_one(&mut *tx)
        .await?;

        let latest: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq), 0) FROM messages WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_one(&mut *tx)
        .await?;

        let newly_read: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ? AND author_id <> ? AND seq > ? AND seq <= ?",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .bind(previous)
        .bind(latest)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversation_reads SET last_read_seq = MAX(last_read_seq, ?) WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(latest)
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(newly_read as u64)
    }

    async fn count_unread(&self, user_id: Uuid, client_scope: Option<Uuid>) -> RepoResult<i64> {
        sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM messages
            INNER JOIN conversations ON conversations.id = messages.conversation_id
            INNER JOIN projects ON projects.id = conversations.project_id
            LEFT JOIN conversation_reads
                ON conversation_reads.conversation_id = messages.conversation_id
                AND conversation_reads.user_id = ?
            WHERE messages.author_id <> ?
            AND messages.seq > COALESCE(conversation_reads.last_read_seq, 0)
            AND (? IS NULL OR projects.client_id = ?)"#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(client_scope)
        .bind(client_scope)
        .fetch_one(&**self.connection)
        .await
    }
}
