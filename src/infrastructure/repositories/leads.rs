use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Lead, LeadNote};
use crate::infrastructure::traits::{LeadFilter, LeadPatch, LeadRepository, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use uuid::Uuid;

const SELECT_LEAD: &str = "SELECT leads.*, users.name AS assigned_to_name FROM leads LEFT JOIN users ON users.id = leads.assigned_to_id";

const FILTER_LEADS: &str = "(? IS NULL OR leads.status = ?) AND (? IS NULL OR leads.created_at >= ?) AND (? IS NULL OR leads.created_at < ?)";

#[injectable(LeadRepository)]
pub struct DbLeadRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbLeadRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbLeadRepository { connection }
    }
}

#[async_trait]
impl LeadRepository for DbLeadRepository {
    async fn create_lead(&self, lead: Lead) -> RepoResult<Lead> {
        sqlx::query_as(
            r#"INSERT INTO leads (id, name, email, phone, company, project_type, message, status, source,
                utm_source, utm_medium, utm_campaign, device_type, assigned_to_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"#,
        )
        .bind(lead.id)
        .bind(lead.name)
        .bind(lead.email)
        .bind(lead.phone)
        .bind(lead.company)
        .bind(lead.project_type)
        .bind(lead.message)
        .bind(lead.status)
        .bind(lead.source)
        .bind(lead.utm_source)
        .bind(lead.utm_medium)
        .bind(lead.utm_campaign)
        .bind(lead.device_type)
        .bind(lead.assigned_to_id)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(&**self.connection)
        .await
    }

    async fn find_lead(&self, lead_id: Uuid) -> RepoResult<Option<Lead>> {
        sqlx::query_as(&format!("{SELECT_LEAD} WHERE leads.id = ?"))
            .bind(lead_id)
            .fetch_optional(&**self.connection)
            .await
    }

    async fn list_leads(&self, filter: LeadFilter, limit: i64, offset: i64) -> RepoResult<Vec<Lead>> {
        let until = filter.range.until();
        sqlx::query_as(&format!(
            "{SELECT_LEAD} WHERE {FILTER_LEADS} ORDER BY leads.created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.range.from)
        .bind(filter.range.from)
        .bind(until)
        .bind(until)
        .bind(limit)
        .bind(offset)
        .fetch_all(&**self.connection)
        .await
    }

    async fn count_leads(&self, filter: LeadFilter) -> RepoResult<i64> {
        let until = filter.range.until();
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM leads WHERE {FILTER_LEADS}"))
            .bind(filter.status)
            .bind(filter.status)
            .bind(filter.range.from)
            .bind(filter.range.from)
            .bind(until)
            .bind(until)
            .fetch_one(&**self.connection)
            .await
    }

    async fn update_lead(
        &self,
        lead_id: Uuid,
        patch: LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Option<Lead>> {
        let updated = sqlx::query(
            r#"UPDATE leads SET
                status = COALESCE(?, status),
                assigned_to_id = CASE WHEN ? THEN ? ELSE assigned_to_id END,
                updated_at = ?
            WHERE id = ?"#,
        )
        .bind(patch.status)
        .bind(patch.assigned_to_id.is_some())
        .bind(patch.assigned_to_id.flatten())
        .bind(updated_at)
        .bind(lead_id)
        .execute(&**self.connection)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_lead(lead_id).await
    }

    async fn list_notes(&self, lead_id: Uuid) -> RepoResult<Vec<LeadNote>> {
        sqlx::query_as(
            "SELECT lead_notes.*, users.name AS author_name FROM lead_notes LEFT JOIN users ON users.id = lead_notes.author_id WHERE lead_notes.lead_id = ? ORDER BY lead_notes.created_at ASC, lead_notes.rowid ASC",
        )
        .bind(lead_id)
        .fetch_all(&**self.connection)
        .await
    }

    async fn create_note(&self, note: LeadNote) -> RepoResult<LeadNote> {
        sqlx::query_as(
            "INSERT INTO lead_notes (id, lead_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(note.id)
        .bind(note.lead_id)
        .bind(note.author_id)
        .bind(note.body)
        .bind(note.created_at)
        .fetch_one(&**self.connection)
        .await
    }
}
