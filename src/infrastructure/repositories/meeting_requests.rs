use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{MeetingRequest, MeetingStatus, TimeSlot};
use crate::infrastructure::traits::{MeetingRequestRepository, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(MeetingRequestRepository)]
pub struct DbMeetingRequestRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbMeetingRequestRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbMeetingRequestRepository { connection }
    }
}

#[async_trait]
impl MeetingRequestRepository for DbMeetingRequestRepository {
    async fn create_meeting_request(&self, request: MeetingRequest) -> RepoResult<MeetingRequest> {
        sqlx::query_as(
            "INSERT INTO meeting_requests (id, client_id, preferred_date, preferred_time_slot, topic, notes, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(request.id)
        .bind(request.client_id)
        .bind(request.preferred_date)
        .bind(request.preferred_time_slot)
        .bind(request.topic)
        .bind(request.notes)
        .bind(request.status)
        .bind(request.created_at)
        .fetch_one(&**self.connection)
        .await
    }

    async fn list_meeting_requests(
        &self,
        client_scope: Option<Uuid>,
        status: Option<MeetingStatus>,
    ) -> RepoResult<Vec<MeetingRequest>> {
        sqlx::query_as(
            "SELECT meeting_requests.*, users.name AS client_name FROM meeting_requests LEFT JOIN users ON users.id = meeting_requests.client_id WHERE (? IS NULL OR meeting_requests.client_id = ?) AND (? IS NULL OR meeting_requests.status = ?) ORDER BY meeting_requests.created_at DESC",
        )
        .bind(client_scope)
        .bind(client_scope)
        .bind(status)
        .bind(status)
        .fetch_all(&**self.connection)
        .await
    }

    async fn occupied_slots(&self, date: NaiveDate) -> RepoResult<Vec<TimeSlot>> {
        sqlx::query_scalar(
            "SELECT preferred_time_slot FROM meeting_requests WHERE preferred_date = ? AND status <> 'CANCELLED'",
        )
        .bind(date)
        .fetch_all(&**self.connection)
        .await
    }

    async fn update_status(
        &self,
        request_id: Uuid,
        status: MeetingStatus,
        admin_note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> RepoResult<Option<MeetingRequest>> {
        sqlx::query_as(
            "UPDATE meeting_requests SET status = ?, admin_note = COALESCE(?, admin_note), reviewed_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(admin_note)
        .bind(reviewed_at)
        .bind(request_id)
        .fetch_optional(&**self.connection)
        .await
    }
}
