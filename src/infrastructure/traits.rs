//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use crate::infrastructure::entities::{EventType, LeadStatus, MeetingStatus, TimeSlot};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Inclusive range of calendar days. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Exclusive upper bound, the day after `to`.
    pub fn until(&self) -> Option<NaiveDate> {
        self.to.and_then(|to| to.succ_opt())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub range: DateRange,
}

/// Partial lead update. `assigned_to_id: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub status: Option<LeadStatus>,
    pub assigned_to_id: Option<Option<Uuid>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to_id.is_none()
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> RepoResult<Option<entities::User>>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_project(&self, project_id: Uuid) -> RepoResult<Option<entities::Project>>;

    /// Inserts `conversation` unless its project already has one, then returns the project's
    /// conversation either way.
    async fn get_or_create_conversation(
        &self,
        conversation: entities::Conversation,
    ) -> RepoResult<entities::Conversation>;

    /// Conversations of every project, or only of projects whose client is `client_scope`.
    async fn list_conversations(
        &self,
        viewer_id: Uuid,
        client_scope: Option<Uuid>,
    ) -> RepoResult<Vec<entities::ConversationSummary>>;

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
        client_scope: Option<Uuid>,
    ) -> RepoResult<Option<entities::Conversation>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn list_messages(&self, conversation_id: Uuid) -> RepoResult<Vec<entities::Message>>;

    /// Appends the message and advances the conversation's `updated_at`.
    ///
    /// Returns `None` if the conversation does not exist.
    async fn create_message(
        &self,
        message: entities::Message,
    ) -> RepoResult<Option<entities::Message>>;

    /// Highest message sequence `user_id` has read in the conversation, 0 if none.
    async fn read_cursor(&self, conversation_id: Uuid, user_id: Uuid) -> RepoResult<i64>;

    /// Moves the reader's cursor to the newest message and returns how many messages from other
    /// authors became read.
    async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> RepoResult<u64>;

    async fn count_unread(&self, user_id: Uuid, client_scope: Option<Uuid>) -> RepoResult<i64>;
}

#[async_trait]
pub trait MeetingRequestRepository: Send + Sync {
    async fn create_meeting_request(
        &self,
        request: entities::MeetingRequest,
    ) -> RepoResult<entities::MeetingRequest>;

    async fn list_meeting_requests(
        &self,
        client_scope: Option<Uuid>,
        status: Option<MeetingStatus>,
    ) -> RepoResult<Vec<entities::MeetingRequest>>;

    /// Slots of `date` held by a request that is not cancelled.
    async fn occupied_slots(&self, date: NaiveDate) -> RepoResult<Vec<TimeSlot>>;

    async fn update_status(
        &self,
        request_id: Uuid,
        status: MeetingStatus,
        admin_note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> RepoResult<Option<entities::MeetingRequest>>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create_lead(&self, lead: entities::Lead) -> RepoResult<entities::Lead>;

    async fn find_lead(&self, lead_id: Uuid) -> RepoResult<Option<entities::Lead>>;

    async fn list_leads(
        &self,
        filter: LeadFilter,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<entities::Lead>>;

    async fn count_leads(&self, filter: LeadFilter) -> RepoResult<i64>;

    async fn update_lead(
        &self,
        lead_id: Uuid,
        patch: LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Option<entities::Lead>>;

    async fn list_notes(&self, lead_id: Uuid) -> RepoResult<Vec<entities::LeadNote>>;

    async fn create_note(&self, note: entities::LeadNote) -> RepoResult<entities::LeadNote>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn insert_events(&self, events: Vec<entities::AnalyticsEvent>) -> RepoResult<u64>;

    async fn count_events(&self, event_type: EventType, range: DateRange) -> RepoResult<i64>;

    async fn average_value(
        &self,
        event_type: EventType,
        range: DateRange,
    ) -> RepoResult<Option<f64>>;

    async fn top_pages(&self, range: DateRange, limit: i64)
    -> RepoResult<Vec<entities::PageViews>>;
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn record_revalidation(
        &self,
        revalidation: entities::ContentRevalidation,
    ) -> RepoResult<entities::ContentRevalidation>;
}
