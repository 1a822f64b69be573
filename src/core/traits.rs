//! DI "Interfaces"

use crate::core::errors::ServiceResult;
use crate::core::models::{
    AnalyticsSummary, LeadDetail, LeadPage, MessageWithReadState, NewAnalyticsEvent, NewLead,
    NewMeetingRequest, Pagination, SlotAvailability,
};
use crate::core::session::Session;
use crate::infrastructure::entities;
use crate::infrastructure::entities::MeetingStatus;
use crate::infrastructure::traits::{DateRange, LeadFilter, LeadPatch};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    /// Returns the project's conversation, creating it on first use.
    ///
    /// Returns `NotFound` if the project does not exist or the caller is a client of another
    /// project.
    async fn get_or_create_conversation(
        &self,
        session: &Session,
        project_id: Uuid,
    ) -> ServiceResult<entities::Conversation>;

    /// Lists the conversations the caller can see, most recently active first.
    async fn list_conversations_for_user(
        &self,
        session: &Session,
    ) -> ServiceResult<Vec<entities::ConversationSummary>>;

    /// Returns the conversation if the caller may view it.
    ///
    /// `None` covers both a missing conversation and one the caller is not allowed to see.
    async fn check_access(
        &self,
        conversation_id: Uuid,
        session: &Session,
    ) -> ServiceResult<Option<entities::Conversation>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a message. Callers must have passed [`ConversationDirectory::check_access`].
    async fn append_message(
        &self,
        conversation_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> ServiceResult<entities::Message>;

    /// Messages in creation order, with read state for `viewer_id`.
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> ServiceResult<Vec<MessageWithReadState>>;

    /// Marks every message not authored by `reader_id` as read and returns how many changed.
    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> ServiceResult<u64>;
}

#[async_trait]
pub trait UnreadAggregator: Send + Sync {
    /// Unread messages across every conversation visible to the caller.
    async fn unread_count(&self, session: &Session) -> ServiceResult<i64>;
}

#[async_trait]
pub trait MeetingScheduler: Send + Sync {
    async fn create_meeting_request(
        &self,
        client_id: Uuid,
        request: NewMeetingRequest,
    ) -> ServiceResult<entities::MeetingRequest>;

    /// Clients get their own requests, staff get all of them.
    async fn list_meeting_requests(
        &self,
        session: &Session,
        status: Option<MeetingStatus>,
    ) -> ServiceResult<Vec<entities::MeetingRequest>>;

    async fn slot_availability(&self, date: NaiveDate) -> ServiceResult<SlotAvailability>;

    async fn update_status(
        &self,
        request_id: Uuid,
        status: MeetingStatus,
        admin_note: Option<String>,
    ) -> ServiceResult<entities::MeetingRequest>;
}

#[async_trait]
pub trait LeadPipeline: Send + Sync {
    /// Stores a contact-form submission as a `NEW` lead.
    async fn intake(&self, lead: NewLead) -> ServiceResult<entities::Lead>;

    async fn list_leads(&self, filter: LeadFilter, pagination: Pagination)
    -> ServiceResult<LeadPage>;

    async fn get_lead(&self, lead_id: Uuid) -> ServiceResult<LeadDetail>;

    /// Applies a partial update. Any status may follow any other.
    async fn update_lead(&self, lead_id: Uuid, patch: LeadPatch) -> ServiceResult<entities::Lead>;

    async fn add_note(
        &self,
        lead_id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> ServiceResult<entities::LeadNote>;

    /// Renders matching leads as a CSV document.
    async fn export_csv(&self, filter: LeadFilter) -> ServiceResult<String>;
}

#[async_trait]
pub trait AnalyticsService: Send + Sync {
    /// Stores a batch of events and returns how many were accepted.
    async fn record_events(&self, events: Vec<NewAnalyticsEvent>) -> ServiceResult<u64>;

    async fn summary(&self, range: DateRange) -> ServiceResult<AnalyticsSummary>;
}

#[async_trait]
pub trait ContentWebhook: Send + Sync {
    /// Verifies the signature over `body` and records the revalidation it asks for.
    async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> ServiceResult<entities::ContentRevalidation>;
}
