//! Implementations for the services the app needs.

mod analytics;
mod content;
mod leads;
mod meetings;
mod messaging;

pub use analytics::EventAnalyticsService;
pub use content::CmsWebhookService;
pub use leads::{LeadPipelineService, device_type_from_user_agent};
pub use meetings::SlotMeetingScheduler;
pub use messaging::{
    ConversationMessageStore, ConversationUnreadAggregator, ProjectConversationDirectory,
};
