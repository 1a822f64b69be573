//! DB Repository abstractions

mod analytics;
mod content;
mod conversations;
mod leads;
mod meeting_requests;
mod messages;
mod users;

pub use analytics::DbAnalyticsRepository;
pub use content::DbContentRepository;
pub use conversations::DbConversationRepository;
pub use leads::DbLeadRepository;
pub use meeting_requests::DbMeetingRequestRepository;
pub use messages::DbMessageRepository;
pub use users::DbUserRepository;
