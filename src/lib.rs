//! Studio portal API: project messaging, meeting requests and lead management
//!
//! Library exports, shared by the binary and the tests.
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

use crate::config::AppConfig;
use crate::core::services::{
    CmsWebhookService, ConversationMessageStore, ConversationUnreadAggregator,
    EventAnalyticsService, LeadPipelineService, ProjectConversationDirectory,
    SlotMeetingScheduler,
};
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::repositories::{
    DbAnalyticsRepository, DbContentRepository, DbConversationRepository, DbLeadRepository,
    DbMeetingRequestRepository, DbMessageRepository, DbUserRepository,
};
use axum::Router;
use di::{Injectable, ServiceCollection, ServiceProvider};
use di_axum::RouterServiceProviderExtensions;
use tower_http::trace::TraceLayer;

/// Registers configuration, the pool, every repository and every service.
pub fn services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(AppConfig::singleton())
        .add(DatabaseConnection::singleton())
        .add(DbUserRepository::scoped())
        .add(DbConversationRepository::scoped())
        .add(DbMessageRepository::scoped())
        .add(DbMeetingRequestRepository::scoped())
        .add(DbLeadRepository::scoped())
        .add(DbAnalyticsRepository::scoped())
        .add(DbContentRepository::scoped())
        .add(ProjectConversationDirectory::scoped())
        .add(ConversationMessageStore::scoped())
        .add(ConversationUnreadAggregator::scoped())
        .add(SlotMeetingScheduler::scoped())
        .add(LeadPipelineService::scoped())
        .add(EventAnalyticsService::scoped())
        .add(CmsWebhookService::scoped());
    services
}

/// The HTTP application with every endpoint under `/api`.
pub fn app(provider: ServiceProvider) -> Router {
    Router::new()
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_provider(provider)
}
