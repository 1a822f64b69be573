//! First-party analytics: page views, scroll depth and CTA clicks.

use crate::core::errors::{FieldError, ServiceError, ServiceResult};
use crate::core::models::{AnalyticsSummary, NewAnalyticsEvent};
use crate::core::traits::AnalyticsService;
use crate::core::validation::trimmed;
use crate::infrastructure::entities::{AnalyticsEvent, EventType};
use crate::infrastructure::traits::{AnalyticsRepository, DateRange};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::debug;
use uuid::Uuid;
use validator::Validate;

pub const MAX_BATCH_SIZE: usize = 50;
const TOP_PAGES: i64 = 10;

#[injectable(AnalyticsService)]
pub struct EventAnalyticsService {
    repo: Ref<dyn AnalyticsRepository>,
}

impl EventAnalyticsService {
    pub fn new(repo: Ref<dyn AnalyticsRepository>) -> Self {
        EventAnalyticsService { repo }
    }
}

#[async_trait]
impl AnalyticsService for EventAnalyticsService {
    async fn record_events(&self, events: Vec<NewAnalyticsEvent>) -> ServiceResult<u64> {
        if !(1..=MAX_BATCH_SIZE).contains(&events.len()) {
            return Err(ServiceError::invalid(
                "events",
                format!("must contain between 1 and {MAX_BATCH_SIZE} events"),
            ));
        }

        let received_at = Utc::now();
        let mut errors = Vec::new();
        let mut rows = Vec::with_capacity(events.len());
        for (index, event) in events.into_iter().enumerate() {
            let event = NewAnalyticsEvent {
                path: event.path.trim().to_owned(),
                ..event
            };
            let prefix = format!("events[{index}].");
            if let Err(invalid) = event.validate() {
                errors.extend(FieldError::from_validation(&invalid, &prefix));
            }
            // Only scroll events carry a percentage
            if event.event_type == EventType::ScrollDepth
                && !event.value.is_some_and(|depth| (0..=100).contains(&depth))
            {
                errors.push(FieldError::new(
                    format!("{prefix}value"),
                    "scroll depth must be between 0 and 100",
                ));
            }

            rows.push(AnalyticsEvent {
                id: Uuid::new_v4(),
                event_type: event.event_type,
                path: event.path,
                session_id: trimmed(event.session_id),
                label: trimmed(event.label),
                value: event.value,
                device_type: trimmed(event.device_type),
                occurred_at: event.occurred_at.unwrap_or(received_at),
                received_at,
            });
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let accepted = self.repo.insert_events(rows).await?;
        debug!("stored {accepted} analytics event(s)");
        Ok(accepted)
    }

    async fn summary(&self, range: DateRange) -> ServiceResult<AnalyticsSummary> {
        Ok(AnalyticsSummary {
            page_views: self.repo.count_events(EventType::PageView, range).await?,
            cta_clicks: self.repo.count_events(EventType::CtaClick, range).await?,
            average_scroll_depth: self
                .repo
                .average_value(EventType::ScrollDepth, range)
                .await?,
            top_pages: self.repo.top_pages(range, TOP_PAGES).await?,
        })
    }
}
