//! First-party analytics endpoints

use crate::api::errors::ApiError;
use crate::api::extract::{JsonBody, QueryParams, parse_optional_day};
use crate::api::guard::{RequireRole, StaffOnly};
use crate::core::models::NewAnalyticsEvent;
use crate::core::services::device_type_from_user_agent;
use crate::core::traits::AnalyticsService;
use crate::infrastructure::traits::DateRange;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/events", post(record_events))
        .route("/summary", get(summary))
}

async fn record_events(
    Inject(analytics): Inject<dyn AnalyticsService>,
    headers: HeaderMap,
    JsonBody(batch): JsonBody<schemas::EventBatch>,
) -> Result<(StatusCode, Json<schemas::Accepted>), ApiError> {
    let device_type = headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(device_type_from_user_agent);

    let events = batch
        .events
        .into_iter()
        .map(|event| NewAnalyticsEvent {
            event_type: event.event_type,
            path: event.path,
            session_id: event.session_id,
            label: event.label,
            value: event.value,
            device_type: event
                .device_type
                .or_else(|| device_type.map(str::to_owned)),
            occurred_at: event.occurred_at,
        })
        .collect();

    let accepted = analytics.record_events(events).await?;
    Ok((StatusCode::ACCEPTED, Json(schemas::Accepted { accepted })))
}

async fn summary(
    Inject(analytics): Inject<dyn AnalyticsService>,
    RequireRole(_session, _): RequireRole<StaffOnly>,
    QueryParams(query): QueryParams<schemas::SummaryQuery>,
) -> Result<Json<schemas::Summary>, ApiError> {
    let range = DateRange {
        from: parse_optional_day("from", query.from.as_deref())?,
        to: parse_optional_day("to", query.to.as_deref())?,
    };

    Ok(Json(analytics.summary(range).await?.into()))
}

pub mod schemas {
    use crate::core::models::AnalyticsSummary;
    use crate::infrastructure::entities::EventType;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Event {
        pub event_type: EventType,
        pub path: String,
        pub session_id: Option<String>,
        pub label: Option<String>,
        pub value: Option<i64>,
        pub device_type: Option<String>,
        pub occurred_at: Option<DateTime<Utc>>,
    }

    #[derive(Deserialize, Debug)]
    pub struct EventBatch {
        pub events: Vec<Event>,
    }

    #[derive(Serialize, Debug)]
    pub struct Accepted {
        pub accepted: u64,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct SummaryQuery {
        pub from: Option<String>,
        pub to: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct TopPage {
        pub path: String,
        pub views: i64,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Summary {
        pub page_views: i64,
        pub cta_clicks: i64,
        pub average_scroll_depth: Option<f64>,
        pub top_pages: Vec<TopPage>,
    }

    impl From<AnalyticsSummary> for Summary {
        fn from(summary: AnalyticsSummary) -> Self {
            Summary {
                page_views: summary.page_views,
                cta_clicks: summary.cta_clicks,
                average_scroll_depth: summary.average_scroll_depth,
                top_pages: summary
                    .top_pages
                    .into_iter()
                    .map(|page| TopPage {
                        path: page.path,
                        views: page.views,
                    })
                    .collect(),
            }
        }
    }
}
