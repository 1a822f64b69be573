//! Meeting request endpoints

use crate::api::errors::ApiError;
use crate::api::extract::{JsonBody, QueryParams, parse_day};
use crate::api::guard::{ClientOnly, Editors, RequireRole, StaffOrClient};
use crate::core::errors::FieldError;
use crate::core::models::NewMeetingRequest;
use crate::core::traits::MeetingScheduler;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_meeting_requests).post(create_meeting_request))
        .route("/availability", get(availability))
        .route("/:id", patch(update_meeting_request))
}

async fn list_meeting_requests(
    Inject(scheduler): Inject<dyn MeetingScheduler>,
    RequireRole(session, _): RequireRole<StaffOrClient>,
    QueryParams(query): QueryParams<schemas::ListQuery>,
) -> Result<Json<schemas::MeetingRequestList>, ApiError> {
    let requests = scheduler
        .list_meeting_requests(&session, query.status)
        .await?;

    Ok(Json(schemas::MeetingRequestList {
        meeting_requests: requests
            .into_iter()
            .map(schemas::MeetingRequest::from)
            .collect(),
    }))
}

async fn create_meeting_request(
    Inject(scheduler): Inject<dyn MeetingScheduler>,
    RequireRole(session, _): RequireRole<ClientOnly>,
    JsonBody(request): JsonBody<schemas::CreateMeetingRequest>,
) -> Result<(StatusCode, Json<schemas::MeetingRequestEnvelope>), ApiError> {
    let preferred_date = parse_day("preferredDate", &request.preferred_date)?;

    let created = scheduler
        .create_meeting_request(
            session.user_id,
            NewMeetingRequest {
                preferred_date,
                preferred_time_slot: request.preferred_time_slot,
                topic: request.topic,
                notes: request.notes,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::MeetingRequestEnvelope {
            meeting_request: created.into(),
        }),
    ))
}

async fn update_meeting_request(
    Inject(scheduler): Inject<dyn MeetingScheduler>,
    RequireRole(_session, _): RequireRole<Editors>,
    Path(request_id): Path<Uuid>,
    JsonBody(request): JsonBody<schemas::UpdateMeetingRequest>,
) -> Result<Json<schemas::MeetingRequestEnvelope>, ApiError> {
    let updated = scheduler
        .update_status(request_id, request.status, request.admin_note)
        .await?;

    Ok(Json(schemas::MeetingRequestEnvelope {
        meeting_request: updated.into(),
    }))
}

async fn availability(
    Inject(scheduler): Inject<dyn MeetingScheduler>,
    RequireRole(_session, _): RequireRole<StaffOrClient>,
    QueryParams(query): QueryParams<schemas::AvailabilityQuery>,
) -> Result<Json<schemas::Availability>, ApiError> {
    let date = query
        .date
        .ok_or_else(|| ApiError::Validation(vec![FieldError::new("date", "is required")]))?;
    let date = parse_day("date", &date)?;

    Ok(Json(scheduler.slot_availability(date).await?.into()))
}

pub mod schemas {
    use crate::core::models::SlotAvailability;
    use crate::infrastructure::entities::{self, MeetingStatus, TimeSlot};
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug, Default)]
    pub struct ListQuery {
        pub status: Option<MeetingStatus>,
    }

    #[derive(Deserialize, Debug)]
    pub struct AvailabilityQuery {
        pub date: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateMeetingRequest {
        pub preferred_date: String,
        pub preferred_time_slot: TimeSlot,
        pub topic: String,
        pub notes: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateMeetingRequest {
        pub status: MeetingStatus,
        pub admin_note: Option<String>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MeetingRequest {
        pub id: Uuid,
        pub client_id: Uuid,
        pub client_name: Option<String>,
        pub preferred_date: NaiveDate,
        pub preferred_time_slot: TimeSlot,
        pub topic: String,
        pub notes: Option<String>,
        pub status: MeetingStatus,
        pub admin_note: Option<String>,
        pub reviewed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::MeetingRequest> for MeetingRequest {
        fn from(request: entities::MeetingRequest) -> Self {
            MeetingRequest {
                id: request.id,
                client_id: request.client_id,
                client_name: request.client_name,
                preferred_date: request.preferred_date,
                preferred_time_slot: request.preferred_time_slot,
                topic: request.topic,
                notes: request.notes,
                status: request.status,
                admin_note: request.admin_note,
                reviewed_at: request.reviewed_at,
                created_at: request.created_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MeetingRequestEnvelope {
        pub meeting_request: MeetingRequest,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MeetingRequestList {
        pub meeting_requests: Vec<MeetingRequest>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub struct Slots {
        pub morning: bool,
        pub afternoon: bool,
        pub evening: bool,
    }

    #[derive(Serialize, Debug)]
    pub struct Availability {
        pub date: NaiveDate,
        pub slots: Slots,
    }

    impl From<SlotAvailability> for Availability {
        fn from(availability: SlotAvailability) -> Self {
            Availability {
                date: availability.date,
                slots: Slots {
                    morning: availability.is_free(TimeSlot::Morning),
                    afternoon: availability.is_free(TimeSlot::Afternoon),
                    evening: availability.is_free(TimeSlot::Evening),
                },
            }
        }
    }
}
