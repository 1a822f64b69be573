//! Client meeting requests over three fixed day-parts.

use crate::core::errors::{ServiceError, ServiceResult, is_unique_violation};
use crate::core::models::{MeetingReview, NewMeetingRequest, SlotAvailability};
use crate::core::session::Session;
use crate::core::traits::MeetingScheduler;
use crate::core::validation::trimmed;
use crate::infrastructure::entities::{MeetingRequest, MeetingStatus};
use crate::infrastructure::traits::MeetingRequestRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use di::{Ref, injectable};
use log::{info, warn};
use uuid::Uuid;
use validator::Validate;

const SLOT_TAKEN: &str = "the requested time slot is no longer available";

#[injectable(MeetingScheduler)]
pub struct SlotMeetingScheduler {
    repo: Ref<dyn MeetingRequestRepository>,
}

impl SlotMeetingScheduler {
    pub fn new(repo: Ref<dyn MeetingRequestRepository>) -> Self {
        SlotMeetingScheduler { repo }
    }
}

#[async_trait]
impl MeetingScheduler for SlotMeetingScheduler {
    async fn create_meeting_request(
        &self,
        client_id: Uuid,
        request: NewMeetingRequest,
    ) -> ServiceResult<MeetingRequest> {
        let request = NewMeetingRequest {
            topic: request.topic.trim().to_owned(),
            notes: trimmed(request.notes),
            ..request
        };
        request.validate()?;

        // The partial unique index on (date, slot) is what actually prevents double booking.
        let created = self
            .repo
            .create_meeting_request(MeetingRequest {
                id: Uuid::new_v4(),
                client_id,
                preferred_date: request.preferred_date,
                preferred_time_slot: request.preferred_time_slot,
                topic: request.topic,
                notes: request.notes,
                status: MeetingStatus::Pending,
                admin_note: None,
                reviewed_at: None,
                created_at: Utc::now(),
                client_name: None,
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    warn!(
                        "slot {:?} on {} already taken",
                        request.preferred_time_slot, request.preferred_date
                    );
                    ServiceError::Conflict(SLOT_TAKEN.to_owned())
                } else {
                    e.into()
                }
            })?;

        info!(
            "meeting request {} created by client {client_id}",
            created.id
        );
        Ok(created)
    }

    async fn list_meeting_requests(
        &self,
        session: &Session,
        status: Option<MeetingStatus>,
    ) -> ServiceResult<Vec<MeetingRequest>> {
        Ok(self
            .repo
            .list_meeting_requests(session.client_scope(), status)
            .await?)
    }

    async fn slot_availability(&self, date: NaiveDate) -> ServiceResult<SlotAvailability> {
        let occupied = self.repo.occupied_slots(date).await?;
        Ok(SlotAvailability::from_occupied(date, &occupied))
    }

    async fn update_status(
        &self,
        request_id: Uuid,
        status: MeetingStatus,
        admin_note: Option<String>,
    ) -> ServiceResult<MeetingRequest> {
        let review = MeetingReview {
            admin_note: trimmed(admin_note),
        };
        review.validate()?;

        let updated = self
            .repo
            .update_status(request_id, status, review.admin_note, Utc::now())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::Conflict(SLOT_TAKEN.to_owned())
                } else {
                    e.into()
                }
            })?
            .ok_or(ServiceError::NotFound("meeting request"))?;

        info!("meeting request {request_id} set to {status:?}");
        Ok(updated)
    }
}
