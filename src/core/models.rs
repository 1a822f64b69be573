//! Values passed between the API and the services

use crate::core::validation::not_in_past;
use crate::infrastructure::entities::{self, EventType, TimeSlot};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A message together with whether the viewing user has read it.
#[derive(Debug, Clone)]
pub struct MessageWithReadState {
    pub message: entities::Message,
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAvailability {
    pub date: NaiveDate,
    morning: bool,
    afternoon: bool,
    evening: bool,
}

impl SlotAvailability {
    pub fn from_occupied(date: NaiveDate, occupied: &[TimeSlot]) -> Self {
        SlotAvailability {
            date,
            morning: !occupied.contains(&TimeSlot::Morning),
            afternoon: !occupied.contains(&TimeSlot::Afternoon),
            evening: !occupied.contains(&TimeSlot::Evening),
        }
    }

    pub fn is_free(&self, slot: TimeSlot) -> bool {
        match slot {
            TimeSlot::Morning => self.morning,
            TimeSlot::Afternoon => self.afternoon,
            TimeSlot::Evening => self.evening,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewMeetingRequest {
    #[validate(custom(function = "not_in_past"))]
    pub preferred_date: NaiveDate,
    pub preferred_time_slot: TimeSlot,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub topic: String,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Staff decision on a meeting request.
#[derive(Debug, Clone, Validate)]
pub struct MeetingReview {
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct NewLead {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub company: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub project_type: String,
    #[validate(length(min = 10, max = 5000, message = "must be between 10 and 5000 characters"))]
    pub message: String,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub source: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub utm_source: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub utm_campaign: Option<String>,
    #[validate(length(max = 20, message = "must be at most 20 characters"))]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewLeadNote {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub note: String,
}

/// Message body; the upper bound comes from configuration.
#[derive(Debug, Clone, Validate)]
pub struct NewMessage {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct Pagination {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: u32,
    #[validate(range(min = 1, max = 100, message = "must be between 1 and 100"))]
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct LeadPage {
    pub leads: Vec<entities::Lead>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl LeadPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}

#[derive(Debug, Clone)]
pub struct LeadDetail {
    pub lead: entities::Lead,
    pub notes: Vec<entities::LeadNote>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewAnalyticsEvent {
    pub event_type: EventType,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub path: String,
    pub session_id: Option<String>,
    pub label: Option<String>,
    pub value: Option<i64>,
    pub device_type: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AnalyticsSummary {
    pub page_views: i64,
    pub cta_clicks: i64,
    pub average_scroll_depth: Option<f64>,
    pub top_pages: Vec<entities::PageViews>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::FieldError;

    #[test]
    fn total_pages_rounds_up() {
        let page = LeadPage {
            leads: Vec::new(),
            page: 1,
            limit: 20,
            total: 41,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn lead_errors_use_json_field_names() {
        let lead = NewLead {
            name: "Jane".to_owned(),
            email: "not-an-email".to_owned(),
            project_type: String::new(),
            message: "Looking for a new website".to_owned(),
            ..NewLead::default()
        };

        let errors = FieldError::from_validation(&lead.validate().unwrap_err(), "");
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["email", "projectType"]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let note = NewLeadNote {
            note: "é".repeat(2000),
        };
        assert!(note.validate().is_ok());
    }

    #[test]
    fn availability_marks_only_occupied_slots() {
        let date = NaiveDate::from_ymd_opt(2030, 5, 14).unwrap();
        let availability = SlotAvailability::from_occupied(date, &[TimeSlot::Morning]);

        assert!(!availability.is_free(TimeSlot::Morning));
        assert!(availability.is_free(TimeSlot::Afternoon));
        assert!(availability.is_free(TimeSlot::Evening));
    }
}
