//! Contact-form leads: intake, triage, notes and export.

use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::export::{MAX_EXPORT_ROWS, leads_to_csv};
use crate::core::models::{LeadDetail, LeadPage, NewLead, NewLeadNote, Pagination};
use crate::core::traits::LeadPipeline;
use crate::core::validation::trimmed;
use crate::infrastructure::entities::{Lead, LeadNote, LeadStatus};
use crate::infrastructure::traits::{LeadFilter, LeadPatch, LeadRepository, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::info;
use uuid::Uuid;
use validator::Validate;

#[injectable(LeadPipeline)]
pub struct LeadPipelineService {
    leads: Ref<dyn LeadRepository>,
    users: Ref<dyn UserRepository>,
}

impl LeadPipelineService {
    pub fn new(leads: Ref<dyn LeadRepository>, users: Ref<dyn UserRepository>) -> Self {
        LeadPipelineService { leads, users }
    }

    async fn require_lead(&self, lead_id: Uuid) -> ServiceResult<Lead> {
        self.leads
            .find_lead(lead_id)
            .await?
            .ok_or(ServiceError::NotFound("lead"))
    }
}

#[async_trait]
impl LeadPipeline for LeadPipelineService {
    async fn intake(&self, lead: NewLead) -> ServiceResult<Lead> {
        let lead = NewLead {
            name: lead.name.trim().to_owned(),
            email: lead.email.trim().to_lowercase(),
            phone: trimmed(lead.phone),
            company: trimmed(lead.company),
            project_type: lead.project_type.trim().to_owned(),
            message: lead.message.trim().to_owned(),
            source: trimmed(lead.source),
            utm_source: trimmed(lead.utm_source),
            utm_medium: trimmed(lead.utm_medium),
            utm_campaign: trimmed(lead.utm_campaign),
            device_type: trimmed(lead.device_type),
        };
        lead.validate()?;

        let now = Utc::now();
        let created = self
            .leads
            .create_lead(Lead {
                id: Uuid::new_v4(),
                name: lead.name,
                email: lead.email,
                phone: lead.phone,
                company: lead.company,
                project_type: lead.project_type,
                message: lead.message,
                status: LeadStatus::New,
                source: lead.source,
                utm_source: lead.utm_source,
                utm_medium: lead.utm_medium,
                utm_campaign: lead.utm_campaign,
                device_type: lead.device_type,
                assigned_to_id: None,
                created_at: now,
                updated_at: now,
                assigned_to_name: None,
            })
            .await?;

        info!("lead {} received", created.id);
        Ok(created)
    }

    async fn list_leads(
        &self,
        filter: LeadFilter,
        pagination: Pagination,
    ) -> ServiceResult<LeadPage> {
        pagination.validate()?;
        if let (Some(from), Some(to)) = (filter.range.from, filter.range.to) {
            if from > to {
                return Err(ServiceError::invalid("to", "must not be before from"));
            }
        }

        let total = self.leads.count_leads(filter).await?;
        let leads = self
            .leads
            .list_leads(filter, i64::from(pagination.limit), pagination.offset())
            .await?;

        Ok(LeadPage {
            leads,
            page: pagination.page,
            limit: pagination.limit,
            total,
        })
    }

    async fn get_lead(&self, lead_id: Uuid) -> ServiceResult<LeadDetail> {
        let lead = self.require_lead(lead_id).await?;
        let notes = self.leads.list_notes(lead_id).await?;
        Ok(LeadDetail { lead, notes })
    }

    async fn update_lead(&self, lead_id: Uuid, patch: LeadPatch) -> ServiceResult<Lead> {
        if patch.is_empty() {
            return Err(ServiceError::invalid(
                "body",
                "at least one of status or assignedToId is required",
            ));
        }

        if let Some(Some(assignee_id)) = patch.assigned_to_id {
            let assignee = self.users.find_user(assignee_id).await?;
            if !assignee.is_some_and(|user| user.role.is_staff()) {
                return Err(ServiceError::invalid(
                    "assignedToId",
                    "must reference a staff user",
                ));
            }
        }

        let updated = self
            .leads
            .update_lead(lead_id, patch, Utc::now())
            .await?
            .ok_or(ServiceError::NotFound("lead"))?;

        info!("lead {lead_id} updated, status {}", updated.status.as_str());
        Ok(updated)
    }

    async fn add_note(&self, lead_id: Uuid, author_id: Uuid, text: String) -> ServiceResult<LeadNote> {
        let note = NewLeadNote {
            note: text.trim().to_owned(),
        };
        note.validate()?;

        self.require_lead(lead_id).await?;

        Ok(self
            .leads
            .create_note(LeadNote {
                id: Uuid::new_v4(),
                lead_id,
                author_id,
                body: note.note,
                created_at: Utc::now(),
                author_name: None,
            })
            .await?)
    }

    async fn export_csv(&self, filter: LeadFilter) -> ServiceResult<String> {
        let leads = self.leads.list_leads(filter, MAX_EXPORT_ROWS, 0).await?;
        info!("exporting {} lead(s)", leads.len());
        Ok(leads_to_csv(&leads)?)
    }
}

/// Coarse device class from a `User-Agent` header.
pub fn device_type_from_user_agent(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("ipad") || ua.contains("tablet") || (ua.contains("android") && !ua.contains("mobi")) {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("iphone") {
        "mobile"
    } else {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::device_type_from_user_agent;

    #[test]
    fn classifies_user_agents() {
        assert_eq!(
            device_type_from_user_agent(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148"
            ),
            "mobile"
        );
        assert_eq!(
            device_type_from_user_agent("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"),
            "tablet"
        );
        assert_eq!(
            device_type_from_user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0"),
            "desktop"
        );
    }
}
