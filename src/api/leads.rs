//! Lead pipeline endpoints

use crate::api::errors::ApiError;
use crate::api::extract::{JsonBody, QueryParams, parse_optional_day};
use crate::api::guard::{RequireRole, StaffOnly};
use crate::core::models::{DEFAULT_PAGE_SIZE, NewLead, Pagination};
use crate::core::services::device_type_from_user_agent;
use crate::core::traits::LeadPipeline;
use crate::infrastructure::traits::{DateRange, LeadFilter, LeadPatch};
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_leads).post(submit_lead))
        .route("/export", get(export_leads))
        .route("/:id", get(get_lead).patch(update_lead))
        .route("/:id/notes", post(add_note))
}

/// Public contact-form submission.
async fn submit_lead(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<schemas::SubmitLead>,
) -> Result<(StatusCode, Json<schemas::LeadEnvelope>), ApiError> {
    let device_type = request.device_type.or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|ua| ua.to_str().ok())
            .map(|ua| device_type_from_user_agent(ua).to_owned())
    });

    let lead = pipeline
        .intake(NewLead {
            name: request.name,
            email: request.email,
            phone: request.phone,
            company: request.company,
            project_type: request.project_type,
            message: request.message,
            source: request.source,
            utm_source: request.utm_source,
            utm_medium: request.utm_medium,
            utm_campaign: request.utm_campaign,
            device_type,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::LeadEnvelope { lead: lead.into() }),
    ))
}

async fn list_leads(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    RequireRole(_session, _): RequireRole<StaffOnly>,
    QueryParams(query): QueryParams<schemas::ListQuery>,
) -> Result<Json<schemas::LeadList>, ApiError> {
    let filter = query.filter()?;
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let page = pipeline.list_leads(filter, pagination).await?;

    Ok(Json(schemas::LeadList {
        pagination: schemas::PageInfo {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        },
        leads: page.leads.into_iter().map(schemas::Lead::from).collect(),
    }))
}

async fn get_lead(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    RequireRole(_session, _): RequireRole<StaffOnly>,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<schemas::LeadWithNotes>, ApiError> {
    let detail = pipeline.get_lead(lead_id).await?;

    Ok(Json(schemas::LeadWithNotes {
        lead: detail.lead.into(),
        notes: detail.notes.into_iter().map(schemas::Note::from).collect(),
    }))
}

async fn update_lead(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    RequireRole(_session, _): RequireRole<StaffOnly>,
    Path(lead_id): Path<Uuid>,
    JsonBody(request): JsonBody<schemas::UpdateLead>,
) -> Result<Json<schemas::LeadEnvelope>, ApiError> {
    let lead = pipeline
        .update_lead(
            lead_id,
            LeadPatch {
                status: request.status,
                assigned_to_id: request.assigned_to_id,
            },
        )
        .await?;

    Ok(Json(schemas::LeadEnvelope { lead: lead.into() }))
}

async fn add_note(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    RequireRole(session, _): RequireRole<StaffOnly>,
    Path(lead_id): Path<Uuid>,
    JsonBody(request): JsonBody<schemas::CreateNote>,
) -> Result<(StatusCode, Json<schemas::NoteEnvelope>), ApiError> {
    let note = pipeline
        .add_note(lead_id, session.user_id, request.note)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::NoteEnvelope { note: note.into() }),
    ))
}

async fn export_leads(
    Inject(pipeline): Inject<dyn LeadPipeline>,
    RequireRole(_session, _): RequireRole<StaffOnly>,
    QueryParams(query): QueryParams<schemas::ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = pipeline.export_csv(query.filter()?).await?;
    let filename = format!("leads-export-{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

pub mod schemas {
    use crate::api::errors::ApiError;
    use crate::api::extract::double_option;
    use crate::infrastructure::entities::{self, LeadStatus};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::{DateRange, LeadFilter, parse_optional_day};

    #[derive(Deserialize, Debug, Default)]
    pub struct ListQuery {
        pub status: Option<LeadStatus>,
        pub from: Option<String>,
        pub to: Option<String>,
        pub page: Option<u32>,
        pub limit: Option<u32>,
    }

    impl ListQuery {
        pub fn filter(&self) -> Result<LeadFilter, ApiError> {
            Ok(LeadFilter {
                status: self.status,
                range: DateRange {
                    from: parse_optional_day("from", self.from.as_deref())?,
                    to: parse_optional_day("to", self.to.as_deref())?,
                },
            })
        }
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct SubmitLead {
        pub name: String,
        pub email: String,
        pub phone: Option<String>,
        pub company: Option<String>,
        pub project_type: String,
        pub message: String,
        pub source: Option<String>,
        pub utm_source: Option<String>,
        pub utm_medium: Option<String>,
        pub utm_campaign: Option<String>,
        pub device_type: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateLead {
        pub status: Option<LeadStatus>,
        #[serde(default, deserialize_with = "double_option")]
        pub assigned_to_id: Option<Option<Uuid>>,
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateNote {
        pub note: String,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Lead {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub phone: Option<String>,
        pub company: Option<String>,
        pub project_type: String,
        pub message: String,
        pub status: LeadStatus,
        pub source: Option<String>,
        pub utm_source: Option<String>,
        pub utm_medium: Option<String>,
        pub utm_campaign: Option<String>,
        pub device_type: Option<String>,
        pub assigned_to_id: Option<Uuid>,
        pub assigned_to_name: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::Lead> for Lead {
        fn from(lead: entities::Lead) -> Self {
            Lead {
                id: lead.id,
                name: lead.name,
                email: lead.email,
                phone: lead.phone,
                company: lead.company,
                project_type: lead.project_type,
                message: lead.message,
                status: lead.status,
                source: lead.source,
                utm_source: lead.utm_source,
                utm_medium: lead.utm_medium,
                utm_campaign: lead.utm_campaign,
                device_type: lead.device_type,
                assigned_to_id: lead.assigned_to_id,
                assigned_to_name: lead.assigned_to_name,
                created_at: lead.created_at,
                updated_at: lead.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct LeadEnvelope {
        pub lead: Lead,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfo {
        pub page: u32,
        pub limit: u32,
        pub total: i64,
        pub total_pages: i64,
    }

    #[derive(Serialize, Debug)]
    pub struct LeadList {
        pub leads: Vec<Lead>,
        pub pagination: PageInfo,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Note {
        pub id: Uuid,
        pub lead_id: Uuid,
        pub author_id: Uuid,
        pub author_name: Option<String>,
        pub body: String,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::LeadNote> for Note {
        fn from(note: entities::LeadNote) -> Self {
            Note {
                id: note.id,
                lead_id: note.lead_id,
                author_id: note.author_id,
                author_name: note.author_name,
                body: note.body,
                created_at: note.created_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct NoteEnvelope {
        pub note: Note,
    }

    #[derive(Serialize, Debug)]
    pub struct LeadWithNotes {
        pub lead: Lead,
        pub notes: Vec<Note>,
    }
}
