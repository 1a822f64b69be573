//! Signed CMS webhook that queues page revalidation.

use crate::config::AppConfig;
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::signature;
use crate::core::traits::ContentWebhook;
use crate::infrastructure::entities::ContentRevalidation;
use crate::infrastructure::traits::ContentRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    #[serde(rename = "_type")]
    document_type: Option<String>,
    slug: Option<Slug>,
}

/// CMS documents carry the slug either inline or as `{"current": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Slug {
    Plain(String),
    Current { current: String },
}

impl Slug {
    fn into_string(self) -> String {
        match self {
            Slug::Plain(slug) | Slug::Current { current: slug } => slug,
        }
    }
}

#[injectable(ContentWebhook)]
pub struct CmsWebhookService {
    repo: Ref<dyn ContentRepository>,
    config: Ref<AppConfig>,
}

impl CmsWebhookService {
    pub fn new(repo: Ref<dyn ContentRepository>, config: Ref<AppConfig>) -> Self {
        CmsWebhookService { repo, config }
    }
}

#[async_trait]
impl ContentWebhook for CmsWebhookService {
    async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> ServiceResult<ContentRevalidation> {
        let secret = self
            .config
            .cms_webhook_secret
            .as_deref()
            .ok_or_else(|| anyhow!("CMS_WEBHOOK_SECRET is not configured"))?;

        let verified = signature.is_some_and(|header| signature::verify(secret, body, header));
        if !verified {
            warn!("rejected CMS webhook with missing or invalid signature");
            return Err(ServiceError::InvalidSignature);
        }

        let payload: WebhookPayload = if body.iter().all(u8::is_ascii_whitespace) {
            WebhookPayload::default()
        } else {
            serde_json::from_slice(body)
                .map_err(|e| ServiceError::invalid("body", format!("invalid JSON: {e}")))?
        };

        let revalidation = self
            .repo
            .record_revalidation(ContentRevalidation {
                id: Uuid::new_v4(),
                document_type: payload.document_type,
                slug: payload.slug.map(Slug::into_string),
                received_at: Utc::now(),
            })
            .await?;

        info!(
            "revalidation queued for {:?} ({:?})",
            revalidation.slug, revalidation.document_type
        );
        Ok(revalidation)
    }
}
