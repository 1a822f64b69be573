//! Inbound webhooks from external collaborators

use crate::api::errors::ApiError;
use crate::core::signature::SIGNATURE_HEADER;
use crate::core::traits::ContentWebhook;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/cms", post(cms_webhook))
}

/// Signed notification that CMS content changed.
async fn cms_webhook(
    Inject(webhook): Inject<dyn ContentWebhook>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<schemas::Revalidated>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let revalidation = webhook.handle_webhook(&body, signature).await?;

    Ok(Json(schemas::Revalidated {
        revalidated: true,
        slug: revalidation.slug,
        document_type: revalidation.document_type,
    }))
}

pub mod schemas {
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Revalidated {
        pub revalidated: bool,
        pub slug: Option<String>,
        pub document_type: Option<String>,
    }
}
