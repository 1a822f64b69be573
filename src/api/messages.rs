//! Project messaging endpoints

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guard::Authenticated;
use crate::core::traits::{ConversationDirectory, MessageStore, UnreadAggregator};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conversations).post(open_conversation))
        .route("/unread-count", get(unread_count))
        .route("/:id", get(conversation_messages).post(post_message))
        .route("/:id/read", post(mark_read))
}

async fn list_conversations(
    Inject(directory): Inject<dyn ConversationDirectory>,
    Authenticated(session): Authenticated,
) -> Result<Json<schemas::ConversationList>, ApiError> {
    let conversations = directory.list_conversations_for_user(&session).await?;

    Ok(Json(schemas::ConversationList {
        conversations: conversations
            .into_iter()
            .map(schemas::ConversationListItem::from)
            .collect(),
    }))
}

async fn open_conversation(
    Inject(directory): Inject<dyn ConversationDirectory>,
    Authenticated(session): Authenticated,
    JsonBody(request): JsonBody<schemas::OpenConversation>,
) -> Result<(StatusCode, Json<schemas::ConversationEnvelope>), ApiError> {
    let project_id = request
        .project_id
        .ok_or_else(|| ApiError::BadRequest("projectId is required".to_owned()))?;

    let conversation = directory
        .get_or_create_conversation(&session, project_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::ConversationEnvelope {
            conversation: conversation.into(),
        }),
    ))
}

async fn conversation_messages(
    Inject(directory): Inject<dyn ConversationDirectory>,
    Inject(store): Inject<dyn MessageStore>,
    Authenticated(session): Authenticated,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<schemas::ConversationMessages>, ApiError> {
    let conversation = directory
        .check_access(conversation_id, &session)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;

    let messages = store
        .list_messages(conversation.id, session.user_id)
        .await?;

    Ok(Json(schemas::ConversationMessages {
        conversation: conversation.into(),
        messages: messages.into_iter().map(schemas::Message::from).collect(),
    }))
}

async fn post_message(
    Inject(directory): Inject<dyn ConversationDirectory>,
    Inject(store): Inject<dyn MessageStore>,
    Authenticated(session): Authenticated,
    Path(conversation_id): Path<Uuid>,
    JsonBody(request): JsonBody<schemas::CreateMessage>,
) -> Result<(StatusCode, Json<schemas::MessageEnvelope>), ApiError> {
    let conversation = directory
        .check_access(conversation_id, &session)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;

    let message = store
        .append_message(conversation.id, session.user_id, request.body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::MessageEnvelope {
            message: schemas::Message {
                read: true,
                ..schemas::Message::from(message)
            },
        }),
    ))
}

async fn mark_read(
    Inject(directory): Inject<dyn ConversationDirectory>,
    Inject(store): Inject<dyn MessageStore>,
    Authenticated(session): Authenticated,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<schemas::MarkReadResult>, ApiError> {
    let conversation = directory
        .check_access(conversation_id, &session)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;

    let updated_count = store.mark_read(conversation.id, session.user_id).await?;

    Ok(Json(schemas::MarkReadResult {
        success: true,
        updated_count,
    }))
}

async fn unread_count(
    Inject(aggregator): Inject<dyn UnreadAggregator>,
    Authenticated(session): Authenticated,
) -> Result<Json<schemas::UnreadCount>, ApiError> {
    let count = aggregator.unread_count(&session).await?;
    Ok(Json(schemas::UnreadCount { count }))
}

pub mod schemas {
    use crate::core::models::MessageWithReadState;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    const PREVIEW_LENGTH: usize = 100;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct OpenConversation {
        pub project_id: Option<Uuid>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Conversation {
        pub id: Uuid,
        pub project_id: Uuid,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::Conversation> for Conversation {
        fn from(conversation: entities::Conversation) -> Self {
            Conversation {
                id: conversation.id,
                project_id: conversation.project_id,
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationEnvelope {
        pub conversation: Conversation,
    }

    #[derive(Serialize, Debug)]
    pub struct Participant {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePreview {
        pub body: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct ConversationListItem {
        pub id: Uuid,
        pub project_id: Uuid,
        pub project_name: String,
        pub client: Participant,
        pub last_message: Option<MessagePreview>,
        pub unread_count: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::ConversationSummary> for ConversationListItem {
        fn from(summary: entities::ConversationSummary) -> Self {
            let last_message = summary
                .last_message_body
                .zip(summary.last_message_at)
                .map(|(body, created_at)| MessagePreview {
                    body: body.chars().take(PREVIEW_LENGTH).collect(),
                    created_at,
                });

            ConversationListItem {
                id: summary.id,
                project_id: summary.project_id,
                project_name: summary.project_name,
                client: Participant {
                    id: summary.client_id,
                    name: summary.client_name,
                },
                last_message,
                unread_count: summary.unread_count,
                created_at: summary.created_at,
                updated_at: summary.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationList {
        pub conversations: Vec<ConversationListItem>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Message {
        pub id: Uuid,
        pub conversation_id: Uuid,
        pub author_id: Uuid,
        pub author_name: Option<String>,
        pub body: String,
        pub created_at: DateTime<Utc>,
        pub read: bool,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                id: message.id,
                conversation_id: message.conversation_id,
                author_id: message.author_id,
                author_name: message.author_name,
                body: message.body,
                created_at: message.created_at,
                read: false,
            }
        }
    }

    impl From<MessageWithReadState> for Message {
        fn from(state: MessageWithReadState) -> Self {
            Message {
                read: state.read,
                ..Message::from(state.message)
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationMessages {
        pub conversation: Conversation,
        pub messages: Vec<Message>,
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateMessage {
        pub body: String,
    }

    #[derive(Serialize, Debug)]
    pub struct MessageEnvelope {
        pub message: Message,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct MarkReadResult {
        pub success: bool,
        pub updated_count: u64,
    }

    #[derive(Serialize, Debug)]
    pub struct UnreadCount {
        pub count: i64,
    }
}
