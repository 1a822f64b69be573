//! Project conversations: directory, message store and unread counts.

use crate::config::AppConfig;
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::models::{MessageWithReadState, NewMessage};
use crate::core::session::Session;
use crate::core::traits::{ConversationDirectory, MessageStore, UnreadAggregator};
use crate::infrastructure::entities::{Conversation, ConversationSummary, Message};
use crate::infrastructure::traits::{ConversationRepository, MessageRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{debug, info};
use uuid::Uuid;
use validator::{Validate, ValidateLength};

#[injectable(ConversationDirectory)]
pub struct ProjectConversationDirectory {
    repo: Ref<dyn ConversationRepository>,
}

impl ProjectConversationDirectory {
    pub fn new(repo: Ref<dyn ConversationRepository>) -> Self {
        ProjectConversationDirectory { repo }
    }
}

#[async_trait]
impl ConversationDirectory for ProjectConversationDirectory {
    async fn get_or_create_conversation(
        &self,
        session: &Session,
        project_id: Uuid,
    ) -> ServiceResult<Conversation> {
        let project = self
            .repo
            .find_project(project_id)
            .await?
            .filter(|project| {
                session
                    .client_scope()
                    .is_none_or(|client_id| project.client_id == client_id)
            })
            .ok_or(ServiceError::NotFound("project"))?;

        let now = Utc::now();
        let conversation = self
            .repo
            .get_or_create_conversation(Conversation {
                id: Uuid::new_v4(),
                project_id: project.id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        debug!(
            "conversation {} resolved for project {}",
            conversation.id, project.id
        );
        Ok(conversation)
    }

    async fn list_conversations_for_user(
        &self,
        session: &Session,
    ) -> ServiceResult<Vec<ConversationSummary>> {
        Ok(self
            .repo
            .list_conversations(session.user_id, session.client_scope())
            .await?)
    }

    async fn check_access(
        &self,
        conversation_id: Uuid,
        session: &Session,
    ) -> ServiceResult<Option<Conversation>> {
        Ok(self
            .repo
            .find_conversation(conversation_id, session.client_scope())
            .await?)
    }
}

#[injectable(MessageStore)]
pub struct ConversationMessageStore {
    repo: Ref<dyn MessageRepository>,
    config: Ref<AppConfig>,
}

impl ConversationMessageStore {
    pub fn new(repo: Ref<dyn MessageRepository>, config: Ref<AppConfig>) -> Self {
        ConversationMessageStore { repo, config }
    }
}

#[async_trait]
impl MessageStore for ConversationMessageStore {
    async fn append_message(
        &self,
        conversation_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> ServiceResult<Message> {
        let message = NewMessage {
            body: body.trim().to_owned(),
        };
        message.validate()?;
        let max = self.config.message_max_length as u64;
        if !message.body.validate_length(None, Some(max), None) {
            return Err(ServiceError::invalid(
                "body",
                format!("must be at most {max} characters"),
            ));
        }

        let message = self
            .repo
            .create_message(Message {
                seq: 0,
                id: Uuid::new_v4(),
                conversation_id,
                author_id,
                body: message.body,
                created_at: Utc::now(),
                author_name: None,
            })
            .await?
            .ok_or(ServiceError::NotFound("conversation"))?;

        info!(
            "message {} appended to conversation {}",
            message.id, conversation_id
        );
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> ServiceResult<Vec<MessageWithReadState>> {
        let cursor = self.repo.read_cursor(conversation_id, viewer_id).await?;
        let messages = self.repo.list_messages(conversation_id).await?;

        Ok(messages
            .into_iter()
            .map(|message| MessageWithReadState {
                read: message.author_id == viewer_id || message.seq <= cursor,
                message,
            })
            .collect())
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> ServiceResult<u64> {
        let updated = self
            .repo
            .mark_read(conversation_id, reader_id, Utc::now())
            .await?;

        debug!("{reader_id} read {updated} message(s) in conversation {conversation_id}");
        Ok(updated)
    }
}

#[injectable(UnreadAggregator)]
pub struct ConversationUnreadAggregator {
    repo: Ref<dyn MessageRepository>,
}

impl ConversationUnreadAggregator {
    pub fn new(repo: Ref<dyn MessageRepository>) -> Self {
        ConversationUnreadAggregator { repo }
    }
}

#[async_trait]
impl UnreadAggregator for ConversationUnreadAggregator {
    async fn unread_count(&self, session: &Session) -> ServiceResult<i64> {
        Ok(self
            .repo
            .count_unread(session.user_id, session.client_scope())
            .await?)
    }
}
