//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use crate::infrastructure::ollama::ModelInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<entities::User>, sqlx::Error>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<entities::User>, sqlx::Error>;

    async fn find_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<entities::User>, sqlx::Error>;

    /// Stamps `last_login`, and `first_login` when it has never been set.
    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error>;

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;

    /// Replaces the password hash and clears any pending reset token.
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Inserts the conversation and its messages atomically.
    async fn create_conversation(
        &self,
        conversation: entities::Conversation,
        messages: Vec<entities::Message>,
    ) -> Result<entities::Conversation, sqlx::Error>;

    /// Lists a user's conversations, newest first, with their messages.
    async fn list_transcripts(
        &self,
        user_id: &str,
    ) -> Result<Vec<entities::ConversationTranscript>, sqlx::Error>;

    /// Returns `false` when no conversation has the given id.
    async fn set_satisfaction(
        &self,
        conversation_id: Uuid,
        satisfaction: i64,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait FaqRepository: Send + Sync {
    /// Returns at most `limit` FAQs mentioning any of the given keywords.
    async fn search_any_keyword(
        &self,
        keywords: &[String],
        limit: i64,
    ) -> Result<Vec<entities::Faq>, sqlx::Error>;

    async fn count(&self) -> Result<i64, sqlx::Error>;
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn count_automated_messages(&self) -> Result<i64, sqlx::Error>;

    async fn conversation_totals(&self) -> Result<entities::ConversationTotals, sqlx::Error>;

    async fn activity_totals(&self) -> Result<entities::ActivityTotals, sqlx::Error>;

    async fn activities_by_modality(&self) -> Result<Vec<entities::GroupCount>, sqlx::Error>;

    async fn activities_by_kind(&self) -> Result<Vec<entities::GroupCount>, sqlx::Error>;

    async fn document_totals(&self) -> Result<entities::DocumentTotals, sqlx::Error>;

    async fn documents_by_category(&self) -> Result<Vec<entities::GroupCount>, sqlx::Error>;

    async fn documents_by_kind(&self) -> Result<Vec<entities::GroupCount>, sqlx::Error>;
}

/// Text generation backend.
///
/// Implementations never fail: upstream problems come back as a readable apology so the
/// chat endpoint keeps answering when only generation is down.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate_answer(&self, question: &str, context: Option<&str>) -> String;

    /// Whether the configured model is listed by the model server.
    async fn check_model_available(&self) -> bool;

    async fn model_info(&self) -> ModelInfo;
}
