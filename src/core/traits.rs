//! DI "Interfaces"

use crate::core::error::ServiceError;
use crate::core::metrics::{ActivityMetrics, ConversationMetrics, DocumentMetrics, MetricsOverview};
use crate::infrastructure::entities;
use crate::infrastructure::ollama::ModelInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A successful login: the refreshed user record and its session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: entities::User,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context_used: bool,
    pub answered_at: DateTime<Utc>,
    pub conversation_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct ChatbotStatistics {
    pub total_conversations: i64,
    pub average_satisfaction: f64,
    pub total_faqs: i64,
    pub model: ModelInfo,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub model_available: bool,
    pub model: ModelInfo,
    pub checked_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Checks credentials, stamps the login times and issues a session token.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError>;

    /// Starts a password reset for `email`.
    ///
    /// Returns the reset token when the user exists and tokens may be disclosed; `Ok(None)`
    /// otherwise, so callers cannot tell which emails are registered.
    async fn forgot_password(&self, email: &str) -> Result<Option<String>, ServiceError>;

    /// Returns the email the reset token was issued for.
    async fn verify_reset_token(&self, token: &str) -> Result<String, ServiceError>;

    /// Consumes a reset token, setting a new password.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ServiceError>;

    async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError>;

    /// Resolves the active user a session token was issued to.
    async fn session_user(&self, token: &str) -> Result<entities::User, ServiceError>;
}

#[async_trait]
pub trait ChatbotService: Send + Sync {
    /// Answers a question, enriched with FAQ context, and records the exchange.
    async fn ask(&self, user_id: &str, question: &str) -> Result<Answer, ServiceError>;

    /// Lists all conversations of a user, newest first.
    async fn history(
        &self,
        user_id: &str,
    ) -> Result<Vec<entities::ConversationTranscript>, ServiceError>;

    /// Rates a conversation and marks it resolved.
    ///
    /// Returns `Err(ConversationNotFound)` if there is no such conversation.
    async fn record_satisfaction(
        &self,
        conversation_id: Uuid,
        satisfaction: i64,
    ) -> Result<(), ServiceError>;

    async fn statistics(&self) -> Result<ChatbotStatistics, ServiceError>;

    async fn health(&self) -> HealthReport;
}

#[async_trait]
pub trait MetricsService: Send + Sync {
    async fn overview(&self) -> Result<MetricsOverview, ServiceError>;

    async fn conversations(&self) -> Result<ConversationMetrics, ServiceError>;

    async fn activities(&self) -> Result<ActivityMetrics, ServiceError>;

    async fn documents(&self) -> Result<DocumentMetrics, ServiceError>;
}
