//! Implementations for the services the app needs.
//!

use crate::core::assistant::{MAX_CONTEXT_FAQS, build_faq_context, keywords};
use crate::core::error::ServiceError;
use crate::core::metrics::{
    self, ActivityMetrics, ConversationMetrics, DocumentMetrics, MetricsOverview,
};
use crate::core::password::{dummy_hash, generate_reset_token, hash_password, verify_password};
use crate::core::tokens::TokenIssuer;
use crate::core::traits::{
    Answer, AuthService, ChatbotService, ChatbotStatistics, HealthReport, LoginOutcome,
    MetricsService,
};
use crate::infrastructure::entities::{
    Conversation, ConversationTranscript, Message, MessageKind, User,
};
use crate::infrastructure::settings::Settings;
use crate::infrastructure::traits::{
    ConversationRepository, FaqRepository, MetricsRepository, ModelGateway, UserRepository,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use di::{Ref, injectable};
use log::{info, warn};
use uuid::Uuid;

pub const RESET_TOKEN_LIFETIME_SECS: i64 = 3600;

#[injectable(AuthService)]
pub struct MyAuthService {
    users: Ref<dyn UserRepository>,
    issuer: Ref<TokenIssuer>,
    settings: Ref<Settings>,
}

impl MyAuthService {
    /// Looks up the holder of a reset token, rejecting unknown and expired tokens alike.
    async fn reset_token_holder(&self, token: &str) -> Result<User, ServiceError> {
        let Some(user) = self.users.find_by_reset_token(token).await? else {
            warn!("Unknown reset token presented");
            return Err(ServiceError::InvalidResetToken);
        };

        match user.reset_token_expires {
            Some(expires) if expires >= Utc::now() => Ok(user),
            _ => {
                warn!("Expired reset token presented for {}", user.email);
                Err(ServiceError::ExpiredResetToken)
            }
        }
    }
}

#[async_trait]
impl AuthService for MyAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        info!("Login attempt for {email}");

        let Some(mut user) = self.users.find_by_email(email).await? else {
            warn!("Login for unknown email {email}");
            let _ = verify_password(password, dummy_hash());
            return Err(ServiceError::UnknownUser);
        };

        if !user.active {
            warn!("Inactive user {email} tried to log in");
            return Err(ServiceError::InactiveUser);
        }

        if !verify_password(password, &user.password_hash) {
            warn!("Wrong password for {email}");
            return Err(ServiceError::InvalidCredentials);
        }

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;

        user.last_login = Some(now);
        user.updated_at = Some(now);
        if user.first_login.is_none() {
            info!("First login for {email}");
            user.first_login = Some(now);
        }

        let token = self.issuer.issue(&user)?;

        info!("Login succeeded for {email}");

        Ok(LoginOutcome { token, user })
    }

    async fn forgot_password(&self, email: &str) -> Result<Option<String>, ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            info!("Password reset requested for unknown email {email}");
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires = Utc::now() + Duration::seconds(RESET_TOKEN_LIFETIME_SECS);

        self.users.store_reset_token(user.id, &token, expires).await?;

        info!("Reset token issued for {email}, valid until {expires}");

        if self.settings.expose_reset_token {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    async fn verify_reset_token(&self, token: &str) -> Result<String, ServiceError> {
        self.reset_token_holder(token).await.map(|user| user.email)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ServiceError> {
        let user = self.reset_token_holder(token).await?;

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password(user.id, &password_hash, Utc::now())
            .await?;

        info!("Password reset for {}", user.email);

        Ok(())
    }

    async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Password change for unknown email {email}");
            let _ = verify_password(current_password, dummy_hash());
            return Err(ServiceError::UnknownUser);
        };

        if !user.active {
            warn!("Inactive user {email} tried to change password");
            return Err(ServiceError::InactiveUser);
        }

        if !verify_password(current_password, &user.password_hash) {
            warn!("Wrong current password for {email}");
            return Err(ServiceError::InvalidCredentials);
        }

        if new_password == current_password {
            return Err(ServiceError::SamePassword);
        }

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password(user.id, &password_hash, Utc::now())
            .await?;

        info!("Password changed for {email}");

        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<User, ServiceError> {
        let claims = self.issuer.verify(token).map_err(|e| {
            warn!("Rejected session token: {e}");
            ServiceError::InvalidSession
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::InvalidSession)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::InvalidSession)?;

        if !user.active {
            return Err(ServiceError::InactiveUser);
        }

        Ok(user)
    }
}

#[injectable(ChatbotService)]
pub struct MyChatbotService {
    conversations: Ref<dyn ConversationRepository>,
    faqs: Ref<dyn FaqRepository>,
    metrics: Ref<dyn MetricsRepository>,
    gateway: Ref<dyn ModelGateway>,
}

impl MyChatbotService {
    /// FAQ context for a question. Lookup failures only cost the context.
    async fn faq_context(&self, question: &str) -> Option<String> {
        let faqs = match self
            .faqs
            .search_any_keyword(&keywords(question), MAX_CONTEXT_FAQS)
            .await
        {
            Ok(faqs) => faqs,
            Err(e) => {
                warn!("FAQ lookup failed: {e}");
                return None;
            }
        };

        build_faq_context(&faqs).unwrap_or_else(|e| {
            warn!("Cannot render FAQ context: {e}");
            None
        })
    }
}

#[async_trait]
impl ChatbotService for MyChatbotService {
    async fn ask(&self, user_id: &str, question: &str) -> Result<Answer, ServiceError> {
        if question.trim().is_empty() {
            return Err(ServiceError::Validation("La pregunta es requerida".to_owned()));
        }

        info!("Question from user {user_id}: {question}");

        let context = self.faq_context(question).await;
        info!("FAQ context found: {}", context.is_some());

        let text = self
            .gateway
            .generate_answer(question, context.as_deref())
            .await;

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            started_at: now,
            last_message_at: now,
            active: true,
            resolved: false,
            satisfaction: None,
        };
        let messages = vec![
            Message {
                id: Uuid::new_v4(),
                conversation_id: conversation.id,
                position: 0,
                kind: MessageKind::User,
                content: question.to_owned(),
                created_at: now,
            },
            Message {
                id: Uuid::new_v4(),
                conversation_id: conversation.id,
                position: 1,
                kind: MessageKind::Bot,
                content: text.clone(),
                created_at: now,
            },
        ];

        let conversation = self
            .conversations
            .create_conversation(conversation, messages)
            .await?;

        info!("Conversation {} stored", conversation.id);

        Ok(Answer {
            text,
            context_used: context.is_some(),
            answered_at: Utc::now(),
            conversation_id: conversation.id,
        })
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ConversationTranscript>, ServiceError> {
        Ok(self.conversations.list_transcripts(user_id).await?)
    }

    async fn record_satisfaction(
        &self,
        conversation_id: Uuid,
        satisfaction: i64,
    ) -> Result<(), ServiceError> {
        if !(1..=5).contains(&satisfaction) {
            return Err(ServiceError::Validation(
                "La satisfacción debe estar entre 1 y 5".to_owned(),
            ));
        }

        if !self
            .conversations
            .set_satisfaction(conversation_id, satisfaction)
            .await?
        {
            return Err(ServiceError::ConversationNotFound);
        }

        info!("Satisfaction {satisfaction} recorded for conversation {conversation_id}");

        Ok(())
    }

    async fn statistics(&self) -> Result<ChatbotStatistics, ServiceError> {
        let (totals, total_faqs) =
            tokio::try_join!(self.metrics.conversation_totals(), self.faqs.count())?;

        Ok(ChatbotStatistics {
            total_conversations: totals.total,
            average_satisfaction: totals
                .average_satisfaction
                .map(metrics::round_2)
                .unwrap_or(0.0),
            total_faqs,
            model: self.gateway.model_info().await,
        })
    }

    async fn health(&self) -> HealthReport {
        let model_available = self.gateway.check_model_available().await;
        let model = self.gateway.model_info().await;

        HealthReport {
            model_available,
            model,
            checked_at: Utc::now(),
        }
    }
}

#[injectable(MetricsService)]
pub struct MyMetricsService {
    repo: Ref<dyn MetricsRepository>,
}

#[async_trait]
impl MetricsService for MyMetricsService {
    async fn overview(&self) -> Result<MetricsOverview, ServiceError> {
        info!("Computing dashboard metrics");

        let (total_contents, activities, documents, conversations) = tokio::try_join!(
            self.repo.count_automated_messages(),
            self.repo.activity_totals(),
            self.repo.document_totals(),
            self.repo.conversation_totals(),
        )?;

        Ok(MetricsOverview {
            total_contents,
            total_activities: activities.total,
            total_resources: documents.total,
            completion_rate: metrics::completion_rate(activities.mandatory, activities.total),
            average_satisfaction: metrics::average_satisfaction(
                conversations.average_satisfaction,
            ),
            average_time_days: metrics::average_days(activities.average_day),
            active_users: conversations.active,
            total_interactions: conversations.messages,
        })
    }

    async fn conversations(&self) -> Result<ConversationMetrics, ServiceError> {
        let totals = self.repo.conversation_totals().await?;

        Ok(ConversationMetrics {
            total: totals.total,
            active: totals.active,
            resolved: totals.resolved,
            rated: totals.rated,
            average_satisfaction: metrics::average_satisfaction(totals.average_satisfaction),
            total_messages: totals.messages,
        })
    }

    async fn activities(&self) -> Result<ActivityMetrics, ServiceError> {
        let (totals, by_modality, by_kind) = tokio::try_join!(
            self.repo.activity_totals(),
            self.repo.activities_by_modality(),
            self.repo.activities_by_kind(),
        )?;

        Ok(ActivityMetrics {
            total: totals.total,
            mandatory: totals.mandatory,
            by_modality,
            by_kind,
            total_capacity: totals.capacity,
        })
    }

    async fn documents(&self) -> Result<DocumentMetrics, ServiceError> {
        let (totals, by_category, by_kind) = tokio::try_join!(
            self.repo.document_totals(),
            self.repo.documents_by_category(),
            self.repo.documents_by_kind(),
        )?;

        Ok(DocumentMetrics {
            total: totals.total,
            mandatory: totals.mandatory,
            by_category,
            by_kind,
            total_accesses: totals.accesses,
            total_downloads: totals.downloads,
        })
    }
}
