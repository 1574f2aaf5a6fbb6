//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{
    ActivityTotals, Conversation, ConversationTotals, ConversationTranscript, DocumentTotals, Faq,
    GroupCount, Message, User,
};
use crate::infrastructure::traits::{
    ConversationRepository, FaqRepository, MetricsRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use log::error;
use std::collections::HashMap;
use uuid::Uuid;

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE reset_token = ?")
            .bind(token)
            .fetch_optional(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET last_login = ?, first_login = COALESCE(first_login, ?), updated_at = ? WHERE id = ?",
        )
        .bind(at)
        .bind(at)
        .bind(at)
        .bind(user_id)
        .execute(&**self.connection)
        .await
        .map(|_| ())
        .inspect_err(|e| error!("{e}"))
    }

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET reset_token = ?, reset_token_expires = ? WHERE id = ?")
            .bind(token)
            .bind(expires)
            .bind(user_id)
            .execute(&**self.connection)
            .await
            .map(|_| ())
            .inspect_err(|e| error!("{e}"))
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_hash = ?, reset_token = NULL, reset_token_expires = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(at)
        .bind(user_id)
        .execute(&**self.connection)
        .await
        .map(|_| ())
        .inspect_err(|e| error!("{e}"))
    }
}

#[injectable(ConversationRepository)]
pub struct DbConversationRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn create_conversation(
        &self,
        conversation: Conversation,
        messages: Vec<Message>,
    ) -> Result<Conversation, sqlx::Error> {
        let mut tx = self.connection.begin().await?;

        let created: Conversation = sqlx::query_as(
            "INSERT INTO conversations (id, user_id, started_at, last_message_at, active, resolved, satisfaction) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(conversation.id)
        .bind(conversation.user_id)
        .bind(conversation.started_at)
        .bind(conversation.last_message_at)
        .bind(conversation.active)
        .bind(conversation.resolved)
        .bind(conversation.satisfaction)
        .fetch_one(&mut *tx)
        .await
        .inspect_err(|e| error!("{e}"))?;

        for message in messages {
            sqlx::query(
                "INSERT INTO messages (id, conversation_id, position, kind, content, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(message.id)
            .bind(created.id)
            .bind(message.position)
            .bind(message.kind)
            .bind(message.content)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| error!("{e}"))?;
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn list_transcripts(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationTranscript>, sqlx::Error> {
        let conversations: Vec<Conversation> = sqlx::query_as(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY started_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))?;

        let messages: Vec<Message> = sqlx::query_as(
            "SELECT messages.* FROM messages INNER JOIN conversations ON conversations.id = messages.conversation_id WHERE conversations.user_id = ? ORDER BY messages.position ASC",
        )
        .bind(user_id)
        .fetch_all(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))?;

        let mut by_conversation: HashMap<Uuid, Vec<Message>> = HashMap::new();
        for message in messages {
            by_conversation
                .entry(message.conversation_id)
                .or_default()
                .push(message);
        }

        Ok(conversations
            .into_iter()
            .map(|conversation| ConversationTranscript {
                messages: by_conversation.remove(&conversation.id).unwrap_or_default(),
                conversation,
            })
            .collect())
    }

    async fn set_satisfaction(
        &self,
        conversation_id: Uuid,
        satisfaction: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query("UPDATE conversations SET satisfaction = ?, resolved = ? WHERE id = ?")
            .bind(satisfaction)
            .bind(true)
            .bind(conversation_id)
            .execute(&**self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .inspect_err(|e| error!("{e}"))
    }
}

/// FTS5 query matching rows that contain any of `keywords` as a whole word.
///
/// Every keyword is quoted, so FTS5 operators inside user input are plain text.
fn match_any(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|keyword| format!("\"{}\"", keyword.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[injectable(FaqRepository)]
pub struct DbFaqRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl FaqRepository for DbFaqRepository {
    async fn search_any_keyword(
        &self,
        keywords: &[String],
        limit: i64,
    ) -> Result<Vec<Faq>, sqlx::Error> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as(
            "SELECT faqs.id, faqs.question, faqs.answer FROM faqs_fts \
             INNER JOIN faqs ON faqs.id = faqs_fts.faq_id \
             WHERE faqs_fts MATCH ? ORDER BY faqs.rowid LIMIT ?",
        )
        .bind(match_any(keywords))
        .bind(limit)
        .fetch_all(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM faqs")
            .fetch_one(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }
}

#[injectable(MetricsRepository)]
pub struct DbMetricsRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbMetricsRepository {
    async fn group_count(&self, sql: &'static str) -> Result<Vec<GroupCount>, sqlx::Error> {
        sqlx::query_as(sql)
            .fetch_all(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }
}

#[async_trait]
impl MetricsRepository for DbMetricsRepository {
    async fn count_automated_messages(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM automated_messages")
            .fetch_one(&**self.connection)
            .await
            .inspect_err(|e| error!("{e}"))
    }

    async fn conversation_totals(&self) -> Result<ConversationTotals, sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(active), 0) AS active, \
                    COALESCE(SUM(resolved), 0) AS resolved, \
                    COUNT(satisfaction) AS rated, \
                    AVG(CASE WHEN satisfaction > 0 THEN satisfaction END) AS average_satisfaction, \
                    (SELECT COUNT(*) FROM messages) AS messages \
             FROM conversations",
        )
        .fetch_one(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))
    }

    async fn activity_totals(&self) -> Result<ActivityTotals, sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(mandatory), 0) AS mandatory, \
                    AVG(day) AS average_day, \
                    COALESCE(SUM(max_capacity), 0) AS capacity \
             FROM activities",
        )
        .fetch_one(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))
    }

    async fn activities_by_modality(&self) -> Result<Vec<GroupCount>, sqlx::Error> {
        self.group_count(
            "SELECT modality AS label, COUNT(*) AS count FROM activities GROUP BY modality ORDER BY modality",
        )
        .await
    }

    async fn activities_by_kind(&self) -> Result<Vec<GroupCount>, sqlx::Error> {
        self.group_count(
            "SELECT kind AS label, COUNT(*) AS count FROM activities GROUP BY kind ORDER BY kind",
        )
        .await
    }

    async fn document_totals(&self) -> Result<DocumentTotals, sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(mandatory), 0) AS mandatory, \
                    COALESCE(SUM(accesses), 0) AS accesses, \
                    COALESCE(SUM(downloads), 0) AS downloads \
             FROM documents",
        )
        .fetch_one(&**self.connection)
        .await
        .inspect_err(|e| error!("{e}"))
    }

    async fn documents_by_category(&self) -> Result<Vec<GroupCount>, sqlx::Error> {
        self.group_count(
            "SELECT category AS label, COUNT(*) AS count FROM documents GROUP BY category ORDER BY category",
        )
        .await
    }

    async fn documents_by_kind(&self) -> Result<Vec<GroupCount>, sqlx::Error> {
        self.group_count(
            "SELECT kind AS label, COUNT(*) AS count FROM documents GROUP BY kind ORDER BY kind",
        )
        .await
    }
}
