//! Database entities

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub full_name: String,
    pub department: String,
    pub position: String,
    pub role: String,
    pub active: bool,
    pub verified: bool,
    pub onboarding_state: String,
    pub onboarding_progress: i64,
    pub first_login: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub active: bool,
    pub resolved: bool,
    pub satisfaction: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(u8)]
pub enum MessageKind {
    User = 1,
    Bot = 2,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub position: i64,
    pub kind: MessageKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with its messages, in insertion order.
#[derive(Debug, Clone)]
pub struct ConversationTranscript {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct ConversationTotals {
    pub total: i64,
    pub active: i64,
    pub resolved: i64,
    pub rated: i64,
    pub average_satisfaction: Option<f64>,
    pub messages: i64,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct ActivityTotals {
    pub total: i64,
    pub mandatory: i64,
    pub average_day: Option<f64>,
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct DocumentTotals {
    pub total: i64,
    pub mandatory: i64,
    pub accesses: i64,
    pub downloads: i64,
}

/// One bucket of a group-and-count query.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GroupCount {
    pub label: String,
    pub count: i64,
}
