//! Chatbot endpoints

use crate::api::ApiJson;
use crate::api::error::ApiError;
use crate::core::traits::ChatbotService;
use axum::extract::Path;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/historial/:usuario_id", get(history))
        .route("/satisfaccion/:id", put(record_satisfaction))
        .route("/estadisticas", get(statistics))
        .route("/health", get(health))
}

async fn ask(
    Inject(chatbot_service): Inject<dyn ChatbotService>,
    ApiJson(request): ApiJson<schemas::AskRequest>,
) -> Result<Json<schemas::AskResponse>, ApiError> {
    let answer = chatbot_service
        .ask(&request.usuario_id, &request.pregunta)
        .await?;

    Ok(Json(answer.into()))
}

async fn history(
    Inject(chatbot_service): Inject<dyn ChatbotService>,
    Path(user_id): Path<String>,
) -> Result<Json<schemas::History>, ApiError> {
    let transcripts = chatbot_service.history(&user_id).await?;

    Ok(Json(schemas::History {
        total: transcripts.len(),
        conversaciones: transcripts
            .into_iter()
            .map(schemas::Conversation::from)
            .collect(),
    }))
}

async fn record_satisfaction(
    Inject(chatbot_service): Inject<dyn ChatbotService>,
    Path(conversation_id): Path<String>,
    ApiJson(request): ApiJson<schemas::SatisfactionRequest>,
) -> Result<Json<schemas::SatisfactionResponse>, ApiError> {
    let conversation_id = Uuid::parse_str(&conversation_id)
        .map_err(|_| ApiError::bad_request("ID de conversación inválido"))?;

    chatbot_service
        .record_satisfaction(conversation_id, request.satisfaccion)
        .await?;

    Ok(Json(schemas::SatisfactionResponse {
        mensaje: "Gracias por tu feedback".to_owned(),
    }))
}

async fn statistics(
    Inject(chatbot_service): Inject<dyn ChatbotService>,
) -> Result<Json<schemas::Statistics>, ApiError> {
    Ok(Json(chatbot_service.statistics().await?.into()))
}

async fn health(Inject(chatbot_service): Inject<dyn ChatbotService>) -> Json<schemas::Health> {
    Json(chatbot_service.health().await.into())
}

pub mod schemas {
    use crate::core::traits::{Answer, ChatbotStatistics, HealthReport};
    use crate::infrastructure::entities;
    use crate::infrastructure::ollama::ModelInfo;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug, Default)]
    #[serde(default, rename_all = "camelCase")]
    pub struct AskRequest {
        pub usuario_id: String,
        pub pregunta: String,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct AskResponse {
        pub respuesta: String,
        pub contexto_utilizado: bool,
        pub fecha_respuesta: DateTime<Utc>,
        pub conversacion_id: Uuid,
    }

    impl From<Answer> for AskResponse {
        fn from(answer: Answer) -> Self {
            AskResponse {
                respuesta: answer.text,
                contexto_utilizado: answer.context_used,
                fecha_respuesta: answer.answered_at,
                conversacion_id: answer.conversation_id,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct History {
        pub total: usize,
        pub conversaciones: Vec<Conversation>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Conversation {
        pub id: Uuid,
        pub usuario_id: String,
        pub fecha_inicio: DateTime<Utc>,
        pub fecha_ultima_mensaje: DateTime<Utc>,
        pub activa: bool,
        pub resuelto: bool,
        pub satisfaccion: Option<i64>,
        pub mensajes: Vec<Message>,
    }

    impl From<entities::ConversationTranscript> for Conversation {
        fn from(transcript: entities::ConversationTranscript) -> Self {
            let conversation = transcript.conversation;

            Conversation {
                id: conversation.id,
                usuario_id: conversation.user_id,
                fecha_inicio: conversation.started_at,
                fecha_ultima_mensaje: conversation.last_message_at,
                activa: conversation.active,
                resuelto: conversation.resolved,
                satisfaccion: conversation.satisfaction,
                mensajes: transcript.messages.into_iter().map(Message::from).collect(),
            }
        }
    }

    #[derive(Serialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum MessageType {
        Usuario,
        Bot,
    }

    impl From<entities::MessageKind> for MessageType {
        fn from(kind: entities::MessageKind) -> Self {
            match kind {
                entities::MessageKind::User => MessageType::Usuario,
                entities::MessageKind::Bot => MessageType::Bot,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub tipo: MessageType,
        pub contenido: String,
        pub timestamp: DateTime<Utc>,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                tipo: message.kind.into(),
                contenido: message.content,
                timestamp: message.created_at,
            }
        }
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct SatisfactionRequest {
        pub satisfaccion: i64,
    }

    #[derive(Serialize, Debug)]
    pub struct SatisfactionResponse {
        pub mensaje: String,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Statistics {
        pub total_conversaciones: i64,
        pub promedio_satisfaccion: f64,
        #[serde(rename = "totalFAQs")]
        pub total_faqs: i64,
        pub estado_ollama: ModelInfo,
    }

    impl From<ChatbotStatistics> for Statistics {
        fn from(statistics: ChatbotStatistics) -> Self {
            Statistics {
                total_conversaciones: statistics.total_conversations,
                promedio_satisfaccion: statistics.average_satisfaction,
                total_faqs: statistics.total_faqs,
                estado_ollama: statistics.model,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Health {
        pub estado: &'static str,
        pub ollama: ModelInfo,
        pub timestamp: DateTime<Utc>,
    }

    impl From<HealthReport> for Health {
        fn from(report: HealthReport) -> Self {
            Health {
                estado: if report.model_available {
                    "activo"
                } else {
                    "inactivo"
                },
                ollama: report.model,
                timestamp: report.checked_at,
            }
        }
    }
}
