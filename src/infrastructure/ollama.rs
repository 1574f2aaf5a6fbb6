//! Ollama model server gateway

use crate::core::assistant::build_prompt;
use crate::infrastructure::settings::Settings;
use crate::infrastructure::traits::ModelGateway;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const TECHNICAL_PROBLEM: &str =
    "Lo siento, tuve un problema técnico. ¿Podrías reformular tu pregunta?";
pub const CANNOT_CONNECT: &str = "No puedo conectarme con el servidor. Intenta más tarde.";
pub const UNEXPECTED_ERROR: &str = "Ocurrió un error inesperado. Por favor intenta de nuevo.";
pub const NO_ANSWER: &str = "No se pudo generar una respuesta";

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub num_predict: u32,
}

pub const SAMPLING: GenerationOptions = GenerationOptions {
    temperature: 0.6,
    top_p: 0.85,
    top_k: 40,
    num_predict: 500,
};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Model server status as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub modelo_actual: String,
    pub disponible: bool,
    pub total_modelos: usize,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
enum GatewayError {
    #[error("model server answered {0}")]
    Status(StatusCode),
    #[error("cannot reach model server: {0}")]
    Connection(reqwest::Error),
    #[error("unexpected model server failure: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            GatewayError::Connection(e)
        } else {
            GatewayError::Unexpected(e.to_string())
        }
    }
}

impl GatewayError {
    fn apology(&self) -> &'static str {
        match self {
            GatewayError::Status(_) => TECHNICAL_PROBLEM,
            GatewayError::Connection(_) => CANNOT_CONNECT,
            GatewayError::Unexpected(_) => UNEXPECTED_ERROR,
        }
    }
}

pub struct OllamaGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[injectable(ModelGateway)]
impl OllamaGateway {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> OllamaGateway {
        OllamaGateway::new(
            &settings.ollama_url,
            &settings.ollama_model,
            Duration::from_secs(settings.ollama_timeout_secs),
        )
    }
}

impl OllamaGateway {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> OllamaGateway {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Cannot configure HTTP client timeout ({e}), using defaults");
                reqwest::Client::new()
            });

        OllamaGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
        }
    }

    async fn try_generate(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, GatewayError> {
        let prompt =
            build_prompt(question, context).map_err(|e| GatewayError::Unexpected(e.to_string()))?;

        let url = format!("{}/api/generate", self.base_url);
        debug!("Sending prompt to {url}");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: false,
                options: SAMPLING,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await?;

        Ok(body.response.unwrap_or_else(|| NO_ANSWER.to_owned()))
    }

    async fn list_models(&self) -> Result<Vec<ModelTag>, GatewayError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status()));
        }

        let tags: TagsResponse = response.json().await?;

        Ok(tags.models)
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn generate_answer(&self, question: &str, context: Option<&str>) -> String {
        info!("Generating answer for: {question}");

        match self.try_generate(question, context).await {
            Ok(answer) => {
                info!("Answer generated");
                answer
            }
            Err(e) => {
                error!("{e}");
                e.apology().to_owned()
            }
        }
    }

    async fn check_model_available(&self) -> bool {
        match self.list_models().await {
            Ok(models) => {
                let found = models.iter().any(|m| m.name.contains(&self.model));

                if found {
                    info!("Model {} is available", self.model);
                } else {
                    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
                    warn!("Model {} not found, available: {names:?}", self.model);
                }

                found
            }
            Err(e) => {
                error!("Cannot check model availability: {e}");
                false
            }
        }
    }

    async fn model_info(&self) -> ModelInfo {
        let mut info = ModelInfo {
            modelo_actual: self.model.clone(),
            disponible: false,
            total_modelos: 0,
            url: self.base_url.clone(),
            error: None,
        };

        match self.list_models().await {
            Ok(models) => {
                info.disponible = true;
                info.total_modelos = models.len();
            }
            Err(GatewayError::Status(_)) => {
                info.error = Some("No se pudo conectar con Ollama".to_owned());
            }
            Err(e) => {
                info.error = Some(e.to_string());
            }
        }

        info
    }
}
