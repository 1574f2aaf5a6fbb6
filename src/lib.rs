//! Admin backend for the onboarding chatbot - Library exports for testing
//!

pub mod api;
pub mod core;
pub mod infrastructure;

use crate::core::services::{MyAuthService, MyChatbotService, MyMetricsService};
use crate::core::tokens::TokenIssuer;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::ollama::OllamaGateway;
use crate::infrastructure::repositories::{
    DbConversationRepository, DbFaqRepository, DbMetricsRepository, DbUserRepository,
};
use crate::infrastructure::settings::Settings;
use di::{Injectable, ServiceCollection};

/// Registers everything the HTTP handlers resolve.
pub fn service_collection() -> ServiceCollection {
    let mut services = ServiceCollection::new();

    services
        .add(Settings::singleton())
        .add(DatabaseConnection::singleton())
        .add(OllamaGateway::singleton())
        .add(TokenIssuer::singleton())
        .add(DbUserRepository::scoped())
        .add(DbConversationRepository::scoped())
        .add(DbFaqRepository::scoped())
        .add(DbMetricsRepository::scoped())
        .add(MyAuthService::scoped())
        .add(MyChatbotService::scoped())
        .add(MyMetricsService::scoped());

    services
}
