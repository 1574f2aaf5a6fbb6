//! Database and schema tests
//!
//! Tests SQLite migrations, schema constraints and the repositories the DI container hands out

mod common;

use chatbot_admin_api::infrastructure::entities::{Conversation, Message, MessageKind};
use chatbot_admin_api::infrastructure::traits::{
    ConversationRepository, FaqRepository, UserRepository,
};
use chatbot_admin_api::service_collection;
use chrono::{Duration, Utc};
use common::{
    cleanup, count, insert_conversation, insert_faq, insert_user, setup_test_db, use_settings,
};
use serial_test::serial;
use uuid::Uuid;

fn conversation(user_id: &str) -> Conversation {
    let now = Utc::now();

    Conversation {
        id: Uuid::new_v4(),
        user_id: user_id.to_owned(),
        started_at: now,
        last_message_at: now,
        active: true,
        resolved: false,
        satisfaction: None,
    }
}

fn message(conversation_id: Uuid, position: i64, kind: MessageKind) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id,
        position,
        kind,
        content: format!("Test {kind:?}"),
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn test_database_migrations_work() {
    let pool = setup_test_db().await;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'faqs\\_fts\\_%' ESCAPE '\\' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        tables,
        vec![
            "activities",
            "automated_messages",
            "conversations",
            "documents",
            "faqs",
            "faqs_fts",
            "messages",
            "users"
        ]
    );

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_satisfaction_check_constraint() {
    let pool = setup_test_db().await;

    let id = insert_conversation(&pool, "u-1", Utc::now(), true, None, 0).await;

    let result = sqlx::query("UPDATE conversations SET satisfaction = 6 WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await;
    assert!(result.is_err());

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_conversation_cascade_delete() {
    let pool = setup_test_db().await;

    let id = insert_conversation(&pool, "u-1", Utc::now(), true, None, 2).await;
    assert_eq!(count(&pool, "messages").await, 2);

    // Delete conversation (should cascade to messages)
    sqlx::query("DELETE FROM conversations WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(count(&pool, "messages").await, 0);

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_email_is_unique() {
    let pool = setup_test_db().await;

    insert_user(&pool, "ana@empresa.com", "secreto123", true).await;

    let result = sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (?, ?, 'x')")
        .bind(Uuid::new_v4())
        .bind("ana@empresa.com")
        .execute(&pool)
        .await;
    assert!(result.is_err());

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_create_conversation_is_atomic() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn ConversationRepository>();

    let ok = conversation("u-1");
    let messages = vec![
        message(ok.id, 0, MessageKind::User),
        message(ok.id, 1, MessageKind::Bot),
    ];
    let created = repo.create_conversation(ok.clone(), messages).await.unwrap();
    assert_eq!(created.id, ok.id);
    assert_eq!(created.user_id, "u-1");

    // duplicate positions violate the (conversation_id, position) key
    let broken = conversation("u-1");
    let messages = vec![
        message(broken.id, 0, MessageKind::User),
        message(broken.id, 0, MessageKind::Bot),
    ];
    assert!(repo.create_conversation(broken, messages).await.is_err());

    assert_eq!(count(&pool, "conversations").await, 1);
    assert_eq!(count(&pool, "messages").await, 2);

    let transcripts = repo.list_transcripts("u-1").await.unwrap();
    assert_eq!(transcripts.len(), 1);
    assert_eq!(transcripts[0].messages[0].kind, MessageKind::User);
    assert_eq!(transcripts[0].messages[1].kind, MessageKind::Bot);

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_set_satisfaction_reports_missing_conversation() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn ConversationRepository>();

    let id = insert_conversation(&pool, "u-1", Utc::now(), true, None, 0).await;

    assert!(repo.set_satisfaction(id, 2).await.unwrap());
    assert!(!repo.set_satisfaction(Uuid::new_v4(), 2).await.unwrap());

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_faq_search_matches_any_keyword() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn FaqRepository>();

    insert_faq(&pool, "¿Cuál es el horario?", "De 9 a 18").await;
    insert_faq(&pool, "¿Hay estacionamiento?", "Sí, en el sótano").await;
    insert_faq(&pool, "¿Dónde como?", "En la cafetería, en horario corrido").await;
    insert_faq(&pool, "¿Qué horario tiene la cafetería?", "De 8 a 16").await;
    insert_faq(&pool, "¿Horario de verano?", "Viernes hasta las 14").await;

    let keywords = vec!["horario".to_owned(), "estacionamiento".to_owned()];
    let faqs = repo.search_any_keyword(&keywords, 3).await.unwrap();
    assert_eq!(faqs.len(), 3);
    assert_eq!(faqs[0].question, "¿Cuál es el horario?");
    assert_eq!(faqs[1].question, "¿Hay estacionamiento?");

    let none = repo
        .search_any_keyword(&["piscina".to_owned()], 3)
        .await
        .unwrap();
    assert!(none.is_empty());

    assert!(repo.search_any_keyword(&[], 3).await.unwrap().is_empty());
    assert_eq!(repo.count().await.unwrap(), 5);

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_update_password_clears_reset_token() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn UserRepository>();

    let id = insert_user(&pool, "ana@empresa.com", "secreto123", true).await;

    repo.store_reset_token(id, "token-abc", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    let holder = repo.find_by_reset_token("token-abc").await.unwrap().unwrap();
    assert_eq!(holder.id, id);

    repo.update_password(id, "new-hash", Utc::now()).await.unwrap();

    assert!(repo.find_by_reset_token("token-abc").await.unwrap().is_none());
    let user = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(user.password_hash, "new-hash");
    assert!(user.reset_token_expires.is_none());
    assert!(user.updated_at.is_some());

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_faq_search_matches_whole_words_ignoring_accents() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn FaqRepository>();

    insert_faq(&pool, "¿Cuántos DÍAS de vacaciones tengo?", "Tienes 15 días al año.").await;
    insert_faq(&pool, "¿Cuál es el horario?", "De 9 a 18").await;

    // substrings of a word do not match
    let faqs = repo
        .search_any_keyword(&["hora".to_owned()], 3)
        .await
        .unwrap();
    assert!(faqs.is_empty());

    let faqs = repo
        .search_any_keyword(&["dias".to_owned()], 3)
        .await
        .unwrap();
    assert_eq!(faqs.len(), 1);
    assert_eq!(faqs[0].question, "¿Cuántos DÍAS de vacaciones tengo?");

    let faqs = repo
        .search_any_keyword(&["cuál".to_owned()], 3)
        .await
        .unwrap();
    assert_eq!(faqs.len(), 1);
    assert_eq!(faqs[0].answer, "De 9 a 18");

    cleanup();
}

#[tokio::test]
#[serial]
async fn test_faq_search_follows_faq_updates() {
    let pool = setup_test_db().await;
    use_settings("http://127.0.0.1:9");
    let provider = service_collection().build_provider().unwrap();
    let repo = provider.get_required::<dyn FaqRepository>();

    insert_faq(&pool, "¿Hay estacionamiento?", "Sí, en el sótano").await;

    sqlx::query("UPDATE faqs SET answer = 'No, usa el transporte público'")
        .execute(&pool)
        .await
        .unwrap();

    let sotano = repo
        .search_any_keyword(&["sotano".to_owned()], 3)
        .await
        .unwrap();
    assert!(sotano.is_empty());

    let transporte = repo
        .search_any_keyword(&["transporte".to_owned()], 3)
        .await
        .unwrap();
    assert_eq!(transporte.len(), 1);

    sqlx::query("DELETE FROM faqs").execute(&pool).await.unwrap();

    let transporte = repo
        .search_any_keyword(&["transporte".to_owned()], 3)
        .await
        .unwrap();
    assert!(transporte.is_empty());

    cleanup();
}
