//! Store-backed collaborators and the cached directory.
//!
//! Run with: `cargo test --test effects_test`
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use engagement_core::db::applications as application_db;
use engagement_core::db::conversations as conversation_db;
use engagement_core::db::notifications as notification_db;
use engagement_core::directory::Directory;
use engagement_core::effects::conversations::DbConversationService;
use engagement_core::effects::email::DisabledEmailSender;
use engagement_core::effects::moderation::AllowAllModerator;
use engagement_core::effects::notifications::DbNotificationSink;
use engagement_core::effects::{ConversationService, NotificationSink};
use engagement_core::models::conversations::ConversationKey;
use engagement_core::models::notifications::{NotificationDraft, NotificationKind};
use engagement_core::models::projects;
use engagement_core::{Collaborators, EngagementOrchestrator};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set, SqlErr};

#[tokio::test]
async fn test_db_sink_links_each_user_once() {
    let db = test_db().await;
    let sink = DbNotificationSink::new(db.clone(), None);
    let company = seed_company(&db, "Acme").await;

    let notification = sink
        .create_notification(NotificationDraft {
            title: "New application".to_string(),
            message: "Alice applied".to_string(),
            kind: NotificationKind::ApplicationReceived,
            metadata: serde_json::json!({ "project_id": "p-1" }),
        })
        .await
        .unwrap();

    sink.link_to_user(company.id, notification.id).await.unwrap();
    sink.link_to_user(company.id, notification.id).await.unwrap();

    let inbox = notification_db::get_notifications_for_user(&db, company.id)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::ApplicationReceived);
    assert_eq!(inbox[0].metadata["project_id"], "p-1");
}

#[tokio::test]
async fn test_db_conversation_service_reuses_the_conversation() {
    let db = test_db().await;
    let service = DbConversationService::new(db.clone());
    let company = seed_company(&db, "Acme").await;
    let alice = seed_freelance(&db, "Alice").await;

    let key = ConversationKey {
        freelance_id: alice.id,
        company_id: company.id,
        application_id: None,
    };
    let first = service.create_or_get(key).await.unwrap();
    let second = service.create_or_get(key).await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(first.application_id.is_none());
}

#[tokio::test]
async fn test_racing_conversation_opens_share_one_row() {
    let db = test_db().await;
    let service = DbConversationService::new(db.clone());
    let company = seed_company(&db, "Acme").await;
    let project = seed_project(&db, &company, false).await;
    let alice = seed_freelance(&db, "Alice").await;
    let application = application_db::insert_application(&db, application_for(&project, &alice))
        .await
        .unwrap();

    let key = ConversationKey {
        freelance_id: alice.id,
        company_id: company.id,
        application_id: Some(application.id),
    };
    let (first, second) = tokio::join!(service.create_or_get(key), service.create_or_get(key));
    assert_eq!(first.unwrap().id, second.unwrap().id);

    let duplicate = conversation_db::insert_conversation(&db, key).await.unwrap_err();
    assert!(matches!(
        duplicate.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_store_backed_orchestrator_records_notifications() {
    let db = test_db().await;
    let core = EngagementOrchestrator::new(
        db.clone(),
        Collaborators {
            notifications: Arc::new(DbNotificationSink::new(db.clone(), None)),
            email: Arc::new(DisabledEmailSender),
            conversations: Arc::new(DbConversationService::new(db.clone())),
            moderator: Arc::new(AllowAllModerator),
        },
        fast_options(),
    );
    let company = seed_company(&db, "Acme").await;
    let project = seed_project(&db, &company, false).await;
    let alice = seed_freelance(&db, "Alice").await;
    let bob = seed_freelance(&db, "Bob").await;

    let a = core.create_application(application_for(&project, &alice)).await.unwrap().application;
    core.create_application(application_for(&project, &bob)).await.unwrap();
    let change = core.accept_application(a.id).await.unwrap();

    let conversation = change.conversation.expect("Conversation should be opened");
    assert_eq!(conversation.application_id, Some(a.id));

    let company_inbox = notification_db::get_notifications_for_user(&db, company.id)
        .await
        .unwrap();
    assert_eq!(company_inbox.len(), 2);

    let bob_inbox = notification_db::get_notifications_for_user(&db, bob.id)
        .await
        .unwrap();
    assert_eq!(bob_inbox.len(), 1);
    assert_eq!(bob_inbox[0].kind, NotificationKind::ApplicationAutoRejected);
}

#[tokio::test]
async fn test_directory_caches_until_invalidated() {
    let db = test_db().await;
    let directory = Directory::new(db.clone(), Duration::from_secs(60));
    let company = seed_company(&db, "Acme").await;
    let project = seed_project(&db, &company, false).await;

    let cached = directory.project(project.id).await.unwrap().unwrap();
    assert_eq!(cached.title, project.title);

    let mut renamed = project.clone().into_active_model();
    renamed.title = Set("Renamed".to_string());
    let renamed: projects::Model = renamed.update(&db).await.unwrap();

    assert_eq!(directory.project(project.id).await.unwrap().unwrap().title, project.title);

    directory.invalidate(project.id).await;
    assert_eq!(
        directory.project(project.id).await.unwrap().unwrap().title,
        renamed.title
    );

    assert!(directory.freelance(uuid::Uuid::new_v4()).await.unwrap().is_none());
}
