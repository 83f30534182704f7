//! Application lifecycle against a real (SQLite) store.
//!
//! Run with: `cargo test --test applications_test`
mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use engagement_core::ErrorKind;
use engagement_core::lifecycle::applications::Submission;
use engagement_core::models::applications::{ApplicationContentPatch, ApplicationStatus};
use engagement_core::models::notifications::NotificationKind;
use engagement_core::{Collaborators, EngagementOrchestrator};

#[tokio::test]
async fn test_create_application_notifies_company() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let view = h
        .core
        .create_application(application_for(&project, &alice))
        .await
        .expect("Application should be created");

    assert_eq!(view.application.status, ApplicationStatus::Submitted);
    assert!(view.application.response_date.is_none());
    assert_eq!(view.project.map(|p| p.id), Some(project.id));
    assert_eq!(view.freelance.map(|f| f.id), Some(alice.id));

    assert_eq!(
        h.sink.delivered_to(company.id),
        vec![NotificationKind::ApplicationReceived]
    );
    assert_eq!(h.mailer.templates_sent_to(&company.email).len(), 1);
}

#[tokio::test]
async fn test_duplicate_active_application_is_conflict() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    h.core
        .create_application(application_for(&project, &alice))
        .await
        .unwrap();
    let err = h
        .core
        .create_application(application_for(&project, &alice))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationReceived), 1);
}

#[tokio::test]
async fn test_reapplying_after_withdrawal_reuses_the_row() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let first = h
        .core
        .create_application(application_for(&project, &alice))
        .await
        .unwrap()
        .application;
    let withdrawn = h.core.withdraw_application(first.id, alice.id).await.unwrap();
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert!(withdrawn.response_date.is_some());

    let mut retry = application_for(&project, &alice);
    retry.proposed_rate = 600.0;
    retry.cover_letter = "Available sooner than expected.".to_string();
    let submission = h.core.submit_application(retry).await.unwrap();

    let reactivated = match submission {
        Submission::Reactivated(application) => application,
        Submission::Created(_) => panic!("Expected the withdrawn application to be reactivated"),
    };
    assert_eq!(reactivated.id, first.id);
    assert_eq!(reactivated.status, ApplicationStatus::Submitted);
    assert!(reactivated.response_date.is_none());
    assert_eq!(reactivated.proposed_rate, 600.0);
    assert_eq!(reactivated.cover_letter, "Available sooner than expected.");

    let rows = h.core.list_freelance_applications(alice.id).await.unwrap();
    assert_eq!(rows.len(), 1);

    // Reactivation does not announce a new candidacy.
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationReceived), 1);
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationWithdrawn), 1);
}

#[tokio::test]
async fn test_accepting_on_single_hire_project_rejects_open_peers() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;
    let bob = seed_freelance(&h.db, "Bob").await;
    let carol = seed_freelance(&h.db, "Carol").await;
    let dave = seed_freelance(&h.db, "Dave").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    let b = h.core.create_application(application_for(&project, &bob)).await.unwrap().application;
    let c = h.core.create_application(application_for(&project, &carol)).await.unwrap().application;
    let d = h.core.create_application(application_for(&project, &dave)).await.unwrap().application;

    h.core
        .update_application_status(c.id, ApplicationStatus::UnderReview, None)
        .await
        .unwrap();
    h.core.withdraw_application(d.id, dave.id).await.unwrap();

    let change = h.core.accept_application(a.id).await.unwrap();

    assert_eq!(change.application.status, ApplicationStatus::Accepted);
    assert!(change.application.response_date.is_some());

    let mut rejected_ids: Vec<_> = change.auto_rejected.iter().map(|r| r.id).collect();
    rejected_ids.sort();
    let mut expected = vec![b.id, c.id];
    expected.sort();
    assert_eq!(rejected_ids, expected);
    assert!(change
        .auto_rejected
        .iter()
        .all(|r| r.status == ApplicationStatus::Rejected && r.response_date.is_some()));

    let dave_row = h.core.get_application(d.id).await.unwrap().application;
    assert_eq!(dave_row.status, ApplicationStatus::Withdrawn);

    // No submitted or under-review application is left on the project.
    let open: Vec<_> = h
        .core
        .list_project_applications(project.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.application.status.is_active())
        .collect();
    assert!(open.is_empty());

    assert_eq!(h.sink.delivered_to(alice.id), vec![NotificationKind::ApplicationAccepted]);
    assert_eq!(h.sink.delivered_to(bob.id), vec![NotificationKind::ApplicationAutoRejected]);
    assert_eq!(h.sink.delivered_to(carol.id), vec![NotificationKind::ApplicationAutoRejected]);
    assert!(h.sink.delivered_to(dave.id).is_empty());

    let conversations = h.conversations.opened();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].freelance_id, alice.id);
    assert_eq!(conversations[0].company_id, company.id);
    assert_eq!(conversations[0].application_id, Some(a.id));
    assert_eq!(change.conversation.map(|c| c.id), Some(conversations[0].id));
}

#[tokio::test]
async fn test_multiple_hire_project_keeps_peers_open() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, true).await;
    let alice = seed_freelance(&h.db, "Alice").await;
    let bob = seed_freelance(&h.db, "Bob").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    let b = h.core.create_application(application_for(&project, &bob)).await.unwrap().application;

    let change = h.core.accept_application(a.id).await.unwrap();
    assert!(change.auto_rejected.is_empty());
    assert!(change.conversation.is_none());

    let bob_row = h.core.get_application(b.id).await.unwrap().application;
    assert_eq!(bob_row.status, ApplicationStatus::Submitted);
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationAutoRejected), 0);
}

#[tokio::test]
async fn test_filled_single_hire_project_refuses_a_second_acceptance() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;
    let bob = seed_freelance(&h.db, "Bob").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    let b = h.core.create_application(application_for(&project, &bob)).await.unwrap().application;
    h.core.accept_application(a.id).await.unwrap();

    let resubmitted = h.core.submit_application(application_for(&project, &bob)).await.unwrap();
    assert!(matches!(resubmitted, Submission::Reactivated(_)));
    assert_eq!(resubmitted.application().id, b.id);

    let err = h.core.accept_application(b.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let bob_row = h.core.get_application(b.id).await.unwrap().application;
    assert_eq!(bob_row.status, ApplicationStatus::Submitted);
    let stats = h.core.application_stats(Some(project.id)).await.unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationAccepted), 1);
}

#[tokio::test]
async fn test_failing_conversation_service_keeps_the_acceptance() {
    for outage in [Outage::Failing, Outage::Hanging] {
        let h = Harness::with_conversations(RecordingConversations::broken(outage)).await;
        let company = seed_company(&h.db, "Acme").await;
        let project = seed_project(&h.db, &company, false).await;
        let alice = seed_freelance(&h.db, "Alice").await;
        let bob = seed_freelance(&h.db, "Bob").await;

        let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
        let b = h.core.create_application(application_for(&project, &bob)).await.unwrap().application;

        let started = Instant::now();
        let change = h.core.accept_application(a.id).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(change.conversation.is_none());
        assert_eq!(change.application.status, ApplicationStatus::Accepted);
        assert_eq!(change.auto_rejected.len(), 1);
        assert_eq!(change.auto_rejected[0].id, b.id);

        let alice_row = h.core.get_application(a.id).await.unwrap().application;
        assert_eq!(alice_row.status, ApplicationStatus::Accepted);
        let bob_row = h.core.get_application(b.id).await.unwrap().application;
        assert_eq!(bob_row.status, ApplicationStatus::Rejected);

        assert_eq!(h.sink.delivered_to(bob.id), vec![NotificationKind::ApplicationAutoRejected]);
        assert!(h.conversations.opened().is_empty());
    }
}

#[tokio::test]
async fn test_decided_applications_are_frozen() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    h.core
        .update_application_status(a.id, ApplicationStatus::Rejected, None)
        .await
        .unwrap();

    let err = h.core.accept_application(a.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h.core.withdraw_application(a.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h
        .core
        .update_application_status(a.id, ApplicationStatus::Submitted, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_cannot_withdraw_accepted_application() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    h.core.accept_application(a.id).await.unwrap();

    let err = h.core.withdraw_application(a.id, alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h
        .core
        .create_application(application_for(&project, &alice))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_withdrawing_someone_elses_application_is_not_found() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;
    let mallory = seed_freelance(&h.db, "Mallory").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    let err = h.core.withdraw_application(a.id, mallory.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_concurrent_withdrawals_have_one_winner() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;

    let (first, second) = tokio::join!(
        h.core.withdraw_application(a.id, alice.id),
        h.core.withdraw_application(a.id, alice.id)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);
    assert_eq!(h.sink.count_of(NotificationKind::ApplicationWithdrawn), 1);
}

#[tokio::test]
async fn test_content_is_editable_only_while_submitted() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let alice = seed_freelance(&h.db, "Alice").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;

    let updated = h
        .core
        .update_application_content(
            a.id,
            ApplicationContentPatch {
                proposed_rate: Some(480.0),
                cover_letter: None,
            },
            alice.id,
        )
        .await
        .unwrap();
    assert_eq!(updated.proposed_rate, 480.0);
    assert_eq!(updated.cover_letter, a.cover_letter);

    let err = h
        .core
        .update_application_content(a.id, ApplicationContentPatch::default(), alice.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    h.core
        .update_application_status(a.id, ApplicationStatus::UnderReview, None)
        .await
        .unwrap();
    let err = h
        .core
        .update_application_content(
            a.id,
            ApplicationContentPatch {
                proposed_rate: None,
                cover_letter: Some("Updated".to_string()),
            },
            alice.id,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_application_stats_and_delete() {
    let h = Harness::new().await;
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, true).await;
    let alice = seed_freelance(&h.db, "Alice").await;
    let bob = seed_freelance(&h.db, "Bob").await;
    let carol = seed_freelance(&h.db, "Carol").await;

    let a = h.core.create_application(application_for(&project, &alice)).await.unwrap().application;
    let b = h.core.create_application(application_for(&project, &bob)).await.unwrap().application;
    h.core.create_application(application_for(&project, &carol)).await.unwrap();

    h.core.accept_application(a.id).await.unwrap();
    h.core.withdraw_application(b.id, bob.id).await.unwrap();

    let stats = h.core.application_stats(Some(project.id)).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.withdrawn, 1);
    assert_eq!(stats.submitted, 1);

    h.core.delete_application(b.id).await.unwrap();
    let err = h.core.delete_application(b.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.core.application_stats(Some(project.id)).await.unwrap().total, 2);
}

#[tokio::test]
async fn test_failing_notification_sink_does_not_fail_the_operation() {
    let db = test_db().await;
    let mailer = Arc::new(RecordingMailer::default());
    let core = EngagementOrchestrator::new(
        db.clone(),
        Collaborators {
            notifications: Arc::new(BrokenSink::Failing),
            email: mailer.clone(),
            conversations: Arc::new(RecordingConversations::default()),
            moderator: Arc::new(KeywordModerator::banning(Vec::new())),
        },
        fast_options(),
    );
    let company = seed_company(&db, "Acme").await;
    let project = seed_project(&db, &company, false).await;
    let alice = seed_freelance(&db, "Alice").await;

    let view = core
        .create_application(application_for(&project, &alice))
        .await
        .expect("Notification failure must not fail the submission");
    assert_eq!(view.application.status, ApplicationStatus::Submitted);

    // The email channel is independent of the in-app one.
    assert_eq!(mailer.templates_sent_to(&company.email).len(), 1);
}

#[tokio::test]
async fn test_hanging_notification_sink_is_bounded_by_timeout() {
    let db = test_db().await;
    let core = EngagementOrchestrator::new(
        db.clone(),
        Collaborators {
            notifications: Arc::new(BrokenSink::Hanging),
            email: Arc::new(RecordingMailer::default()),
            conversations: Arc::new(RecordingConversations::default()),
            moderator: Arc::new(KeywordModerator::banning(Vec::new())),
        },
        fast_options(),
    );
    let company = seed_company(&db, "Acme").await;
    let project = seed_project(&db, &company, false).await;
    let alice = seed_freelance(&db, "Alice").await;

    let started = Instant::now();
    let view = core
        .create_application(application_for(&project, &alice))
        .await
        .unwrap();
    assert_eq!(view.application.status, ApplicationStatus::Submitted);
    assert!(started.elapsed() < Duration::from_secs(5));

    let stored = core.get_application(view.application.id).await.unwrap();
    assert_eq!(stored.application.id, view.application.id);
}
