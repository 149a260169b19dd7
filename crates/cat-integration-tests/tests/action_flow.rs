//! End-to-end flows through the full pipeline: grant, execute, audit.

mod common;

use cat_audit::{HistoryQuery, LogStatus};
use cat_core::{ActionCategory, ActionId};
use cat_executor::{ActionRequest, ExecutionStatus};
use cat_permissions::GrantOptions;
use common::{Pipeline, actor, user};
use serde_json::json;

#[tokio::test]
async fn grant_then_execute_round_trip() {
    let pipeline = Pipeline::new();

    pipeline
        .permissions
        .grant_action(
            &user(),
            &ActionId::new("send_message"),
            ActionCategory::Communication,
            GrantOptions {
                requires_confirmation: Some(false),
                ..GrantOptions::default()
            },
        )
        .await
        .unwrap();

    let outcome = pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new(
                "send_message",
                json!({"recipient_id": "u_bob", "content": "hi"}),
            ),
        )
        .await;

    assert_eq!(outcome.status, ExecutionStatus::Completed);
    assert_eq!(pipeline.app.messages().len(), 1);
    assert_eq!(pipeline.app.messages()[0].content, "hi");

    // Exactly one log row, terminal status completed.
    let history = pipeline
        .executor
        .action_history(&user(), &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LogStatus::Completed);
    assert_eq!(history[0].action_id, ActionId::new("send_message"));
}

#[tokio::test]
async fn category_grant_with_confirmation_then_confirm() {
    let pipeline = Pipeline::new();

    // Whole entities category, everything gated behind confirmation.
    pipeline
        .permissions
        .grant_category(
            &user(),
            ActionCategory::Entities,
            GrantOptions {
                requires_confirmation: Some(true),
                ..GrantOptions::default()
            },
        )
        .await
        .unwrap();

    let parked = pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new("create_product", json!({"title": "Handmade mug"})),
        )
        .await;
    assert_eq!(parked.status, ExecutionStatus::PendingConfirmation);
    let pending_id = parked.pending_action_id.expect("confirmation handle");
    assert!(pipeline.app.products_of(&user()).is_empty(), "nothing inserted yet");

    let confirmed = pipeline
        .executor
        .confirm_pending_action(&user(), &actor(), &pending_id)
        .await;
    assert_eq!(confirmed.status, ExecutionStatus::Completed);

    let products = pipeline.app.products_of(&user());
    assert_eq!(products.len(), 1, "insert ran exactly once");
    assert_eq!(products[0].title, "Handmade mug");
}

#[tokio::test]
async fn daily_limit_cuts_off_fourth_attempt() {
    let pipeline = Pipeline::new();

    pipeline
        .permissions
        .grant_action(
            &user(),
            &ActionId::new("send_message"),
            ActionCategory::Communication,
            GrantOptions {
                requires_confirmation: Some(false),
                daily_limit: Some(3),
                ..GrantOptions::default()
            },
        )
        .await
        .unwrap();

    for i in 0..3 {
        let outcome = pipeline
            .executor
            .execute_action(
                &user(),
                &actor(),
                ActionRequest::new(
                    "send_message",
                    json!({"recipient_id": "u_bob", "content": format!("hello {i}")}),
                ),
            )
            .await;
        assert_eq!(outcome.status, ExecutionStatus::Completed);
    }

    let fourth = pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new(
                "send_message",
                json!({"recipient_id": "u_bob", "content": "one too many"}),
            ),
        )
        .await;
    assert_eq!(fourth.status, ExecutionStatus::Denied);
    assert!(fourth.error.unwrap().contains("3/3"));
    assert_eq!(pipeline.app.messages().len(), 3);
}

#[tokio::test]
async fn history_filters_by_action_and_status() {
    let pipeline = Pipeline::new();

    pipeline
        .permissions
        .grant_category(
            &user(),
            ActionCategory::Communication,
            GrantOptions {
                requires_confirmation: Some(false),
                ..GrantOptions::default()
            },
        )
        .await
        .unwrap();

    pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new(
                "send_message",
                json!({"recipient_id": "u_bob", "content": "hi"}),
            ),
        )
        .await;
    pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new("post_timeline_update", json!({"content": "gm"})),
        )
        .await;
    // A failing attempt: missing required field.
    pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new("send_message", json!({"content": "no recipient"})),
        )
        .await;

    let all = pipeline
        .executor
        .action_history(&user(), &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let messages_only = pipeline
        .executor
        .action_history(
            &user(),
            &HistoryQuery::default().with_action(ActionId::new("send_message")),
        )
        .await
        .unwrap();
    assert_eq!(messages_only.len(), 2);

    let failed_only = pipeline
        .executor
        .action_history(
            &user(),
            &HistoryQuery::default().with_status(LogStatus::Failed),
        )
        .await
        .unwrap();
    assert_eq!(failed_only.len(), 1);
    assert_eq!(failed_only[0].action_id, ActionId::new("send_message"));
}

#[tokio::test]
async fn conversation_context_travels_through_confirmation() {
    let pipeline = Pipeline::new();
    pipeline
        .permissions
        .grant_category(&user(), ActionCategory::Payments, GrantOptions::default())
        .await
        .unwrap();

    let parked = pipeline
        .executor
        .execute_action(
            &user(),
            &actor(),
            ActionRequest::new(
                "send_payment",
                json!({"recipient_id": "u_bob", "amount_sats": 250}),
            )
            .with_conversation(cat_core::ConversationId::new("conv_7"))
            .with_message(cat_core::MessageId::new("msg_42")),
        )
        .await;
    let pending_id = parked.pending_action_id.unwrap();

    pipeline
        .executor
        .confirm_pending_action(&user(), &actor(), &pending_id)
        .await;

    let history = pipeline
        .executor
        .action_history(&user(), &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].conversation_id,
        Some(cat_core::ConversationId::new("conv_7"))
    );
    assert_eq!(history[0].message_id, Some(cat_core::MessageId::new("msg_42")));
    assert_eq!(history[0].sats_amount, Some(250));
}
