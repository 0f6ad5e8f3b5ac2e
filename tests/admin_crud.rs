// Admin dashboard CRUD against a mocked backend.
use gsa_portal::admin::{AdminDashboard, AdminError, AdminPanel, FormMode};
use gsa_portal::client::ApiClient;
use gsa_portal::context::TestContext;
use gsa_portal::model::{Event, EventType, GalleryImage, Officer};
use gsa_portal::session::{RouteGate, SessionManager};
use gsa_portal::storage::{LocalStorage, TOKEN_KEY};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "admin.jwt.token";

const EVENT_LIST: &str = r#"[
    {"id": "e1", "title": "Welcome Social", "date": "2025-09-05",
     "time": "5:30 PM", "location": "Union", "event_type": "social"}
]"#;

fn setup(server: &ServerGuard) -> (Arc<TestContext>, ApiClient, LocalStorage) {
    let ctx = Arc::new(TestContext::new());
    let storage = LocalStorage::new(ctx.clone());
    storage.set_item(TOKEN_KEY, TOKEN).unwrap();
    let client = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
    (ctx, client, storage)
}

#[tokio::test]
async fn test_create_success_closes_form_and_refetches() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/events")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .match_body(Matcher::PartialJson(serde_json::json!({"title": "Welcome Social"})))
        .with_status(200)
        .with_body(
            r#"{"id": "e1", "title": "Welcome Social", "date": "2025-09-05",
                "time": "5:30 PM", "event_type": "social"}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/events")
        .with_status(200)
        .with_body(EVENT_LIST)
        .expect(1)
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let mut panel: AdminPanel<Event> = AdminPanel::new(client, storage);

    let draft = panel.open_create();
    draft.title = "Welcome Social".to_string();
    draft.date = "2025-09-05".to_string();
    draft.time = "5:30 PM".to_string();
    draft.event_type = EventType::Social;

    let saved = panel.submit().await.unwrap();
    assert_eq!(saved.id, "e1");
    assert!(panel.form().is_none());
    assert_eq!(panel.items().len(), 1);

    create.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_failed_create_preserves_form_and_list() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/api/events")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Event date is in the past"}"#)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/events")
        .with_status(200)
        .with_body(EVENT_LIST)
        .expect(1)
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let mut panel: AdminPanel<Event> = AdminPanel::new(client, storage);
    panel.refresh().await.unwrap();

    let draft = panel.open_create();
    draft.title = "Old Party".to_string();
    draft.date = "2001-01-01".to_string();
    draft.time = "8:00 PM".to_string();
    let before = panel.form().cloned();

    let err = panel.submit().await.unwrap_err();
    assert_eq!(
        err.user_message(&AdminPanel::<Event>::save_fallback()),
        "Event date is in the past"
    );
    assert_eq!(panel.form().cloned(), before);
    assert_eq!(panel.items().len(), 1);

    // Only the initial refresh: no refetch after a failed mutation.
    list.assert_async().await;
}

#[tokio::test]
async fn test_edit_sends_put_for_existing_record() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/api/events")
        .with_status(200)
        .with_body(EVENT_LIST)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/events/e1")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "title": "Welcome Social",
            "location": "Grad Lounge",
            "date": "2025-09-05"
        })))
        .with_status(200)
        .with_body(
            r#"{"id": "e1", "title": "Welcome Social", "date": "2025-09-05",
                "time": "5:30 PM", "location": "Grad Lounge", "event_type": "social"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let mut panel: AdminPanel<Event> = AdminPanel::new(client, storage);
    panel.refresh().await.unwrap();

    panel.open_edit("e1").unwrap().location = "Grad Lounge".to_string();
    assert_eq!(panel.form().unwrap().mode, FormMode::Edit("e1".to_string()));

    let saved = panel.submit().await.unwrap();
    assert_eq!(saved.location, "Grad Lounge");
    update.assert_async().await;
}

#[tokio::test]
async fn test_failed_delete_uses_fallback_and_keeps_list() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/api/officers")
        .with_status(200)
        .with_body(
            r#"[{"id": "o1", "name": "Ada", "role": "President", "order": 1},
                {"id": "o2", "name": "Grace", "role": "Treasurer", "order": 2}]"#,
        )
        .create_async()
        .await;
    let _delete = server
        .mock("DELETE", "/api/officers/o2")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let mut panel: AdminPanel<Officer> = AdminPanel::new(client, storage);
    panel.refresh().await.unwrap();

    let err = panel.delete("o2").await.unwrap_err();
    assert_eq!(
        err.user_message(&AdminPanel::<Officer>::delete_fallback()),
        "Failed to delete officer"
    );
    assert_eq!(panel.items().len(), 2);

    // A new officer goes after the existing ones.
    assert_eq!(panel.open_create().order, 3);
}

#[tokio::test]
async fn test_token_is_read_at_call_time() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let mut panel: AdminPanel<GalleryImage> = AdminPanel::new(client, storage.clone());
    panel.open_create().url = "https://img.example/1.jpg".to_string();

    storage.remove_item(TOKEN_KEY).unwrap();
    let err = panel.submit().await.unwrap_err();
    assert!(matches!(err, AdminError::NotAuthenticated));
    assert!(panel.form().is_some());
    post.assert_async().await;
}

#[tokio::test]
async fn test_dashboard_gate_follows_session() {
    let mut server = Server::new_async().await;
    let _verify = server
        .mock("GET", "/api/auth/verify")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .with_status(200)
        .with_body(r#"{"valid": true, "username": "admin"}"#)
        .create_async()
        .await;
    let _events = server
        .mock("GET", "/api/events")
        .with_status(200)
        .with_body(EVENT_LIST)
        .create_async()
        .await;
    let _officers = server
        .mock("GET", "/api/officers")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _gallery = server
        .mock("GET", "/api/gallery")
        .with_status(503)
        .create_async()
        .await;

    let (_ctx, client, storage) = setup(&server);
    let session = SessionManager::new(client.clone(), storage.clone());

    assert!(matches!(
        AdminDashboard::open(&session, &client),
        Err(RouteGate::Pending)
    ));

    session.bootstrap().await;
    let mut dash = AdminDashboard::open(&session, &client).unwrap();

    // Gallery fails; the other panels still load.
    assert!(dash.refresh_all().await.is_err());
    assert_eq!(dash.events.items().len(), 1);
    assert!(dash.officers.items().is_empty());

    session.logout();
    assert!(matches!(
        AdminDashboard::open(&session, &client),
        Err(RouteGate::RedirectToLogin)
    ));
}
