use reqwest::StatusCode;
use rookery_tests::harness::client::{TestClient, befriend};
use rookery_tests::harness::server::TestServer;
use serde_json::json;

fn kinds(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn activity_produces_notifications_newest_first() {
    let server = TestServer::spawn().await.unwrap();
    let alice = TestClient::signup(&server, "alice@example.com").await.unwrap();
    let bob = TestClient::signup(&server, "bob@example.com").await.unwrap();

    let post = alice.create_post("look").await.unwrap().ok().unwrap();
    let post_id = post["id"].as_i64().unwrap();

    bob.follow(alice.id()).await.unwrap().ok().unwrap();
    bob.post(&format!("/posts/{post_id}/like"), None).await.unwrap().ok().unwrap();
    bob.post(
        &format!("/posts/{post_id}/comments"),
        Some(json!({ "content": "nice" })),
    )
    .await
    .unwrap()
    .ok()
    .unwrap();
    alice.follow(bob.id()).await.unwrap().ok().unwrap();
    let conv = bob.open_conversation(alice.id()).await.unwrap().ok().unwrap();
    bob.send_message(conv["id"].as_i64().unwrap(), "hey")
        .await
        .unwrap()
        .ok()
        .unwrap();

    let list = alice.get("/notifications").await.unwrap().ok().unwrap();
    assert_eq!(kinds(&list), ["message", "comment", "like", "follow"]);

    // Own activity does not notify.
    alice.post(&format!("/posts/{post_id}/like"), None).await.unwrap().ok().unwrap();
    let list = alice.get("/notifications").await.unwrap().ok().unwrap();
    assert_eq!(list.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn marking_notifications_read() {
    let server = TestServer::spawn().await.unwrap();
    let alice = TestClient::signup(&server, "alice@example.com").await.unwrap();
    let bob = TestClient::signup(&server, "bob@example.com").await.unwrap();
    befriend(&alice, &bob).await.unwrap();
    alice.create_post("p").await.unwrap().ok().unwrap();

    let mine = alice.get("/notifications").await.unwrap().ok().unwrap();
    let first = mine[0]["id"].as_i64().unwrap();

    let stolen = bob
        .post(&format!("/notifications/{first}/mark_read"), None)
        .await
        .unwrap();
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);
    assert_eq!(stolen.code(), Some("notification_not_found"));

    alice
        .post(&format!("/notifications/{first}/mark_read"), None)
        .await
        .unwrap()
        .ok()
        .unwrap();
    let mine = alice.get("/notifications").await.unwrap().ok().unwrap();
    assert_eq!(mine[0]["is_read"], true);

    let all = bob
        .post("/notifications/mark_all_read", None)
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(all["updated"], 1);
    let again = bob
        .post("/notifications/mark_all_read", None)
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(again["updated"], 0);
}
