use reqwest::StatusCode;
use rookery_tests::harness::client::TestClient;
use rookery_tests::harness::server::TestServer;

#[tokio::test]
async fn follow_toggles_and_profiles_reflect_it() {
    let server = TestServer::spawn().await.unwrap();
    let alice = TestClient::signup(&server, "alice@example.com").await.unwrap();
    let bob = TestClient::signup(&server, "bob@example.com").await.unwrap();

    let followed = alice.follow(bob.id()).await.unwrap().ok().unwrap();
    assert_eq!(followed["status"], "followed");

    let bob_profile = alice
        .get(&format!("/profile/{}", bob.id()))
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(bob_profile["followers_count"], 1);
    assert_eq!(bob_profile["followers"][0]["email"], "alice@example.com");

    let mine = alice.get("/profile/me").await.unwrap().ok().unwrap();
    assert_eq!(mine["following_count"], 1);
    assert_eq!(mine["following"][0]["id"], bob.id());

    let unfollowed = alice.follow(bob.id()).await.unwrap().ok().unwrap();
    assert_eq!(unfollowed["status"], "unfollowed");
    let bob_profile = bob.get("/profile/me").await.unwrap().ok().unwrap();
    assert_eq!(bob_profile["followers_count"], 0);
}

#[tokio::test]
async fn follow_notifies_the_target() {
    let server = TestServer::spawn().await.unwrap();
    let alice = TestClient::signup(&server, "alice@example.com").await.unwrap();
    let bob = TestClient::signup(&server, "bob@example.com").await.unwrap();

    alice.follow(bob.id()).await.unwrap().ok().unwrap();

    let list = bob.get("/notifications").await.unwrap().ok().unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["kind"], "follow");
    assert_eq!(list[0]["is_read"], false);
}

#[tokio::test]
async fn follow_rejects_self_and_unknown_users() {
    let server = TestServer::spawn().await.unwrap();
    let alice = TestClient::signup(&server, "alice@example.com").await.unwrap();

    let itself = alice.follow(alice.id()).await.unwrap();
    assert_eq!(itself.status, StatusCode::BAD_REQUEST);
    assert_eq!(itself.code(), Some("self_follow"));

    let unknown = alice.follow(9_999).await.unwrap();
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.code(), Some("user_not_found"));

    let profile = alice.get("/profile/9999").await.unwrap();
    assert_eq!(profile.status, StatusCode::NOT_FOUND);

    let bad_id = alice.post("/follow/abc", None).await.unwrap();
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.code(), Some("invalid_input"));
}
