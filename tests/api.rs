mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use common::test_server::{ADMIN_EMAIL, ADMIN_PASSWORD, TestServer};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("build client")
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{base_url}/api/v1/auth/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login");
    assert_eq!(resp.status(), StatusCode::OK, "login as {email}");
    resp.json().await.expect("parse login response")
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> Value {
    let resp = client
        .post(format!("{base_url}/api/v1/auth/register"))
        .json(&json!({
            "name": name,
            "email": email,
            "address": "1 Test Lane",
            "password": password,
        }))
        .send()
        .await
        .expect("register");
    assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");
    resp.json().await.expect("parse register response")
}

/// Creates a store through the admin API and returns its id.
async fn create_store(admin: &reqwest::Client, base_url: &str, name: &str, owner_id: Option<&str>) -> String {
    let resp: Value = admin
        .post(format!("{base_url}/api/v1/admin/stores"))
        .json(&json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "address": "2 Shop Row",
            "owner_id": owner_id,
        }))
        .send()
        .await
        .expect("create store")
        .json()
        .await
        .expect("parse store response");
    resp["data"]["id"].as_str().expect("store id").to_string()
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let server = TestServer::start().await;
    let c = client();

    let body = register(&c, &server.base_url, "Alice", "alice@example.com", "password-1").await;
    assert_eq!(body["data"]["role"], "rater");

    // The session cookie from registration authenticates /me.
    let me: Value = c
        .get(format!("{}/api/v1/auth/me", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["data"]["email"], "alice@example.com");

    let resp = c
        .post(format!("{}/api/v1/auth/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Session destroyed server-side; the cookie no longer works.
    let resp = c
        .get(format!("{}/api/v1/auth/me", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let server = TestServer::start().await;
    let c = client();

    register(&c, &server.base_url, "Alice", "alice@example.com", "password-1").await;

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "password-1"),
    ] {
        let resp = client()
            .post(format!("{}/api/v1/auth/login", server.base_url))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_duplicate_email_conflict() {
    let server = TestServer::start().await;

    register(&client(), &server.base_url, "Alice", "alice@example.com", "password-1").await;

    let resp = client()
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({
            "name": "Impostor",
            "email": "alice@example.com",
            "password": "password-2",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation_reports_fields() {
    let server = TestServer::start().await;

    let resp = client()
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"name": "", "email": "not-an-email", "password": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    let fields: Vec<&str> = body["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "email", "password"]);
}

#[tokio::test]
async fn test_rating_upsert_and_listing() {
    let server = TestServer::start().await;

    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = create_store(&admin, &server.base_url, "corner-shop", None).await;

    let rater = client();
    register(&rater, &server.base_url, "Alice", "alice@example.com", "password-1").await;

    let resp = rater
        .put(format!("{}/api/v1/stores/{store_id}/rating", server.base_url))
        .json(&json!({"value": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Second submission replaces, never duplicates.
    let resp = rater
        .put(format!("{}/api/v1/stores/{store_id}/rating", server.base_url))
        .json(&json!({"value": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let listing: Value = rater
        .get(format!("{}/api/v1/stores", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stores = listing["data"].as_array().unwrap();
    let store = stores
        .iter()
        .find(|s| s["id"] == store_id.as_str())
        .expect("store listed");
    assert_eq!(store["total_ratings"], 1);
    assert_eq!(store["average_rating"], 2.0);
    assert_eq!(store["user_rating"], 2);
}

#[tokio::test]
async fn test_rating_validation_and_missing_store() {
    let server = TestServer::start().await;

    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = create_store(&admin, &server.base_url, "corner-shop", None).await;

    let rater = client();
    register(&rater, &server.base_url, "Alice", "alice@example.com", "password-1").await;

    let resp = rater
        .put(format!("{}/api/v1/stores/{store_id}/rating", server.base_url))
        .json(&json!({"value": 6}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = rater
        .put(format!("{}/api/v1/stores/no-such-store/rating", server.base_url))
        .json(&json!({"value": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_gates() {
    let server = TestServer::start().await;

    let rater = client();
    register(&rater, &server.base_url, "Alice", "alice@example.com", "password-1").await;

    // Rater hitting admin- and owner-only surfaces.
    for path in ["/api/v1/admin/stats", "/api/v1/owner/stores"] {
        let resp = rater
            .get(format!("{}{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path}");
    }

    // Admin is not a rater; submitting a rating is denied.
    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = create_store(&admin, &server.base_url, "corner-shop", None).await;
    let resp = admin
        .put(format!("{}/api/v1/stores/{store_id}/rating", server.base_url))
        .json(&json!({"value": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Unauthenticated requests are rejected outright.
    let resp = reqwest::Client::new()
        .get(format!("{}/api/v1/stores", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_scoping() {
    let server = TestServer::start().await;

    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // Two raters become owners by being assigned stores.
    let owner_a = client();
    let body = register(&owner_a, &server.base_url, "Owen", "owen@example.com", "password-1").await;
    let owner_a_id = body["data"]["id"].as_str().unwrap().to_string();

    let owner_b = client();
    let body = register(&owner_b, &server.base_url, "Bella", "bella@example.com", "password-1").await;
    let owner_b_id = body["data"]["id"].as_str().unwrap().to_string();

    let store_a =
        create_store(&admin, &server.base_url, "owens-shop", Some(owner_a_id.as_str())).await;
    let store_b =
        create_store(&admin, &server.base_url, "bellas-shop", Some(owner_b_id.as_str())).await;

    // The promotion lands at next login; the old session keeps its snapshot.
    let resp = owner_a
        .get(format!("{}/api/v1/owner/stores", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    login(&owner_a, &server.base_url, "owen@example.com", "password-1").await;
    login(&owner_b, &server.base_url, "bella@example.com", "password-1").await;

    let owned: Value = owner_a
        .get(format!("{}/api/v1/owner/stores", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = owned["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [store_a.as_str()]);

    // Own store: ratings visible.
    let resp = owner_a
        .get(format!(
            "{}/api/v1/owner/stores/{store_a}/ratings",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["aggregate"]["total_ratings"], 0);

    // Someone else's store and a missing store: same denial.
    for id in [store_b.as_str(), "no-such-store"] {
        let resp = owner_a
            .get(format!("{}/api/v1/owner/stores/{id}/ratings", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "store {id}");
    }
}

#[tokio::test]
async fn test_admin_stats_and_store_delete() {
    let server = TestServer::start().await;

    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = create_store(&admin, &server.base_url, "corner-shop", None).await;

    let rater = client();
    register(&rater, &server.base_url, "Alice", "alice@example.com", "password-1").await;
    rater
        .put(format!("{}/api/v1/stores/{store_id}/rating", server.base_url))
        .json(&json!({"value": 5}))
        .send()
        .await
        .unwrap();

    let stats: Value = admin
        .get(format!("{}/api/v1/admin/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["data"]["total_users"], 2); // admin + alice
    assert_eq!(stats["data"]["total_stores"], 1);
    assert_eq!(stats["data"]["total_ratings"], 1);

    let resp = admin
        .delete(format!("{}/api/v1/admin/stores/{store_id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Ratings went with the store.
    let stats: Value = admin
        .get(format!("{}/api/v1/admin/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["data"]["total_stores"], 0);
    assert_eq!(stats["data"]["total_ratings"], 0);
}

#[tokio::test]
async fn test_admin_user_management() {
    let server = TestServer::start().await;

    let admin = client();
    login(&admin, &server.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let created: Value = admin
        .post(format!("{}/api/v1/admin/users", server.base_url))
        .json(&json!({
            "name": "Bob",
            "email": "bob@example.com",
            "address": "9 Side Street",
            "password": "password-1",
            "role": "rater",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bob_id = created["data"]["id"].as_str().unwrap().to_string();

    let updated: Value = admin
        .patch(format!("{}/api/v1/admin/users/{bob_id}/role", server.base_url))
        .json(&json!({"role": "store_owner"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["data"]["role"], "store_owner");

    let listed: Value = admin
        .get(format!("{}/api/v1/admin/users", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);

    let resp = admin
        .delete(format!("{}/api/v1/admin/users/{bob_id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin
        .delete(format!("{}/api/v1/admin/users/{bob_id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_password() {
    let server = TestServer::start().await;

    let c = client();
    register(&c, &server.base_url, "Alice", "alice@example.com", "password-1").await;

    // A malformed new password fails validation before the current password
    // is checked, even when that password is also wrong.
    let resp = c
        .put(format!("{}/api/v1/auth/password", server.base_url))
        .json(&json!({"current_password": "wrong", "new_password": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["violations"][0]["field"], "password");

    // Wrong current password is a permission failure, not validation.
    let resp = c
        .put(format!("{}/api/v1/auth/password", server.base_url))
        .json(&json!({"current_password": "wrong", "new_password": "password-2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = c
        .put(format!("{}/api/v1/auth/password", server.base_url))
        .json(&json!({"current_password": "password-1", "new_password": "password-2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Old password no longer logs in, the new one does.
    let resp = client()
        .post(format!("{}/api/v1/auth/login", server.base_url))
        .json(&json!({"email": "alice@example.com", "password": "password-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    login(&client(), &server.base_url, "alice@example.com", "password-2").await;
}
