use super::server::TestServer;
use anyhow::{Context, Result, bail};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

/// One HTTP exchange, body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiResponse {
    /// The `code` field of an error body.
    pub fn code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    /// The body of a 2xx response, or an error describing what came back.
    pub fn ok(self) -> Result<Value> {
        if !self.status.is_success() {
            bail!("expected success, got {}: {}", self.status, self.body);
        }
        Ok(self.body)
    }
}

/// A user's session against a [`TestServer`].
pub struct TestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    pub user_id: Option<i64>,
}

impl TestClient {
    /// An anonymous client.
    pub fn new(server: &TestServer) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server.base_url(),
            token: None,
            user_id: None,
        }
    }

    /// Create an account, log in, and return a client holding its token.
    pub async fn signup(server: &TestServer, email: &str) -> Result<Self> {
        let mut client = Self::new(server);
        let user = client.create_user(email, "correct horse").await?.ok()?;
        client.user_id = Some(user["id"].as_i64().context("user id missing")?);
        let token = client.login(email, "correct horse").await?.ok()?;
        client.token = Some(
            token["access_token"]
                .as_str()
                .context("access_token missing")?
                .to_string(),
        );
        Ok(client)
    }

    pub fn id(&self) -> i64 {
        self.user_id.unwrap_or_default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<ApiResponse> {
        let mut req = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.context("request failed")?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<ApiResponse> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn create_user(&self, email: &str, password: &str) -> Result<ApiResponse> {
        self.post("/users", Some(json!({ "email": email, "password": password })))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<ApiResponse> {
        self.post("/login", Some(json!({ "email": email, "password": password })))
            .await
    }

    pub async fn follow(&self, user_id: i64) -> Result<ApiResponse> {
        self.post(&format!("/follow/{user_id}"), None).await
    }

    pub async fn create_post(&self, content: &str) -> Result<ApiResponse> {
        self.post("/posts", Some(json!({ "content": content }))).await
    }

    pub async fn open_conversation(&self, other_id: i64) -> Result<ApiResponse> {
        self.post(&format!("/conversations/{other_id}"), None).await
    }

    pub async fn send_message(&self, conversation_id: i64, content: &str) -> Result<ApiResponse> {
        self.post(
            &format!("/conversations/{conversation_id}/messages"),
            Some(json!({ "content": content })),
        )
        .await
    }
}

/// Make `a` and `b` follow each other.
pub async fn befriend(a: &TestClient, b: &TestClient) -> Result<()> {
    a.follow(b.id()).await?.ok()?;
    b.follow(a.id()).await?.ok()?;
    Ok(())
}
