//! Shared helpers: an API server on an ephemeral port backed by in-memory stores

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use contacts_api::api::{build_state, serve, Backends};
use contacts_api::auth::{Role, User};
use contacts_api::cache::MemoryCacheStore;
use contacts_api::config::Config;
use contacts_api::db::{MemoryStore, UserStore};
use contacts_api::mail::{EmailMessage, MemoryMailer};
use contacts_api::upload::MemoryUploader;
use serde_json::{json, Value};

pub const PASSWORD: &str = "secret123";

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub users: MemoryStore,
    pub cache: MemoryCacheStore,
    pub mailer: MemoryMailer,
    pub uploader: MemoryUploader,
}

/// Start a server on 127.0.0.1 with a random port
pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

pub async fn spawn_server_with(customize: impl FnOnce(&mut Config)) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/", listener.local_addr().unwrap());

    let mut config = Config::default();
    config.auth.secret_key = "integration-test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.server.public_url = base_url.clone();
    customize(&mut config);

    let users = MemoryStore::new();
    let cache = MemoryCacheStore::new();
    let mailer = MemoryMailer::new();
    let uploader = MemoryUploader::new();
    let backends = Backends {
        users: Arc::new(users.clone()),
        contacts: Arc::new(users.clone()),
        cache: Arc::new(cache.clone()),
        mailer: Arc::new(mailer.clone()),
        uploader: Some(Arc::new(uploader.clone())),
    };
    let state = build_state(config, backends).unwrap();

    tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });

    TestServer {
        base_url,
        client: reqwest::Client::new(),
        users,
        cache,
        mailer,
        uploader,
    }
}

/// Token from the first link in `html` that contains `marker`
pub fn extract_link_token(html: &str, marker: &str) -> Option<String> {
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let end = rest.find(['"', '<', ' ', '\n']).unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn signup(&self, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signup"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "first_name": "Test",
            }))
            .send()
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Latest email sent to `to`, waiting up to a second for it
    pub async fn last_mail_to(&self, to: &str, expected_total: usize) -> EmailMessage {
        self.mailer
            .wait_for(expected_total, Duration::from_secs(2))
            .await
            .into_iter()
            .rev()
            .find(|m| m.to == to)
            .unwrap_or_else(|| panic!("no email sent to {}", to))
    }

    /// Sign up, follow the confirmation link and log in; returns the access token
    pub async fn register(&self, email: &str) -> String {
        let sent_before = self.mailer.sent().await.len();
        assert_eq!(self.signup(email).await.status(), 201);

        let mail = self.last_mail_to(email, sent_before + 1).await;
        let token = extract_link_token(&mail.html, "auth/confirmed_email/").unwrap();
        let confirm = self
            .client
            .get(self.url(&format!("/auth/confirmed_email/{}", token)))
            .send()
            .await
            .unwrap();
        assert_eq!(confirm.status(), 200);

        self.access_token(email, PASSWORD).await
    }

    pub async fn access_token(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    /// Change a role directly in the store, behind the session cache's back
    pub async fn set_role(&self, email: &str, role: Role) -> User {
        self.users.set_role(email, role).await.unwrap()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}
