#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server_provisioning::db::models::role::Role;
use server_provisioning::db::models::user::{NewUser, User};
use server_provisioning::db::InMemoryStore;
use server_provisioning::{api, AppState, Config};

pub const PASSWORD: &str = "password";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct Account {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config {
            bcrypt_cost: 4,
            ..Config::default()
        };
        let state = AppState::new(Arc::new(InMemoryStore::new()), config);
        Self {
            router: api::app(state.clone()),
            state,
        }
    }

    pub async fn account(&self, role: Role, email: &str) -> Account {
        let password_hash = self.state.credentials.hash_password(PASSWORD).unwrap();
        let user = self
            .state
            .store
            .create_user(NewUser {
                name: format!("{role} user"),
                email: email.to_string(),
                password_hash,
                phone: Some("0812000000".into()),
                role,
            })
            .await
            .unwrap();
        let token = self.state.credentials.issue(user.id, user.role).unwrap();
        Account { user, token }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Sends a hand-built request and decodes the JSON body (`Null` when there is none).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Submits a valid request as `owner` and returns its id.
    pub async fn submit_request(&self, owner: &Account) -> i32 {
        let (status, body) = self.post("/pengajuan", &owner.token, request_body()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap() as i32
    }

    pub async fn status_of(&self, request_id: i32) -> String {
        let request = self.state.store.find_request(request_id).await.unwrap().unwrap();
        request.status.as_str().to_string()
    }
}

pub fn request_body() -> Value {
    json!({
        "namaSistem": "SIAKAD",
        "pemilikSistem": "Fakultas Teknik",
        "penggunaSistem": "Mahasiswa",
        "fungsiSistem": "Sistem akademik",
        "aksesPublik": true,
        "kebutuhanCPU": "4",
        "kebutuhanRAM": 8,
        "kebutuhanStorage": 100,
        "sistemOperasi": "Ubuntu 22.04",
        "jenisDatabase": "PostgreSQL"
    })
}
