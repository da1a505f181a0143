#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use rax_file_server::{Server, ServerConfig};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "hunter2";

pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
}

impl TestApp {
    pub async fn open() -> Self {
        Self::build("", "").await
    }

    pub async fn with_login() -> Self {
        Self::build(USERNAME, PASSWORD).await
    }

    async fn build(username: &str, password: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            root_dir: dir.path().to_string_lossy().into_owned(),
            username: username.to_string(),
            password: password.to_string(),
            tls_enabled: false,
            ..ServerConfig::default()
        };
        let server = Server::new(config).await.unwrap();
        Self {
            router: server.router(),
            dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Response<Body> {
        let request = Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
