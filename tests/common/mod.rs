#![allow(dead_code)]

//! Test infrastructure for MoodTune router tests

use moodtune::classifier::{ClassificationError, EmotionClassifier};
use moodtune::config::Config;
use moodtune::{build_router, AppState};

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "moodtune-test-boundary";

/// Classifier stand-in: returns a fixed label, or fails, and counts calls.
pub struct FakeClassifier {
    label: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn returning(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            label: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmotionClassifier for FakeClassifier {
    async fn classify(&self, image: &Path) -> Result<String, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(image.exists(), "upload should be on disk before classification");

        match &self.label {
            Some(label) => Ok(label.clone()),
            None => Err(ClassificationError::Status {
                status: 500,
                body: "model exploded: tensor shape mismatch".to_string(),
            }),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub classifier: Arc<FakeClassifier>,
    pub dir: TempDir,
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        users_file: dir.join("users.json"),
        upload_dir: dir.join("uploads"),
        classifier_url: "http://127.0.0.1:9".to_string(),
        classifier_timeout: Duration::from_secs(1),
        bcrypt_cost: 4,
        expose_classifier_errors: false,
    }
}

pub fn create_test_app(classifier: FakeClassifier) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let classifier = Arc::new(classifier);
    let state = AppState::new(test_config(dir.path()), classifier.clone())
        .expect("Failed to create app state");
    let router = build_router(state.clone());

    TestApp {
        router,
        state,
        classifier,
        dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_detect(
        &self,
        cookie: &str,
        platform: Option<&str>,
        image: Option<(&str, &[u8])>,
    ) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri("/detect")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(platform, image)))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, username: &str, password: &str) -> Response<Body> {
        self.post_form(
            "/register",
            &format!("username={}&password={}", username, password),
            None,
        )
        .await
    }

    /// Registers and logs in, returning the `Cookie` header value to reuse.
    pub async fn login_new_user(&self, username: &str, password: &str) -> String {
        self.register(username, password).await;
        let response = self
            .post_form(
                "/login",
                &format!("username={}&password={}", username, password),
                None,
            )
            .await;
        session_cookie(&response).expect("login should set a session cookie")
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn multipart_body(platform: Option<&str>, image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(platform) = platform {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"platform\"\r\n\r\n{platform}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
