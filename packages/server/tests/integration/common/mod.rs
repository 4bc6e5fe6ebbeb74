use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use classifier::{Classifier, ClassifyError, Labels, Network, preprocess::InputTensor};
use common::storage::filesystem::FilesystemFileStore;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, OAuthConfig, ServerConfig, StorageConfig,
};
use server::entity::{comment, image as image_entity, user};
use server::oauth::GithubProvider;
use server::state::AppState;

pub mod routes {
    pub const INDEX: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const ME: &str = "/me";
    pub const UPLOAD: &str = "/upload";

    pub fn image(id: i32) -> String {
        format!("/image/{id}")
    }

    pub fn classify(id: i32) -> String {
        format!("/image/{id}/classify")
    }

    pub fn delete(id: i32) -> String {
        format!("/delete/{id}")
    }

    pub fn uploaded(filename: &str) -> String {
        format!("/uploads/{filename}")
    }
}

/// Authorization codes the mock provider treats specially. Any other code is
/// accepted and names the account that logs in.
pub mod codes {
    /// Token endpoint answers with an OAuth `error` field.
    pub const DENIED: &str = "denied";
    /// Profile endpoint answers 500.
    pub const BROKEN_PROFILE: &str = "broken";
}

/// Upload ceiling used by every test app.
pub const MAX_UPLOAD_SIZE: usize = 64 * 1024;

/// Scores returned by the fake classifier network.
pub const FAKE_LABELS: [&str; 3] = ["tabby cat", "golden retriever", "goldfish"];

struct FakeNetwork;

impl Network for FakeNetwork {
    fn forward(&self, _input: &InputTensor) -> Result<Vec<Vec<f32>>, ClassifyError> {
        Ok(vec![vec![0.1, 0.7, 0.2]])
    }
}

/// A running test server with its own database, upload directory and mock
/// OAuth provider.
pub struct TestApp {
    pub addr: SocketAddr,
    /// Anonymous browser.
    pub client: Client,
    pub db: DatabaseConnection,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    /// `Location` header, if any.
    pub location: Option<String>,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            location,
        }
    }

    /// Assert a `303` outcome redirecting to `to` and return its body.
    pub fn assert_redirect(&self, to: &str) -> &Value {
        assert_eq!(self.status, 303, "Expected redirect, got: {}", self.text);
        assert_eq!(self.location.as_deref(), Some(to));
        assert_eq!(self.body["redirect_to"], to);
        &self.body
    }
}

async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    let code = form.get("code").cloned().unwrap_or_default();
    if code == codes::DENIED {
        return Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }));
    }
    Json(json!({ "access_token": format!("token-{code}"), "token_type": "bearer" }))
}

async fn profile_endpoint(headers: HeaderMap) -> axum::response::Response {
    let login = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer token-"))
        .unwrap_or_default()
        .to_string();

    if login.is_empty() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if login == codes::BROKEN_PROFILE {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "id": format!("gh-{login}"), "login": login, "name": null })).into_response()
}

async fn spawn_mock_provider() -> SocketAddr {
    let app = Router::new()
        .route("/login/oauth/access_token", post(token_endpoint))
        .route("/user", get(profile_endpoint));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock provider");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A browser-like client: keeps cookies, does not follow redirects.
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_classifier(false).await
    }

    pub async fn spawn_with_classifier(classifier_enabled: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload_dir = dir.path().join("uploads");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());
        let provider = spawn_mock_provider().await;

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                secret: "test-secret-for-integration-tests".to_string(),
                session_ttl_hours: 1,
                secure_cookies: false,
            },
            oauth: OAuthConfig {
                client_id: "test-client".to_string(),
                client_secret: "test-client-secret".to_string(),
                authorize_url: format!("http://{provider}/login/oauth/authorize"),
                token_url: format!("http://{provider}/login/oauth/access_token"),
                profile_url: format!("http://{provider}/user"),
                redirect_url: "http://127.0.0.1/login".to_string(),
                scope: "read:user".to_string(),
                user_agent: "pixboard-tests".to_string(),
            },
            storage: StorageConfig {
                upload_dir: upload_dir.clone(),
                max_upload_size: MAX_UPLOAD_SIZE,
            },
            classifier: Default::default(),
        };

        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        let store = FilesystemFileStore::new(upload_dir.clone())
            .await
            .expect("Failed to create upload dir");

        let classifier = classifier_enabled.then(|| {
            let labels = Labels::from_lines(FAKE_LABELS).expect("labels");
            Arc::new(Classifier::new(labels, FakeNetwork))
        });

        let state = AppState {
            db: db.clone(),
            store: Arc::new(store),
            oauth: Arc::new(GithubProvider::new(config.oauth.clone())),
            config,
            classifier,
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: browser(),
            db,
            upload_dir,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, client: &Client, path: &str) -> TestResponse {
        let res = client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(
        &self,
        client: &Client,
        path: &str,
        form: &[(&str, &str)],
    ) -> TestResponse {
        let res = client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// POST with no body and no `Content-Type`.
    pub async fn post_empty(&self, client: &Client, path: &str) -> TestResponse {
        let res = client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(
        &self,
        client: &Client,
        file_name: &str,
        file_bytes: Vec<u8>,
        description: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new()
            .text("description", description.to_string())
            .part("image", part);

        let res = client
            .post(self.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send upload request");

        TestResponse::from_response(res).await
    }

    /// Start the OAuth flow and return the signed `state` the app sent to the
    /// provider. The client now holds the matching `oauth_state` cookie.
    pub async fn begin_login(&self, client: &Client) -> String {
        let res = self.get(client, routes::LOGIN).await;
        assert_eq!(res.status, 303, "Login did not redirect: {}", res.text);

        let location = res.location.expect("Login redirect without Location");
        let url = Url::parse(&location).expect("Authorization URL is not absolute");
        assert_eq!(url.path(), "/login/oauth/authorize");
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("Authorization URL without state")
    }

    /// Finish the OAuth flow as if the provider redirected back with `code`.
    pub async fn finish_login(&self, client: &Client, code: &str, state: &str) -> TestResponse {
        let path = format!("{}?code={code}&state={state}", routes::LOGIN);
        self.get(client, &path).await
    }

    /// A fresh browser logged in as `login`.
    pub async fn login_as(&self, login: &str) -> Client {
        let client = browser();
        let state = self.begin_login(&client).await;
        let res = self.finish_login(&client, login, &state).await;
        assert_eq!(
            res.body["status"], "success",
            "Login as {login} failed: {}",
            res.text
        );
        client
    }

    /// Upload `bytes` as `file_name` and return the new image's id.
    pub async fn upload_image(&self, client: &Client, file_name: &str, bytes: Vec<u8>) -> i32 {
        let res = self.upload(client, file_name, bytes, "").await;
        res.assert_redirect("/");
        assert_eq!(res.body["status"], "success", "Upload failed: {}", res.text);

        image_entity::Entity::find()
            .all(&self.db)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .max()
            .expect("No image row after upload")
    }

    pub async fn user_count(&self) -> u64 {
        user::Entity::find().count(&self.db).await.unwrap()
    }

    pub async fn image_count(&self) -> u64 {
        image_entity::Entity::find().count(&self.db).await.unwrap()
    }

    pub async fn comment_count(&self) -> u64 {
        comment::Entity::find().count(&self.db).await.unwrap()
    }
}

/// Encode a small PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
