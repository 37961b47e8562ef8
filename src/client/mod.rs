//!
//! Content Suite REST client
//! -------------------------
//! One method per backend endpoint. Every request carries the current session
//! token as `Authorization: Bearer <token>` when one exists; non-success
//! responses become `AppError` with the body's `detail` field when present.
//! A 401 from any endpoint clears the session slot.

use reqwest::{header, multipart, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::identity::SessionProvider;
use crate::model::{
    ActionMessage, AnalysisResult, Auditoria, BrandManual, Contenido, Estado, ImageUpload, LoginResponse,
    NewBrandManual, NewContenido, Role, User,
};

pub const DEFAULT_AUDIT_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    session: SessionProvider,
}

impl ApiClient {
    pub fn new(mut base: Url, session: SessionProvider) -> AppResult<Self> {
        // Endpoint paths are joined under the base, so a mount prefix must end in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("content-suite/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { base, client, session })
    }

    pub fn base(&self) -> &Url { &self.base }

    pub fn session(&self) -> &SessionProvider { &self.session }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal("bad_url".to_string(), format!("cannot join '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.url(path)?;
        let mut rb = self.client.request(method, url);
        if let Some(tok) = self.session.token() {
            rb = rb.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }
        Ok(rb)
    }

    async fn send_raw(&self, rb: RequestBuilder) -> AppResult<reqwest::Response> {
        let resp = rb.send().await?;
        let status = resp.status();
        debug!(target: "api", "{} -> {}", resp.url().path(), status.as_u16());
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        let err = AppError::from_status(status.as_u16(), detail);
        if err.is_unauthorized() {
            warn!(target: "api", "backend rejected session token; clearing session");
            self.session.clear();
        }
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> AppResult<T> {
        let resp = self.send_raw(rb).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::internal("decode_error".to_string(), format!("unexpected response body: {}", e)))
    }

    // --- auth ---

    /// Exchange credentials for a bearer token and persist it through the session provider.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let rb = self.request(Method::POST, "/api/auth/login")?
            .json(&json!({"email": email, "password": password}));
        let resp: LoginResponse = self.send_json(rb).await?;
        if !resp.access_token.is_empty() {
            self.session.establish(&resp.access_token)?;
        }
        debug!(target: "api", "login ok user={} role={}", resp.user.id, resp.user.role);
        Ok(resp)
    }

    pub async fn register(&self, email: &str, password: &str, nombre: &str, role: Role) -> AppResult<User> {
        let rb = self.request(Method::POST, "/api/auth/register")?
            .json(&json!({"email": email, "password": password, "nombre": nombre, "role": role}));
        self.send_json(rb).await
    }

    /// Resolve the signed-in user. Fails locally with `Unauthorized` when no token is held.
    pub async fn get_me(&self) -> AppResult<User> {
        if !self.session.is_present() {
            return Err(AppError::unauthorized("no_session", "no active session"));
        }
        let rb = self.request(Method::GET, "/api/auth/me")?;
        self.send_json(rb).await
    }

    // --- brand manuals ---

    pub async fn list_manuals(&self) -> AppResult<Vec<BrandManual>> {
        self.send_json(self.request(Method::GET, "/api/brand/manual")?).await
    }

    pub async fn get_manual(&self, id: &str) -> AppResult<BrandManual> {
        let path = format!("/api/brand/manual/{}", urlencoding::encode(id));
        self.send_json(self.request(Method::GET, &path)?).await
    }

    pub async fn create_manual(&self, fields: &NewBrandManual) -> AppResult<BrandManual> {
        let rb = self.request(Method::POST, "/api/brand/manual")?.json(fields);
        self.send_json(rb).await
    }

    pub async fn delete_manual(&self, id: &str) -> AppResult<ActionMessage> {
        let path = format!("/api/brand/manual/{}", urlencoding::encode(id));
        self.send_json(self.request(Method::DELETE, &path)?).await
    }

    // --- content ---

    pub async fn list_contenido(&self, estado: Option<Estado>) -> AppResult<Vec<Contenido>> {
        let mut rb = self.request(Method::GET, "/api/contenido/")?;
        if let Some(e) = estado {
            rb = rb.query(&[("estado", e.as_str())]);
        }
        self.send_json(rb).await
    }

    pub async fn get_contenido(&self, id: &str) -> AppResult<Contenido> {
        let path = format!("/api/contenido/{}", urlencoding::encode(id));
        self.send_json(self.request(Method::GET, &path)?).await
    }

    pub async fn create_contenido(&self, fields: &NewContenido) -> AppResult<Contenido> {
        let rb = self.request(Method::POST, "/api/contenido/")?.json(fields);
        self.send_json(rb).await
    }

    pub async fn approve(&self, id: &str) -> AppResult<ActionMessage> {
        let path = format!("/api/contenido/{}/aprobar", urlencoding::encode(id));
        self.send_json(self.request(Method::PATCH, &path)?).await
    }

    /// Reject with a reason. A blank reason never reaches the backend; any other
    /// reason is sent exactly as given.
    pub async fn reject(&self, id: &str, reason: &str) -> AppResult<ActionMessage> {
        validate_reject_reason(reason)?;
        let path = format!("/api/contenido/{}/rechazar", urlencoding::encode(id));
        let rb = self.request(Method::PATCH, &path)?.query(&[("rechazo_razon", reason)]);
        self.send_json(rb).await
    }

    // --- audits ---

    /// Upload an image for visual analysis against a content item. Single attempt.
    pub async fn audit_image(&self, contenido_id: &str, image: ImageUpload) -> AppResult<AnalysisResult> {
        let size = image.bytes.len();
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime)
            .map_err(|e| AppError::validation("bad_mime".to_string(), e.to_string()))?;
        let form = multipart::Form::new()
            .text("contenido_id", contenido_id.to_string())
            .part("image", part);
        debug!(target: "api", "audit upload contenido={} bytes={}", contenido_id, size);
        let rb = self.request(Method::POST, "/api/auditoria/image")?.multipart(form);
        self.send_json(rb).await
    }

    pub async fn list_auditorias(&self, limit: u32) -> AppResult<Vec<Auditoria>> {
        let rb = self.request(Method::GET, "/api/auditoria/")?.query(&[("limit", limit)]);
        self.send_json(rb).await
    }

    pub async fn auditorias_for_contenido(&self, contenido_id: &str) -> AppResult<Vec<Auditoria>> {
        let path = format!("/api/auditoria/contenido/{}", urlencoding::encode(contenido_id));
        self.send_json(self.request(Method::GET, &path)?).await
    }

    /// Audited image as the backend stores it (a `data:` URL), surrounding quotes stripped.
    pub async fn get_audit_image(&self, auditoria_id: &str) -> AppResult<String> {
        let path = format!("/api/auditoria/{}/imagen", urlencoding::encode(auditoria_id));
        let resp = self.send_raw(self.request(Method::GET, &path)?).await?;
        let text = resp.text().await?;
        Ok(strip_quotes(&text).to_string())
    }
}

pub fn validate_reject_reason(reason: &str) -> AppResult<&str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("empty_reason", "Debe ingresar un motivo de rechazo"));
    }
    Ok(trimmed)
}

/// FastAPI puts the message under `detail`; validation errors carry a list there.
fn extract_detail(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
