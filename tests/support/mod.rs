#![allow(dead_code)]

// In-process stand-in for the Content Suite REST backend, bound to an
// ephemeral localhost port. Request counters let tests assert exactly which
// calls the client issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use content_suite::client::ApiClient;
use content_suite::identity::SessionProvider;
use content_suite::model::{
    Auditoria, BrandManual, Contenido, Estado, NewBrandManual, NewContenido, Resultado, Role, TipoContenido, User,
};

pub const PASSWORD: &str = "secret";
pub const PNG_1X1: &[u8] = b"\x89PNG\r\n\x1a\nmock";

#[derive(Default)]
pub struct Counters {
    pub login: AtomicUsize,
    pub me: AtomicUsize,
    pub list_manuals: AtomicUsize,
    pub list_contenido: AtomicUsize,
    pub create_manual: AtomicUsize,
    pub create_contenido: AtomicUsize,
    pub delete_manual: AtomicUsize,
    pub aprobar: AtomicUsize,
    pub rechazar: AtomicUsize,
    pub audit_upload: AtomicUsize,
    pub list_auditorias: AtomicUsize,
    pub audit_image: AtomicUsize,
}

pub fn count(c: &AtomicUsize) -> usize { c.load(Ordering::SeqCst) }

fn bump(c: &AtomicUsize) { c.fetch_add(1, Ordering::SeqCst); }

#[derive(Default)]
pub struct Data {
    pub users: Vec<(User, String)>,
    pub tokens: HashMap<String, User>,
    pub manuals: Vec<BrandManual>,
    pub contenidos: Vec<Contenido>,
    pub auditorias: Vec<Auditoria>,
    /// When set, `GET /api/contenido/` answers 500.
    pub fail_contenido_list: bool,
}

#[derive(Clone)]
pub struct MockState {
    pub data: Arc<Mutex<Data>>,
    pub counters: Arc<Counters>,
}

const TS: &str = "2025-03-04T10:00:00+00:00";

fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@test.local", role.as_str()),
        nombre: format!("Usuario {}", role.label()),
        role,
        is_active: true,
        created_at: TS.to_string(),
    }
}

fn manual(id: &str, nombre: &str) -> BrandManual {
    BrandManual {
        id: id.to_string(),
        nombre: nombre.to_string(),
        producto: "Bebida energética".into(),
        tono: "cercano".into(),
        publico_objetivo: "jóvenes 18-25".into(),
        restricciones: "sin claims médicos".into(),
        contenido_markdown: Some("# Manual".into()),
        version: 1,
        created_by: Some("u-creador".into()),
        created_at: TS.to_string(),
        updated_at: TS.to_string(),
    }
}

fn contenido(id: &str, titulo: &str, estado: Estado) -> Contenido {
    Contenido {
        id: id.to_string(),
        brand_manual_id: "m1".into(),
        tipo: TipoContenido::Descripcion,
        titulo: titulo.to_string(),
        contenido_text: Some(format!("Texto generado para {}", titulo)),
        estado,
        aprobado_por: None,
        rechazo_razon: None,
        created_by: Some("u-creador".into()),
        created_at: TS.to_string(),
        updated_at: TS.to_string(),
    }
}

fn data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes))
}

impl Data {
    /// Two pending, two approved, one rejected; two audits, only `a1` with a stored image.
    fn seeded() -> Self {
        let users = [("u-creador", Role::Creador), ("u-apa", Role::AprobadorA), ("u-apb", Role::AprobadorB), ("u-admin", Role::Admin)]
            .into_iter()
            .map(|(id, r)| (user(id, r), PASSWORD.to_string()))
            .collect();
        let auditorias = vec![
            Auditoria {
                id: "a1".into(),
                contenido_id: "c3".into(),
                imagen_url: Some(data_url(PNG_1X1)),
                resultado: Some(Resultado { cumple: true, score: 0.85 }),
                gemini_analysis: Some("Uso correcto del logo".into()),
                score_conformidad: Some(0.85),
                audited_by: Some("u-apb".into()),
                created_at: TS.to_string(),
            },
            Auditoria {
                id: "a2".into(),
                contenido_id: "c5".into(),
                imagen_url: None,
                resultado: Some(Resultado { cumple: false, score: 0.3 }),
                gemini_analysis: Some("Paleta fuera de marca".into()),
                score_conformidad: Some(0.3),
                audited_by: Some("u-apb".into()),
                created_at: TS.to_string(),
            },
        ];
        Self {
            users,
            tokens: HashMap::new(),
            fail_contenido_list: false,
            manuals: vec![manual("m1", "Manual Verano")],
            contenidos: vec![
                contenido("c1", "Post lanzamiento", Estado::Pendiente),
                contenido("c2", "Guion spot", Estado::Pendiente),
                contenido("c3", "Descripción producto", Estado::Aprobado),
                contenido("c4", "Prompt banner", Estado::Rechazado),
                contenido("c5", "Post invierno", Estado::Aprobado),
            ],
            auditorias,
        }
    }
}

fn detail(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "detail": msg }))).into_response()
}

fn authorize(s: &MockState, headers: &HeaderMap) -> Result<User, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    s.data.lock().tokens.get(token).cloned().ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Token inválido"))
}

async fn login(State(s): State<MockState>, Json(body): Json<Value>) -> Response {
    bump(&s.counters.login);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let mut d = s.data.lock();
    let found = d.users.iter().find(|(u, _)| u.email == email).map(|(u, p)| (u.clone(), p.clone()));
    match found {
        Some((u, p)) if p == password => {
            let token = format!("tok-{}", uuid::Uuid::new_v4());
            d.tokens.insert(token.clone(), u.clone());
            Json(json!({ "access_token": token, "token_type": "bearer", "user": u })).into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Credenciales incorrectas"),
    }
}

async fn me(State(s): State<MockState>, headers: HeaderMap) -> Result<Json<User>, Response> {
    bump(&s.counters.me);
    Ok(Json(authorize(&s, &headers)?))
}

async fn list_manuals(State(s): State<MockState>, headers: HeaderMap) -> Result<Json<Vec<BrandManual>>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.list_manuals);
    Ok(Json(s.data.lock().manuals.clone()))
}

async fn create_manual(
    State(s): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<NewBrandManual>,
) -> Result<Json<BrandManual>, Response> {
    let u = authorize(&s, &headers)?;
    bump(&s.counters.create_manual);
    let mut m = manual(&format!("m-{}", uuid::Uuid::new_v4()), &body.nombre);
    m.producto = body.producto;
    m.tono = body.tono;
    m.publico_objetivo = body.publico_objetivo;
    m.restricciones = body.restricciones;
    m.created_by = Some(u.id);
    s.data.lock().manuals.insert(0, m.clone());
    Ok(Json(m))
}

async fn delete_manual(State(s): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.delete_manual);
    let mut d = s.data.lock();
    let before = d.manuals.len();
    d.manuals.retain(|m| m.id != id);
    if d.manuals.len() == before {
        return Err(detail(StatusCode::NOT_FOUND, "Manual no encontrado"));
    }
    Ok(Json(json!({ "message": "Manual eliminado" })))
}

async fn list_contenido(
    State(s): State<MockState>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Contenido>>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.list_contenido);
    let d = s.data.lock();
    if d.fail_contenido_list {
        return Err(detail(StatusCode::INTERNAL_SERVER_ERROR, "Error interno"));
    }
    let items = d
        .contenidos
        .iter()
        .filter(|c| q.get("estado").map(|e| e == c.estado.as_str()).unwrap_or(true))
        .cloned()
        .collect();
    Ok(Json(items))
}

async fn create_contenido(
    State(s): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<NewContenido>,
) -> Result<Json<Contenido>, Response> {
    let u = authorize(&s, &headers)?;
    bump(&s.counters.create_contenido);
    let mut d = s.data.lock();
    if !d.manuals.iter().any(|m| m.id == body.brand_manual_id) {
        return Err(detail(StatusCode::NOT_FOUND, "Manual no encontrado"));
    }
    let mut c = contenido(&format!("c-{}", uuid::Uuid::new_v4()), &body.titulo, Estado::Pendiente);
    c.brand_manual_id = body.brand_manual_id;
    c.tipo = body.tipo;
    c.created_by = Some(u.id);
    d.contenidos.insert(0, c.clone());
    Ok(Json(c))
}

async fn aprobar(State(s): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, Response> {
    let u = authorize(&s, &headers)?;
    bump(&s.counters.aprobar);
    let mut d = s.data.lock();
    let c = d.contenidos.iter_mut().find(|c| c.id == id).ok_or_else(|| detail(StatusCode::NOT_FOUND, "Contenido no encontrado"))?;
    c.estado = Estado::Aprobado;
    c.aprobado_por = Some(u.id);
    Ok(Json(json!({ "message": "Contenido aprobado", "contenido": c })))
}

async fn rechazar(
    State(s): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.rechazar);
    let Some(reason) = q.get("rechazo_razon").cloned() else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["query", "rechazo_razon"], "msg": "field required" }] })),
        )
            .into_response());
    };
    let mut d = s.data.lock();
    let c = d.contenidos.iter_mut().find(|c| c.id == id).ok_or_else(|| detail(StatusCode::NOT_FOUND, "Contenido no encontrado"))?;
    c.estado = Estado::Rechazado;
    c.rechazo_razon = Some(reason);
    Ok(Json(json!({ "message": "Contenido rechazado", "contenido": c })))
}

async fn audit_upload(State(s): State<MockState>, headers: HeaderMap, mut mp: Multipart) -> Result<Json<Value>, Response> {
    let u = authorize(&s, &headers)?;
    bump(&s.counters.audit_upload);
    let mut contenido_id: Option<String> = None;
    let mut image: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "contenido_id" => contenido_id = field.text().await.ok(),
            "image" => image = field.bytes().await.ok().map(|b| b.to_vec()),
            _ => {}
        }
    }
    let (Some(contenido_id), Some(image)) = (contenido_id, image) else {
        return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "contenido_id e image son obligatorios"));
    };
    let mut d = s.data.lock();
    match d.contenidos.iter().find(|c| c.id == contenido_id) {
        None => return Err(detail(StatusCode::NOT_FOUND, "Contenido no encontrado")),
        Some(c) if c.estado != Estado::Aprobado => {
            return Err(detail(StatusCode::BAD_REQUEST, "Solo se pueden auditar contenidos aprobados"))
        }
        Some(_) => {}
    }
    let a = Auditoria {
        id: format!("a-{}", uuid::Uuid::new_v4()),
        contenido_id,
        imagen_url: Some(data_url(&image)),
        resultado: Some(Resultado { cumple: true, score: 0.82 }),
        gemini_analysis: Some("La imagen respeta la paleta y el tono".into()),
        score_conformidad: Some(0.82),
        audited_by: Some(u.id),
        created_at: TS.to_string(),
    };
    d.auditorias.insert(0, a.clone());
    Ok(Json(json!({ "auditoria": a, "analisis": "La imagen respeta la paleta y el tono", "score": 0.82 })))
}

async fn list_auditorias(
    State(s): State<MockState>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Auditoria>>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.list_auditorias);
    let limit = q.get("limit").and_then(|l| l.parse::<usize>().ok()).unwrap_or(100);
    Ok(Json(s.data.lock().auditorias.iter().take(limit).cloned().collect()))
}

async fn audit_image(State(s): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<String>, Response> {
    authorize(&s, &headers)?;
    bump(&s.counters.audit_image);
    let d = s.data.lock();
    d.auditorias
        .iter()
        .find(|a| a.id == id)
        .and_then(|a| a.imagen_url.clone())
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Imagen no encontrada"))
}

async fn register(State(s): State<MockState>, Json(body): Json<Value>) -> Result<Json<User>, Response> {
    let role: Role = serde_json::from_value(body["role"].clone()).map_err(|_| detail(StatusCode::UNPROCESSABLE_ENTITY, "rol inválido"))?;
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut d = s.data.lock();
    if d.users.iter().any(|(u, _)| u.email == email) {
        return Err(detail(StatusCode::BAD_REQUEST, "El email ya está registrado"));
    }
    let u = User {
        id: format!("u-{}", uuid::Uuid::new_v4()),
        email,
        nombre: body["nombre"].as_str().unwrap_or_default().to_string(),
        role,
        is_active: true,
        created_at: TS.to_string(),
    };
    d.users.push((u.clone(), body["password"].as_str().unwrap_or_default().to_string()));
    Ok(Json(u))
}

async fn get_manual(State(s): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<BrandManual>, Response> {
    authorize(&s, &headers)?;
    let d = s.data.lock();
    d.manuals.iter().find(|m| m.id == id).cloned().map(Json).ok_or_else(|| detail(StatusCode::NOT_FOUND, "Manual no encontrado"))
}

async fn get_contenido(State(s): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Contenido>, Response> {
    authorize(&s, &headers)?;
    let d = s.data.lock();
    d.contenidos.iter().find(|c| c.id == id).cloned().map(Json).ok_or_else(|| detail(StatusCode::NOT_FOUND, "Contenido no encontrado"))
}

async fn auditorias_for_contenido(
    State(s): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Auditoria>>, Response> {
    authorize(&s, &headers)?;
    Ok(Json(s.data.lock().auditorias.iter().filter(|a| a.contenido_id == id).cloned().collect()))
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/register", post(register))
        .route("/api/brand/manual", get(list_manuals).post(create_manual))
        .route("/api/brand/manual/{id}", get(get_manual).delete(delete_manual))
        .route("/api/contenido/", get(list_contenido).post(create_contenido))
        .route("/api/contenido/{id}", get(get_contenido))
        .route("/api/contenido/{id}/aprobar", patch(aprobar))
        .route("/api/contenido/{id}/rechazar", patch(rechazar))
        .route("/api/auditoria/image", post(audit_upload))
        .route("/api/auditoria/", get(list_auditorias))
        .route("/api/auditoria/contenido/{id}", get(auditorias_for_contenido))
        .route("/api/auditoria/{id}/imagen", get(audit_image))
        .with_state(state)
}

pub struct MockBackend {
    pub base: Url,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) { self.handle.abort(); }
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState { data: Arc::new(Mutex::new(Data::seeded())), counters: Arc::new(Counters::default()) };
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
        let port = listener.local_addr().expect("local addr").port();
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock backend error: {e:?}");
            }
        });
        let base = Url::parse(&format!("http://127.0.0.1:{}", port)).expect("base url");
        Self { base, state, handle }
    }

    pub fn counters(&self) -> &Counters { &self.state.counters }

    /// Client with an empty in-memory session.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base.clone(), SessionProvider::in_memory()).expect("client")
    }

    /// Client already signed in as the seeded user holding `role`.
    pub async fn signed_in(&self, role: Role) -> ApiClient {
        let api = self.client();
        api.login(&email_for(role), PASSWORD).await.expect("login");
        api
    }

    pub fn estado_of(&self, id: &str) -> Option<Estado> {
        self.state.data.lock().contenidos.iter().find(|c| c.id == id).map(|c| c.estado)
    }
}

pub fn email_for(role: Role) -> String { format!("{}@test.local", role.as_str()) }
