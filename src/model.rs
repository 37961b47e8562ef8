//! Wire types for the Content Suite backend.
//! Field names follow the backend JSON exactly; timestamps stay as the backend's
//! ISO-8601 text and are only parsed for display.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Creador,
    AprobadorA,
    AprobadorB,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Creador, Role::AprobadorA, Role::AprobadorB, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creador => "creador",
            Role::AprobadorA => "aprobador_a",
            Role::AprobadorB => "aprobador_b",
            Role::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Creador => "Creador de Contenido",
            Role::AprobadorA => "Aprobador de Contenido",
            Role::AprobadorB => "Auditor Visual",
            Role::Admin => "Administrador",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nombre: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: String,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String { "bearer".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandManual {
    pub id: String,
    pub nombre: String,
    pub producto: String,
    pub tono: String,
    #[serde(rename = "público_objetivo")]
    pub publico_objetivo: String,
    pub restricciones: String,
    #[serde(default)]
    pub contenido_markdown: Option<String>,
    pub version: i64,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBrandManual {
    pub nombre: String,
    pub producto: String,
    pub tono: String,
    #[serde(rename = "público_objetivo")]
    pub publico_objetivo: String,
    pub restricciones: String,
}

impl NewBrandManual {
    /// Name of the first blank field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("nombre", &self.nombre),
            ("producto", &self.producto),
            ("tono", &self.tono),
            ("público_objetivo", &self.publico_objetivo),
            ("restricciones", &self.restricciones),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoContenido {
    Descripcion,
    GuionVideo,
    PromptImagen,
}

impl TipoContenido {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoContenido::Descripcion => "descripcion",
            TipoContenido::GuionVideo => "guion_video",
            TipoContenido::PromptImagen => "prompt_imagen",
        }
    }
}

impl FromStr for TipoContenido {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "descripcion" => Ok(TipoContenido::Descripcion),
            "guion_video" => Ok(TipoContenido::GuionVideo),
            "prompt_imagen" => Ok(TipoContenido::PromptImagen),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    Pendiente,
    Aprobado,
    Rechazado,
}

impl Estado {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Pendiente => "pendiente",
            Estado::Aprobado => "aprobado",
            Estado::Rechazado => "rechazado",
        }
    }
}

impl FromStr for Estado {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pendiente" => Ok(Estado::Pendiente),
            "aprobado" => Ok(Estado::Aprobado),
            "rechazado" => Ok(Estado::Rechazado),
            other => Err(format!("unknown estado '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contenido {
    pub id: String,
    pub brand_manual_id: String,
    pub tipo: TipoContenido,
    pub titulo: String,
    #[serde(default)]
    pub contenido_text: Option<String>,
    pub estado: Estado,
    #[serde(default)]
    pub aprobado_por: Option<String>,
    #[serde(default)]
    pub rechazo_razon: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Contenido {
    /// Only approved content may be submitted for a visual audit.
    pub fn is_audit_eligible(&self) -> bool { self.estado == Estado::Aprobado }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContenido {
    pub brand_manual_id: String,
    pub tipo: TipoContenido,
    pub titulo: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resultado {
    pub cumple: bool,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auditoria {
    pub id: String,
    pub contenido_id: String,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub resultado: Option<Resultado>,
    #[serde(default)]
    pub gemini_analysis: Option<String>,
    #[serde(default)]
    pub score_conformidad: Option<f64>,
    #[serde(default)]
    pub audited_by: Option<String>,
    pub created_at: String,
}

impl Auditoria {
    pub fn cumple(&self) -> bool { self.resultado.map(|r| r.cumple).unwrap_or(false) }
}

/// Response of `POST /api/auditoria/image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub auditoria: Auditoria,
    #[serde(default)]
    pub analisis: String,
    #[serde(default)]
    pub score: f64,
}

/// Acknowledgement returned by approve/reject/delete. The embedded row is the
/// raw database record, kept untyped since pages always reload after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub message: String,
    #[serde(default)]
    pub contenido: Option<serde_json::Value>,
}

/// Image payload for an audit upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).to_string();
        Self { file_name, mime, bytes }
    }

    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
