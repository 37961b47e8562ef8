use std::collections::{HashMap, HashSet};

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::client::{ApiClient, DEFAULT_AUDIT_LIMIT};
use crate::error::{AppError, AppResult};
use crate::model::{AnalysisResult, Auditoria, Contenido, Estado, ImageUpload, Role};
use crate::routes::Route;

use super::{Dashboard, Mutation, Page};

pub struct AprobadorB;

#[derive(Debug, Clone, Default)]
pub struct AuditData {
    pub aprobados: Vec<Contenido>,
    pub auditorias: Vec<Auditoria>,
}

impl Dashboard for AprobadorB {
    type Data = AuditData;
    const ROUTE: Route = Route::AprobadorB;
    const TITLE: &'static str = "Content Suite - Auditor Visual";

    fn allowed_roles() -> Option<&'static [Role]> { Some(&[Role::AprobadorB, Role::Admin]) }

    fn load(api: ApiClient) -> BoxFuture<'static, AppResult<AuditData>> {
        Box::pin(async move {
            let (aprobados, auditorias) = tokio::try_join!(
                api.list_contenido(Some(Estado::Aprobado)),
                api.list_auditorias(DEFAULT_AUDIT_LIMIT)
            )?;
            Ok(AuditData { aprobados, auditorias })
        })
    }
}

/// Visual audit workspace. Approved content is paired with an uploaded image
/// and sent for analysis; past audits expand inline with their stored image.
pub struct AprobadorBPage {
    page: Page<AprobadorB>,
    selected_content: Option<String>,
    selected_image: Option<ImageUpload>,
    analysis: Option<AnalysisResult>,
    expanded: Option<String>,
    images: HashMap<String, String>,
}

impl AprobadorBPage {
    pub fn new(api: ApiClient) -> Self {
        Self {
            page: Page::new(api),
            selected_content: None,
            selected_image: None,
            analysis: None,
            expanded: None,
            images: HashMap::new(),
        }
    }

    pub fn page(&self) -> &Page<AprobadorB> { &self.page }
    pub fn page_mut(&mut self) -> &mut Page<AprobadorB> { &mut self.page }

    pub async fn mount(&mut self) -> Option<Route> { self.page.mount().await }

    pub fn aprobados(&self) -> &[Contenido] { &self.page.data().aprobados }
    pub fn auditorias(&self) -> &[Auditoria] { &self.page.data().auditorias }

    /// Pick the content to audit. Only approved items are accepted.
    pub fn select_content(&mut self, id: &str) -> bool {
        let ok = self.aprobados().iter().any(|c| c.id == id && c.is_audit_eligible());
        if ok {
            self.selected_content = Some(id.to_string());
        }
        ok
    }

    pub fn selected_content(&self) -> Option<&Contenido> {
        let id = self.selected_content.as_deref()?;
        self.aprobados().iter().find(|c| c.id == id)
    }

    pub fn choose_image(&mut self, image: ImageUpload) { self.selected_image = Some(image); }
    pub fn selected_image(&self) -> Option<&ImageUpload> { self.selected_image.as_ref() }

    pub fn analysis(&self) -> Option<&AnalysisResult> { self.analysis.as_ref() }

    /// Submit the selected pair for analysis. Both parts are required before
    /// anything is sent. On success the selection is cleared and the result kept.
    pub async fn analyze(&mut self) -> AppResult<AnalysisResult> {
        let (Some(contenido_id), Some(image)) = (self.selected_content.clone(), self.selected_image.clone()) else {
            return self.page.fail_locally(AppError::validation("incomplete_selection", "Seleccione un contenido y una imagen"));
        };
        self.analysis = None;
        let res = self
            .page
            .mutate(Mutation::Audit, "Error al analizar imagen", "Análisis completado", |api| async move {
                api.audit_image(&contenido_id, image).await
            })
            .await;
        if let Ok(r) = &res {
            self.analysis = Some(r.clone());
            self.selected_content = None;
            self.selected_image = None;
        }
        res
    }

    pub fn expanded(&self) -> Option<&str> { self.expanded.as_deref() }

    pub fn expanded_set(&self) -> HashSet<String> { self.expanded.iter().cloned().collect() }

    pub fn images(&self) -> &HashMap<String, String> { &self.images }

    /// Expand an audit (collapsing any other) or collapse it if already open.
    /// The stored image is fetched on first expansion only.
    pub async fn toggle_audit(&mut self, id: &str) -> bool {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
            return false;
        }
        self.expanded = Some(id.to_string());
        self.ensure_image(id).await;
        true
    }

    /// Cached image for an audit, fetched on first use.
    pub async fn ensure_image(&mut self, id: &str) -> Option<&str> {
        if !self.images.contains_key(id) {
            self.load_image(id).await;
        }
        self.images.get(id).map(String::as_str)
    }

    /// A failed fetch is logged and not cached, so the next expansion retries.
    async fn load_image(&mut self, id: &str) {
        match self.page.api().get_audit_image(id).await {
            Ok(url) => {
                debug!(target: "page", "cached image for audit {}", id);
                self.images.insert(id.to_string(), url);
            }
            Err(e) => warn!(target: "page", "error loading image for audit {}: {}", id, e),
        }
    }
}
