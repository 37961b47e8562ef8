use futures_util::future::BoxFuture;

use crate::client::{validate_reject_reason, ApiClient};
use crate::error::AppResult;
use crate::model::{ActionMessage, Contenido, Estado, Role};
use crate::routes::Route;

use super::{ContentStats, Dashboard, Mutation, Page};

pub struct AprobadorA;

impl Dashboard for AprobadorA {
    type Data = Vec<Contenido>;
    const ROUTE: Route = Route::AprobadorA;
    const TITLE: &'static str = "Content Suite - Aprobador";

    fn allowed_roles() -> Option<&'static [Role]> { Some(&[Role::AprobadorA, Role::Admin]) }

    fn load(api: ApiClient) -> BoxFuture<'static, AppResult<Vec<Contenido>>> {
        Box::pin(async move { api.list_contenido(None).await })
    }
}

/// Approval queue: pending content with approve / reject-with-reason actions.
pub struct AprobadorAPage {
    page: Page<AprobadorA>,
    selected: Option<String>,
    reject_reason: String,
}

impl AprobadorAPage {
    pub fn new(api: ApiClient) -> Self {
        Self { page: Page::new(api), selected: None, reject_reason: String::new() }
    }

    pub fn page(&self) -> &Page<AprobadorA> { &self.page }
    pub fn page_mut(&mut self) -> &mut Page<AprobadorA> { &mut self.page }

    pub async fn mount(&mut self) -> Option<Route> { self.page.mount().await }

    pub fn all(&self) -> &[Contenido] { self.page.data() }

    pub fn pending(&self) -> Vec<&Contenido> {
        self.page.data().iter().filter(|c| c.estado == Estado::Pendiente).collect()
    }

    pub fn stats(&self) -> ContentStats { ContentStats::from_contenidos(self.page.data()) }

    /// Select a pending item for the detail pane. Unknown or already-decided ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        let ok = self.pending().iter().any(|c| c.id == id);
        if ok {
            self.selected = Some(id.to_string());
        }
        ok
    }

    pub fn clear_selection(&mut self) { self.selected = None; }

    pub fn selected(&self) -> Option<&Contenido> {
        let id = self.selected.as_deref()?;
        self.page.data().iter().find(|c| c.id == id)
    }

    pub fn set_reject_reason(&mut self, reason: &str) { self.reject_reason = reason.to_string(); }
    pub fn reject_reason(&self) -> &str { &self.reject_reason }

    pub async fn approve(&mut self, id: &str) -> AppResult<ActionMessage> {
        let id = id.to_string();
        let res = self
            .page
            .mutate(Mutation::Approve, "Error al aprobar contenido", "Contenido aprobado", |api| async move {
                api.approve(&id).await
            })
            .await;
        if res.is_ok() {
            self.selected = None;
        }
        res
    }

    /// Reject using the current reason text. A blank reason is reported
    /// locally and never sent.
    pub async fn reject(&mut self, id: &str) -> AppResult<ActionMessage> {
        if let Err(e) = validate_reject_reason(&self.reject_reason) {
            return self.page.fail_locally(e);
        }
        let id = id.to_string();
        let reason = self.reject_reason.clone();
        let res = self
            .page
            .mutate(Mutation::Reject, "Error al rechazar contenido", "Contenido rechazado", |api| async move {
                api.reject(&id, &reason).await
            })
            .await;
        if res.is_ok() {
            self.selected = None;
            self.reject_reason.clear();
        }
        res
    }
}
