use futures_util::future::BoxFuture;

use crate::client::{ApiClient, DEFAULT_AUDIT_LIMIT};
use crate::error::AppResult;
use crate::model::{ActionMessage, Auditoria, BrandManual, Contenido, Role};
use crate::routes::Route;

use super::{AdminStats, Dashboard, Mutation, Page};

pub struct Admin;

#[derive(Debug, Clone, Default)]
pub struct AdminData {
    pub manuals: Vec<BrandManual>,
    pub contenidos: Vec<Contenido>,
    pub auditorias: Vec<Auditoria>,
}

impl Dashboard for Admin {
    type Data = AdminData;
    const ROUTE: Route = Route::Admin;
    const TITLE: &'static str = "Content Suite - Administración";

    fn allowed_roles() -> Option<&'static [Role]> { Some(&[Role::Admin]) }

    fn load(api: ApiClient) -> BoxFuture<'static, AppResult<AdminData>> {
        Box::pin(async move {
            let (manuals, contenidos, auditorias) = tokio::try_join!(
                api.list_manuals(),
                api.list_contenido(None),
                api.list_auditorias(DEFAULT_AUDIT_LIMIT)
            )?;
            Ok(AdminData { manuals, contenidos, auditorias })
        })
    }
}

pub struct AdminPage {
    page: Page<Admin>,
}

impl AdminPage {
    pub fn new(api: ApiClient) -> Self { Self { page: Page::new(api) } }

    pub fn page(&self) -> &Page<Admin> { &self.page }
    pub fn page_mut(&mut self) -> &mut Page<Admin> { &mut self.page }

    pub async fn mount(&mut self) -> Option<Route> { self.page.mount().await }

    pub fn data(&self) -> &AdminData { self.page.data() }

    pub fn stats(&self) -> AdminStats {
        let d = self.page.data();
        AdminStats::compute(&d.manuals, &d.contenidos, &d.auditorias)
    }

    pub async fn delete_manual(&mut self, id: &str) -> AppResult<ActionMessage> {
        let id = id.to_string();
        self.page
            .mutate(Mutation::DeleteManual, "Error al eliminar manual", "Manual eliminado", |api| async move {
                api.delete_manual(&id).await
            })
            .await
    }
}
