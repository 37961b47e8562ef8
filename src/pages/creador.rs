use futures_util::future::BoxFuture;

use crate::client::ApiClient;
use crate::error::{AppError, AppResult};
use crate::model::{BrandManual, Contenido, NewBrandManual, NewContenido, Role};
use crate::routes::Route;

use super::{Dashboard, Mutation, Page};

pub struct Creador;

#[derive(Debug, Clone, Default)]
pub struct CreadorData {
    pub manuals: Vec<BrandManual>,
    pub contenidos: Vec<Contenido>,
}

impl Dashboard for Creador {
    type Data = CreadorData;
    const ROUTE: Route = Route::Creador;
    const TITLE: &'static str = "Content Suite - Creador";

    fn allowed_roles() -> Option<&'static [Role]> { Some(&[Role::Creador, Role::Admin]) }

    fn load(api: ApiClient) -> BoxFuture<'static, AppResult<CreadorData>> {
        Box::pin(async move {
            let (manuals, contenidos) = tokio::try_join!(api.list_manuals(), api.list_contenido(None))?;
            Ok(CreadorData { manuals, contenidos })
        })
    }
}

/// Creator workspace: brand manuals and generated content.
pub struct CreadorPage {
    page: Page<Creador>,
}

impl CreadorPage {
    pub fn new(api: ApiClient) -> Self { Self { page: Page::new(api) } }

    pub fn page(&self) -> &Page<Creador> { &self.page }
    pub fn page_mut(&mut self) -> &mut Page<Creador> { &mut self.page }

    pub async fn mount(&mut self) -> Option<Route> { self.page.mount().await }

    pub fn manuals(&self) -> &[BrandManual] { &self.page.data().manuals }
    pub fn contenidos(&self) -> &[Contenido] { &self.page.data().contenidos }

    pub async fn create_manual(&mut self, fields: NewBrandManual) -> AppResult<BrandManual> {
        if let Some(field) = fields.missing_field() {
            return self.page.fail_locally(AppError::validation("missing_field".to_string(), format!("El campo '{}' es obligatorio", field)));
        }
        self.page
            .mutate(Mutation::CreateManual, "Error al crear manual", "Manual de marca creado correctamente", |api| async move {
                api.create_manual(&fields).await
            })
            .await
    }

    /// Generate content against one of the loaded manuals.
    pub async fn create_contenido(&mut self, fields: NewContenido) -> AppResult<Contenido> {
        if self.manuals().is_empty() {
            return self.page.fail_locally(AppError::validation("no_manuals", "Primero debe crear un manual de marca"));
        }
        if fields.titulo.trim().is_empty() {
            return self.page.fail_locally(AppError::validation("missing_field", "El título es obligatorio"));
        }
        if !self.manuals().iter().any(|m| m.id == fields.brand_manual_id) {
            return self.page.fail_locally(AppError::validation("unknown_manual", "Seleccione un manual de marca válido"));
        }
        self.page
            .mutate(Mutation::CreateContenido, "Error al generar contenido", "Contenido generado correctamente", |api| async move {
                api.create_contenido(&fields).await
            })
            .await
    }
}
