use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{AppError, AppResult};
use crate::model::User;
use crate::routes::Route;

const LOGIN_FAILED: &str = "Error al iniciar sesión";

/// Login screen. Not gated: a held token skips straight to the dashboard.
pub struct LoginPage {
    api: ApiClient,
    error: Option<String>,
    loading: bool,
}

impl LoginPage {
    pub fn new(api: ApiClient) -> Self { Self { api, error: None, loading: false } }

    pub fn mount(&self) -> Option<Route> { self.api.session().is_present().then_some(Route::Dashboard) }

    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn is_loading(&self) -> bool { self.loading }

    /// Returns the signed-in user's own dashboard on success.
    pub async fn submit(&mut self, email: &str, password: &str) -> AppResult<(User, Route)> {
        if email.trim().is_empty() || password.is_empty() {
            let e = AppError::validation("missing_credentials", "Ingrese email y contraseña");
            self.error = Some(e.message().to_string());
            return Err(e);
        }
        self.error = None;
        self.loading = true;
        let res = self.api.login(email.trim(), password).await;
        self.loading = false;
        match res {
            Ok(resp) => {
                info!(target: "auth", "signed in as {}", resp.user.email);
                let home = Route::home_for(resp.user.role);
                Ok((resp.user, home))
            }
            Err(e) => {
                warn!(target: "auth", "login failed: {}", e);
                self.error = Some(e.user_message(LOGIN_FAILED));
                Err(e)
            }
        }
    }
}
