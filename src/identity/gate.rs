use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::model::{Role, User};
use crate::routes::Route;

/// Per-page gate configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOptions {
    /// Roles permitted on the page; `None` admits any signed-in user.
    pub allowed_roles: Option<Vec<Role>>,
    /// Navigate to login when there is no usable session.
    pub redirect_to_login: bool,
    /// Navigate to the generic dashboard when the role is not allowed.
    pub redirect_on_unauthorized: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self { allowed_roles: None, redirect_to_login: true, redirect_on_unauthorized: true }
    }
}

impl GateOptions {
    pub fn allow(roles: &[Role]) -> Self {
        Self { allowed_roles: Some(roles.to_vec()), ..Self::default() }
    }

    pub fn without_redirects(mut self) -> Self {
        self.redirect_to_login = false;
        self.redirect_on_unauthorized = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Resolving,
    Authorized,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub state: GateState,
    pub user: Option<User>,
    pub has_access: bool,
    /// Navigation the page must perform; once set the page instance is done.
    pub redirect: Option<Route>,
}

impl GateOutcome {
    fn resolving() -> Self { Self { state: GateState::Resolving, user: None, has_access: true, redirect: None } }

    fn denied(user: Option<User>, has_access: bool, redirect: Option<Route>) -> Self {
        Self { state: GateState::Denied, user, has_access, redirect }
    }

    pub fn is_authenticated(&self) -> bool { self.user.is_some() }
}

pub fn role_allowed(allowed: Option<&[Role]>, role: Role) -> bool {
    allowed.map(|a| a.contains(&role)).unwrap_or(true)
}

/// Resolves the signed-in user for one page mount and applies the page's role allow-list.
pub struct AuthGate {
    api: ApiClient,
    options: GateOptions,
    outcome: GateOutcome,
}

impl AuthGate {
    pub fn new(api: ApiClient, options: GateOptions) -> Self {
        Self { api, options, outcome: GateOutcome::resolving() }
    }

    pub fn options(&self) -> &GateOptions { &self.options }
    pub fn outcome(&self) -> &GateOutcome { &self.outcome }
    pub fn state(&self) -> GateState { self.outcome.state }
    pub fn user(&self) -> Option<&User> { self.outcome.user.as_ref() }
    pub fn has_access(&self) -> bool { self.outcome.has_access }
    pub fn is_authenticated(&self) -> bool { self.outcome.is_authenticated() }
    pub fn redirect(&self) -> Option<Route> { self.outcome.redirect }
    pub fn is_loading(&self) -> bool { self.outcome.state == GateState::Resolving }

    /// Runs once; later calls return the settled outcome without touching the backend.
    pub async fn resolve(&mut self) -> &GateOutcome {
        if self.outcome.state != GateState::Resolving {
            return &self.outcome;
        }
        self.outcome = self.resolve_once().await;
        debug!(target: "auth", "gate settled state={:?} redirect={:?}", self.outcome.state, self.outcome.redirect);
        &self.outcome
    }

    async fn resolve_once(&self) -> GateOutcome {
        let session = self.api.session();
        if !session.is_present() {
            let redirect = self.options.redirect_to_login.then_some(Route::Login);
            return GateOutcome::denied(None, true, redirect);
        }
        match self.api.get_me().await {
            Ok(user) => {
                if role_allowed(self.options.allowed_roles.as_deref(), user.role) {
                    info!(target: "auth", "authorized user={} role={}", user.email, user.role);
                    GateOutcome { state: GateState::Authorized, user: Some(user), has_access: true, redirect: None }
                } else {
                    warn!(target: "auth", "role {} not allowed here", user.role);
                    let redirect = self.options.redirect_on_unauthorized.then_some(Route::Dashboard);
                    GateOutcome::denied(Some(user), false, redirect)
                }
            }
            Err(e) => {
                warn!(target: "auth", "session rejected: {}", e);
                session.clear();
                let redirect = self.options.redirect_to_login.then_some(Route::Login);
                GateOutcome::denied(None, true, redirect)
            }
        }
    }

    /// Clears the session and sends the user to login, whatever the current state.
    pub fn logout(&mut self) -> Route {
        self.api.session().clear();
        self.outcome = GateOutcome::denied(None, true, Some(Route::Login));
        info!(target: "auth", "logged out");
        Route::Login
    }
}

/// Whether the signed-in user holds exactly `role`. Never redirects.
pub async fn role_check(api: &ApiClient, role: Role) -> (Option<User>, bool) {
    if !api.session().is_present() {
        return (None, false);
    }
    match api.get_me().await {
        Ok(u) => {
            let has = u.role == role;
            (Some(u), has)
        }
        Err(_) => (None, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_semantics() {
        assert!(role_allowed(None, Role::Creador));
        assert!(role_allowed(Some(&[Role::Admin, Role::AprobadorB]), Role::AprobadorB));
        assert!(!role_allowed(Some(&[Role::Admin]), Role::Creador));
        assert!(!role_allowed(Some(&[]), Role::Admin));
    }

    #[test]
    fn options_builders() {
        let o = GateOptions::allow(&[Role::Admin]).without_redirects();
        assert_eq!(o.allowed_roles, Some(vec![Role::Admin]));
        assert!(!o.redirect_to_login && !o.redirect_on_unauthorized);
        let d = GateOptions::default();
        assert!(d.redirect_to_login && d.redirect_on_unauthorized && d.allowed_roles.is_none());
    }

    #[tokio::test]
    async fn no_token_settles_without_request() {
        let api = ApiClient::new(reqwest::Url::parse("http://127.0.0.1:9").unwrap(), crate::identity::SessionProvider::in_memory()).unwrap();

        let mut gate = AuthGate::new(api.clone(), GateOptions::default());
        assert!(gate.is_loading());
        let out = gate.resolve().await.clone();
        assert_eq!(out.state, GateState::Denied);
        assert_eq!(out.redirect, Some(Route::Login));

        let mut quiet = AuthGate::new(api, GateOptions::default().without_redirects());
        let out = quiet.resolve().await;
        assert_eq!(out.state, GateState::Denied);
        assert_eq!(out.redirect, None);
        assert!(!out.is_authenticated());
    }
}
