//!
//! Role-gated pages
//! ----------------
//! Every dashboard runs the same loop: resolve the auth gate, load its
//! collections concurrently, render, dispatch a mutation, reload everything on
//! success. `Page<D>` owns that loop; a `Dashboard` impl only names its allowed
//! roles, its data and how to load it.

use std::collections::HashSet;
use std::future::Future;

use futures_util::future::BoxFuture;
use tracing::{debug, error, warn};

use crate::client::ApiClient;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthGate, GateOptions, GateState};
use crate::model::{Role, User};
use crate::routes::Route;

pub mod admin;
pub mod aprobador_a;
pub mod aprobador_b;
pub mod creador;
pub mod landing;
pub mod login;
pub mod stats;

pub use admin::{Admin, AdminPage};
pub use aprobador_a::{AprobadorA, AprobadorAPage};
pub use aprobador_b::{AprobadorB, AprobadorBPage};
pub use creador::{Creador, CreadorPage};
pub use landing::Landing;
pub use login::LoginPage;
pub use stats::{AdminStats, ContentStats};

/// Static description of one dashboard.
pub trait Dashboard {
    type Data: Default + Send + 'static;

    const ROUTE: Route;
    const TITLE: &'static str;

    /// `None` admits any signed-in user.
    fn allowed_roles() -> Option<&'static [Role]>;

    /// Fetch every collection the page shows. Independent fetches run concurrently.
    fn load(api: ApiClient) -> BoxFuture<'static, AppResult<Self::Data>>;
}

/// Mutation kinds; each has its own in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    CreateManual,
    CreateContenido,
    Approve,
    Reject,
    DeleteManual,
    Audit,
}

/// In-flight flags. A kind already running refuses a second dispatch.
///
/// `Page::mutate` borrows the page exclusively, so on a single page the borrow
/// already rules out a duplicate submission; the flag is set only while that
/// call is pending and is always clear by the time it returns. It stays as the
/// per-kind record a shared owner (e.g. a UI holding the page behind a lock)
/// would consult to disable the matching control.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: HashSet<Mutation>,
}

impl InFlight {
    pub fn begin(&mut self, kind: Mutation) -> bool { self.busy.insert(kind) }
    pub fn end(&mut self, kind: Mutation) { self.busy.remove(&kind); }
    pub fn is_busy(&self, kind: Mutation) -> bool { self.busy.contains(&kind) }
}

pub struct Page<D: Dashboard> {
    api: ApiClient,
    gate: AuthGate,
    data: D::Data,
    loading: bool,
    error: Option<String>,
    success: Option<String>,
    in_flight: InFlight,
    redirect: Option<Route>,
}

impl<D: Dashboard> Page<D> {
    pub fn new(api: ApiClient) -> Self {
        let options = match D::allowed_roles() {
            Some(roles) => GateOptions::allow(roles),
            None => GateOptions::default(),
        };
        Self::with_options(api, options)
    }

    pub fn with_options(api: ApiClient, options: GateOptions) -> Self {
        let gate = AuthGate::new(api.clone(), options);
        Self {
            api,
            gate,
            data: D::Data::default(),
            loading: true,
            error: None,
            success: None,
            in_flight: InFlight::default(),
            redirect: None,
        }
    }

    /// Resolve the gate and, when authorized, load the page. Returns the
    /// navigation the caller must perform, if any.
    pub async fn mount(&mut self) -> Option<Route> {
        let outcome = self.gate.resolve().await.clone();
        if let Some(r) = outcome.redirect {
            self.redirect = Some(r);
            return Some(r);
        }
        if outcome.state == GateState::Authorized {
            self.reload().await;
        } else {
            self.loading = false;
        }
        None
    }

    /// Re-fetch every collection. On failure the previous data stays on screen.
    pub async fn reload(&mut self) -> bool {
        if self.gate.state() != GateState::Authorized {
            return false;
        }
        let res = D::load(self.api.clone()).await;
        self.loading = false;
        match res {
            Ok(data) => {
                self.data = data;
                debug!(target: "page", "{} reloaded", D::ROUTE);
                true
            }
            Err(e) => {
                error!(target: "page", "error loading {}: {}", D::ROUTE, e);
                if e.is_unauthorized() {
                    self.redirect = Some(Route::Login);
                }
                false
            }
        }
    }

    /// Dispatch one mutation. Success sets `done` as the status message and
    /// reloads in full; failure sets the error message and leaves data untouched.
    pub async fn mutate<T, F, Fut>(&mut self, kind: Mutation, fallback: &str, done: &str, op: F) -> AppResult<T>
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if !self.in_flight.begin(kind) {
            return Err(AppError::validation("busy".to_string(), format!("{:?} already in progress", kind)));
        }
        self.error = None;
        self.success = None;
        let res = op(self.api.clone()).await;
        self.in_flight.end(kind);
        match res {
            Ok(v) => {
                self.success = Some(done.to_string());
                self.reload().await;
                Ok(v)
            }
            Err(e) => {
                warn!(target: "page", "{:?} failed on {}: {}", kind, D::ROUTE, e);
                self.error = Some(e.user_message(fallback));
                if e.is_unauthorized() {
                    self.redirect = Some(Route::Login);
                }
                Err(e)
            }
        }
    }

    /// Record a client-side rejection without contacting the backend.
    pub fn fail_locally<T>(&mut self, err: AppError) -> AppResult<T> {
        self.success = None;
        self.error = Some(err.message().to_string());
        Err(err)
    }

    pub fn logout(&mut self) -> Route {
        let r = self.gate.logout();
        self.redirect = Some(r);
        r
    }

    pub fn api(&self) -> &ApiClient { &self.api }
    pub fn gate(&self) -> &AuthGate { &self.gate }
    pub fn user(&self) -> Option<&User> { self.gate.user() }
    pub fn data(&self) -> &D::Data { &self.data }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn is_busy(&self, kind: Mutation) -> bool { self.in_flight.is_busy(kind) }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn success(&self) -> Option<&str> { self.success.as_deref() }
    pub fn redirect(&self) -> Option<Route> { self.redirect }
    pub fn title(&self) -> &'static str { D::TITLE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_blocks_same_kind_only() {
        let mut f = InFlight::default();
        assert!(f.begin(Mutation::Approve));
        assert!(!f.begin(Mutation::Approve));
        assert!(f.begin(Mutation::Reject));
        assert!(f.is_busy(Mutation::Approve));
        f.end(Mutation::Approve);
        assert!(!f.is_busy(Mutation::Approve));
        assert!(f.begin(Mutation::Approve));
    }
}
