use std::fmt::{Display, Formatter};

use crate::model::Role;

/// Navigable locations of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Creador,
    AprobadorA,
    AprobadorB,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::Creador => "/dashboard/creador",
            Route::AprobadorA => "/dashboard/aprobador-a",
            Route::AprobadorB => "/dashboard/aprobador-b",
            Route::Admin => "/dashboard/admin",
        }
    }

    /// Home dashboard for a role.
    pub fn home_for(role: Role) -> Route {
        match role {
            Role::Creador => Route::Creador,
            Role::AprobadorA => Route::AprobadorA,
            Role::AprobadorB => Route::AprobadorB,
            Role::Admin => Route::Admin,
        }
    }

    /// Accepts a full path or the last segment (`admin`, `aprobador-a`, `aprobador_a`).
    pub fn parse(s: &str) -> Option<Route> {
        let t = s.trim().trim_end_matches('/');
        let seg = t.rsplit('/').next().unwrap_or(t).replace('_', "-").to_ascii_lowercase();
        match seg.as_str() {
            "" | "login" => Some(Route::Login),
            "dashboard" => Some(Route::Dashboard),
            "creador" => Some(Route::Creador),
            "aprobador-a" => Some(Route::AprobadorA),
            "aprobador-b" => Some(Route::AprobadorB),
            "admin" => Some(Route::Admin),
            _ => None,
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.path()) }
}
