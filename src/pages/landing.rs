use futures_util::future::BoxFuture;

use crate::client::ApiClient;
use crate::error::AppResult;
use crate::model::Role;
use crate::routes::Route;

use super::{Dashboard, Page};

/// Generic `/dashboard`: any signed-in user, no data of its own.
pub struct Landing;

impl Dashboard for Landing {
    type Data = ();
    const ROUTE: Route = Route::Dashboard;
    const TITLE: &'static str = "Content Suite";

    fn allowed_roles() -> Option<&'static [Role]> { None }

    fn load(_api: ApiClient) -> BoxFuture<'static, AppResult<()>> { Box::pin(async { Ok(()) }) }
}

impl Page<Landing> {
    pub fn role(&self) -> Option<Role> { self.user().map(|u| u.role) }

    pub fn role_label(&self) -> Option<&'static str> { self.role().map(|r| r.label()) }

    /// Dashboard the signed-in user belongs on.
    pub fn home(&self) -> Option<Route> { self.role().map(Route::home_for) }
}
