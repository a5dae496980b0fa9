pub mod admin_users;
pub mod dashboard;
pub mod members;
pub mod orders;
pub mod products;
pub mod support;
pub mod tally;
pub mod upload;

use axum::{middleware, Router};

use crate::middleware::{auth_middleware, require_admin_manager};
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let skip_auth = state.config.testing_mode;

    let staff_routes = Router::new()
        .merge(dashboard::routes())
        .merge(products::routes())
        .merge(orders::routes())
        .merge(members::routes())
        .merge(support::routes())
        .merge(tally::routes())
        .merge(upload::routes());

    if skip_auth {
        return staff_routes.merge(admin_users::routes());
    }

    let manager_routes = admin_users::routes().route_layer(middleware::from_fn(require_admin_manager));

    staff_routes
        .merge(manager_routes)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
