pub mod analyse;
pub mod interactions;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::state::SharedState;

pub fn api_routes() -> OpenApiRouter<SharedState> {
    OpenApiRouter::new()
        .routes(routes!(analyse::analyse))
        .routes(routes!(interactions::list))
        .routes(routes!(interactions::get))
}
