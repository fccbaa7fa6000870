use std::sync::Arc;

use sqlx::PgPool;

use crate::proxy::ProxyHandler;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub proxy: Arc<ProxyHandler>,
}
