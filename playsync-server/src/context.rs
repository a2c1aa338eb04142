use std::sync::Arc;

use axum::extract::FromRef;
use playsync_store::PlaySync;

use crate::config::ServerConfig;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub playsync: Arc<PlaySync>,
    pub config: Arc<ServerConfig>,
}
