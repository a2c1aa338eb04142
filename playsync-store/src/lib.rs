mod auth;
mod db;
mod media;

pub mod util;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use media::*;

/// The PlaySync backend system, facilitating accounts, videos, and the social
/// features around them.
pub struct PlaySync {
    pub database: Arc<dyn Database>,
    pub media: Arc<dyn MediaStore>,

    pub auth: Auth,
}

impl PlaySync {
    pub fn new(
        database: impl Database + 'static,
        media: impl MediaStore + 'static,
        keys: AuthKeys,
    ) -> Self {
        let database: Arc<dyn Database> = Arc::new(database);
        let media: Arc<dyn MediaStore> = Arc::new(media);

        let auth = Auth::new(&database, keys);

        Self {
            database,
            media,
            auth,
        }
    }
}
