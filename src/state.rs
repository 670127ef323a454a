use crate::db::{DbPool, OrmConn};
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub uploads: UploadStore,
}
