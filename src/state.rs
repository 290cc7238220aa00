use crate::db::{DbPool, OrmConn};

// Both handles point at the same database: the sqlx pool serves the raw
// queries (auth, cart, audit trail), the SeaORM connection the entities.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}
