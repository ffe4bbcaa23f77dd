pub mod esquema;
pub mod presupuestos;
pub mod proyectos;
pub mod usuarios;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Settings;

// Definimos un alias para "Pool<Postgres>"
pub type DbPool = Pool<Postgres>;

/// SQLSTATE de PostgreSQL para `undefined_table`.
pub const SQLSTATE_TABLA_INEXISTENTE: &str = "42P01";
/// SQLSTATE de PostgreSQL para `unique_violation`.
pub const SQLSTATE_DUPLICADO: &str = "23505";

fn opciones(settings: &Settings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
}

pub async fn init_db(settings: &Settings) -> Result<DbPool, sqlx::Error> {
    opciones(settings).connect(&settings.database_url).await
}

/// Pool que no abre conexión hasta la primera consulta. El servidor arranca
/// aunque la base de datos todavía no esté disponible.
pub fn init_db_lazy(settings: &Settings) -> Result<DbPool, sqlx::Error> {
    opciones(settings).connect_lazy(&settings.database_url)
}

pub fn es_duplicado(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_DUPLICADO))
}

pub fn es_tabla_inexistente(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_TABLA_INEXISTENTE))
}
