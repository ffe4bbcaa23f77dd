use std::net::SocketAddr;

use anyhow::Context;
use muebles_api::{config::Settings, db, routes, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("configuración incompleta")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Sin base de datos el servidor arranca igual y los listados salen en modo demo
    let pool = match db::init_db(&settings).await {
        Ok(pool) => {
            tracing::info!("Conexión a Postgres exitosa");
            if settings.auto_migrate {
                db::esquema::aplicar(&pool).await.context("no se pudo aplicar el esquema")?;
                tracing::info!("Esquema aplicado");
            }
            pool
        }
        Err(e) => {
            tracing::error!("Error al conectar a la base de datos. ¿Está corriendo Postgres? {}", e);
            db::init_db_lazy(&settings).context("DATABASE_URL inválida")?
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let app = routes::app(AppState::new(pool, settings));

    tracing::info!("Taller escuchando en http://{}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Fallo al enlazar el puerto {}", addr.port()))?;
    axum::serve(listener, app).await?;
    Ok(())
}
