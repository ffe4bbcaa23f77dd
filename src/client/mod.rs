//! Cliente tipado de la API para los portales (cliente y administración):
//! sesión local, protección de rutas, peticiones autenticadas y el panel de
//! gestión de presupuestos.

pub mod api;
pub mod guard;
pub mod panel;
pub mod session;

use uuid::Uuid;

pub use api::{ApiClient, Respuesta};
pub use guard::{proteger, Acceso};
pub use panel::PanelPresupuestos;
pub use session::{AuthSession, Navegacion, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum ClienteError {
    #[error("error de red: {0}")]
    Http(#[from] reqwest::Error),
    #[error("la API respondió {status}: {mensaje}")]
    Api { status: u16, mensaje: String },
    #[error("respuesta con formato inesperado: {0}")]
    Formato(#[from] serde_json::Error),
    #[error("no se pudo guardar la sesión: {0}")]
    Io(#[from] std::io::Error),
    #[error("ya hay un cambio en curso para el presupuesto {0}")]
    EnCurso(Uuid),
    #[error("el presupuesto {0} no está en el panel")]
    NoEncontrado(Uuid),
}
