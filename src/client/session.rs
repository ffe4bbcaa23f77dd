use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::{api::ApiClient, ClienteError};
use crate::models::{
    presupuesto::FormularioPresupuesto,
    user::{Rol, Usuario},
};

pub const RUTA_LOGIN: &str = "/login";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DatosSesion {
    token: Option<String>,
    user: Option<Usuario>,
    presupuesto_temporal: Option<FormularioPresupuesto>,
}

/// Único dueño de la sesión local. Todos los que leen o escriben el token
/// pasan por aquí, con una sola clave y bajo un mismo cerrojo.
#[derive(Debug, Default)]
pub struct SessionStore {
    datos: RwLock<DatosSesion>,
    archivo: Option<PathBuf>,
}

impl SessionStore {
    pub fn en_memoria() -> Self {
        SessionStore::default()
    }

    /// Sesión persistida en un fichero JSON. Si el fichero existe se carga.
    pub fn con_archivo(ruta: impl AsRef<Path>) -> Result<Self, ClienteError> {
        let ruta = ruta.as_ref().to_path_buf();
        let datos = match fs::read_to_string(&ruta) {
            Ok(texto) => serde_json::from_str(&texto)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DatosSesion::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(SessionStore { datos: RwLock::new(datos), archivo: Some(ruta) })
    }

    pub fn token(&self) -> Option<String> {
        self.leer(|d| d.token.clone())
    }

    pub fn usuario(&self) -> Option<Usuario> {
        self.leer(|d| d.user.clone())
    }

    pub fn guardar(&self, token: &str, usuario: Usuario) -> Result<(), ClienteError> {
        self.modificar(|d| {
            d.token = Some(token.to_string());
            d.user = Some(usuario);
        })
    }

    pub fn actualizar_usuario(&self, usuario: Usuario) -> Result<(), ClienteError> {
        self.modificar(|d| d.user = Some(usuario))
    }

    /// Borra token y usuario. El presupuesto pendiente de enviar se conserva.
    pub fn limpiar(&self) -> Result<(), ClienteError> {
        self.modificar(|d| {
            d.token = None;
            d.user = None;
        })
    }

    /// Guarda el formulario de un visitante sin sesión para recuperarlo tras el login.
    pub fn guardar_presupuesto_temporal(&self, form: FormularioPresupuesto) -> Result<(), ClienteError> {
        self.modificar(|d| d.presupuesto_temporal = Some(form))
    }

    pub fn tomar_presupuesto_temporal(&self) -> Result<Option<FormularioPresupuesto>, ClienteError> {
        let mut tomado = None;
        self.modificar(|d| tomado = d.presupuesto_temporal.take())?;
        Ok(tomado)
    }

    fn leer<T>(&self, f: impl FnOnce(&DatosSesion) -> T) -> T {
        let datos = self.datos.read().unwrap_or_else(PoisonError::into_inner);
        f(&datos)
    }

    // Se escribe el fichero sin soltar el cerrojo: dos escrituras no se pisan
    fn modificar(&self, f: impl FnOnce(&mut DatosSesion)) -> Result<(), ClienteError> {
        let mut datos = self.datos.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut datos);
        if let Some(ruta) = &self.archivo {
            let temporal = ruta.with_extension("tmp");
            fs::write(&temporal, serde_json::to_vec_pretty(&*datos)?)?;
            fs::rename(&temporal, ruta)?;
        }
        Ok(())
    }
}

/// Qué debe hacer la interfaz después de una operación de sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navegacion {
    Quedarse,
    Ir(&'static str),
}

/// Estado de autenticación de la aplicación: usuario actual, carga inicial
/// y redirecciones por rol.
pub struct AuthSession {
    api: ApiClient,
    cargando: AtomicBool,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        AuthSession { api, cargando: AtomicBool::new(true) }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.api.sesion()
    }

    pub fn is_loading(&self) -> bool {
        self.cargando.load(Ordering::Acquire)
    }

    pub fn usuario(&self) -> Option<Usuario> {
        self.store().usuario()
    }

    /// Valida el token guardado contra `/api/auth/validate`. Si el servidor lo
    /// rechaza se borra la sesión y se manda al login. Un fallo de red no
    /// cierra la sesión.
    pub async fn restaurar(&self) -> Result<Navegacion, ClienteError> {
        self.cargando.store(true, Ordering::Release);
        let resultado = self.validar().await;
        self.cargando.store(false, Ordering::Release);
        resultado
    }

    async fn validar(&self) -> Result<Navegacion, ClienteError> {
        if self.store().token().is_none() {
            return Ok(Navegacion::Quedarse);
        }

        let respuesta = self.api.validar().await;
        if respuesta.status == 0 {
            tracing::warn!("No se pudo validar la sesión: {:?}", respuesta.error);
            return Ok(Navegacion::Quedarse);
        }
        if !respuesta.ok() {
            tracing::info!("Sesión rechazada por el servidor ({})", respuesta.status);
            self.store().limpiar()?;
            return Ok(Navegacion::Ir(RUTA_LOGIN));
        }

        if let Some(user) = respuesta.data.as_ref().and_then(|d| d.get("user")) {
            let usuario: Usuario = serde_json::from_value(user.clone())?;
            self.store().actualizar_usuario(usuario)?;
        }
        Ok(Navegacion::Quedarse)
    }

    /// Guarda la sesión y devuelve la página de inicio del rol.
    pub fn login(&self, usuario: Usuario, token: &str) -> Result<&'static str, ClienteError> {
        let destino = usuario.rol.destino();
        self.store().guardar(token, usuario)?;
        Ok(destino)
    }

    pub fn logout(&self) -> Result<&'static str, ClienteError> {
        self.store().limpiar()?;
        Ok(RUTA_LOGIN)
    }

    pub fn has_role(&self, rol: Rol) -> bool {
        self.store().leer(|d| d.user.as_ref().is_some_and(|u| u.rol == rol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presupuesto::Dimensiones;
    use chrono::Utc;
    use uuid::Uuid;

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: Uuid::new_v4(),
            nombre: "Elena".into(),
            apellidos: Some("Martín".into()),
            email: "elena@correo.es".into(),
            password_hash: String::new(),
            telefono: None,
            direccion: None,
            ciudad: Some("Toledo".into()),
            codigo_postal: None,
            provincia: None,
            rol,
            fecha_registro: Utc::now(),
        }
    }

    fn formulario() -> FormularioPresupuesto {
        FormularioPresupuesto {
            nombre: "Elena".into(),
            categoria: "mesa".into(),
            material: "pino".into(),
            acabado: "natural".into(),
            dimensiones: Dimensiones { ancho: 100.0, alto: 75.0, profundidad: 60.0 },
            unidades: 1,
            comentarios: None,
            total_cliente: Some(1470.0),
        }
    }

    #[test]
    fn guardar_y_limpiar() {
        let store = SessionStore::en_memoria();
        assert!(store.token().is_none());

        store.guardar("abc", usuario(Rol::Client)).unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));
        assert_eq!(store.usuario().map(|u| u.rol), Some(Rol::Client));

        store.limpiar().unwrap();
        assert!(store.token().is_none());
        assert!(store.usuario().is_none());
    }

    #[test]
    fn presupuesto_temporal_se_toma_una_vez() {
        let store = SessionStore::en_memoria();
        store.guardar_presupuesto_temporal(formulario()).unwrap();
        store.limpiar().unwrap();

        let tomado = store.tomar_presupuesto_temporal().unwrap().unwrap();
        assert_eq!(tomado.categoria, "mesa");
        assert!(store.tomar_presupuesto_temporal().unwrap().is_none());
    }

    #[test]
    fn persiste_en_fichero() {
        let dir = tempfile::tempdir().unwrap();
        let ruta = dir.path().join("sesion.json");

        let store = SessionStore::con_archivo(&ruta).unwrap();
        store.guardar("tok-1", usuario(Rol::Admin)).unwrap();
        drop(store);

        let recargado = SessionStore::con_archivo(&ruta).unwrap();
        assert_eq!(recargado.token().as_deref(), Some("tok-1"));
        assert_eq!(recargado.usuario().map(|u| u.rol), Some(Rol::Admin));
        // el hash nunca llega al fichero
        let texto = std::fs::read_to_string(&ruta).unwrap();
        assert!(!texto.contains("password_hash"));
    }

    #[test]
    fn escrituras_concurrentes_no_se_pierden() {
        let store = Arc::new(SessionStore::en_memoria());
        let hilos: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.guardar(&format!("tok-{i}"), usuario(Rol::Client)).unwrap();
                })
            })
            .collect();
        for h in hilos {
            h.join().unwrap();
        }
        let token = store.token().unwrap();
        assert!(token.starts_with("tok-"));
        assert!(store.usuario().is_some());
    }

    #[test]
    fn login_logout_y_roles() {
        let api = ApiClient::new(
            "http://127.0.0.1:1",
            Arc::new(SessionStore::en_memoria()),
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let auth = AuthSession::new(api);

        assert_eq!(auth.login(usuario(Rol::Admin), "t").unwrap(), "/dashboard");
        assert!(auth.has_role(Rol::Admin));
        assert!(!auth.has_role(Rol::Client));

        assert_eq!(auth.logout().unwrap(), "/login");
        assert!(!auth.has_role(Rol::Admin));
        assert!(auth.usuario().is_none());

        assert_eq!(auth.login(usuario(Rol::Usuario), "t").unwrap(), "/client-portal");
    }

    #[tokio::test]
    async fn restaurar_sin_token_no_redirige() {
        let api = ApiClient::new(
            "http://127.0.0.1:1",
            Arc::new(SessionStore::en_memoria()),
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let auth = AuthSession::new(api);
        assert!(auth.is_loading());
        assert_eq!(auth.restaurar().await.unwrap(), Navegacion::Quedarse);
        assert!(!auth.is_loading());
    }

    #[tokio::test]
    async fn fallo_de_red_conserva_la_sesion() {
        let store = Arc::new(SessionStore::en_memoria());
        store.guardar("tok", usuario(Rol::Client)).unwrap();
        let api = ApiClient::new("http://127.0.0.1:1", Arc::clone(&store), std::time::Duration::from_millis(200)).unwrap();
        let auth = AuthSession::new(api);

        assert_eq!(auth.restaurar().await.unwrap(), Navegacion::Quedarse);
        assert_eq!(store.token().as_deref(), Some("tok"));
    }
}
