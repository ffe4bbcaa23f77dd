use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::{session::SessionStore, ClienteError};
use crate::{
    models::{
        presupuesto::{ActualizarEstado, EstadoPresupuesto, Importe, Presupuesto},
        user::AuthResponse,
    },
    services::{calculadora::SolicitudCalculo, demo::Listado},
};

pub const TIMEOUT_POR_DEFECTO: Duration = Duration::from_secs(10);

/// Resultado uniforme de una petición. `status` vale 0 cuando no hubo
/// respuesta (red caída, tiempo agotado).
#[derive(Debug, Clone, PartialEq)]
pub struct Respuesta {
    pub data: Option<Value>,
    pub status: u16,
    pub error: Option<String>,
}

impl Respuesta {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convierte el cuerpo en `T`, o en error si la petición no fue bien.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ClienteError> {
        if !self.ok() {
            return Err(ClienteError::Api {
                status: self.status,
                mensaje: self.error.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(self.data.unwrap_or(Value::Null))?)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    sesion: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, sesion: Arc<SessionStore>, timeout: Duration) -> Result<Self, ClienteError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(ApiClient { http, base, sesion })
    }

    pub fn sesion(&self) -> &Arc<SessionStore> {
        &self.sesion
    }

    fn url(&self, ruta: &str) -> String {
        format!("{}{}", self.base, ruta)
    }

    async fn ejecutar(
        &self,
        metodo: Method,
        ruta: &str,
        consulta: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Respuesta, reqwest::Error> {
        let mut peticion = self.http.request(metodo, self.url(ruta)).query(consulta);
        if let Some(token) = self.sesion.token() {
            peticion = peticion.bearer_auth(token);
        }
        if let Some(body) = body {
            peticion = peticion.json(body);
        }

        let respuesta = peticion.send().await?;
        let status = respuesta.status().as_u16();
        let es_json = respuesta
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let texto = respuesta.text().await?;
        let data = if es_json { serde_json::from_str::<Value>(&texto).ok() } else { None };

        if (200..300).contains(&status) {
            return Ok(Respuesta { data, status, error: None });
        }

        let error = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(texto);
        Ok(Respuesta { data, status, error: Some(error) })
    }

    /// Petición con el token de la sesión (si lo hay). Nunca falla: los
    /// errores de red y de la API quedan en `Respuesta`.
    pub async fn authenticated_fetch(&self, metodo: Method, ruta: &str, body: Option<&Value>) -> Respuesta {
        match self.ejecutar(metodo.clone(), ruta, &[], body).await {
            Ok(respuesta) => {
                if let Some(error) = &respuesta.error {
                    tracing::debug!("{} {} -> {}: {}", metodo, ruta, respuesta.status, error);
                }
                respuesta
            }
            Err(e) => {
                tracing::warn!("{} {} sin respuesta: {}", metodo, ruta, e);
                Respuesta { data: None, status: 0, error: Some(e.to_string()) }
            }
        }
    }

    async fn enviar<T: DeserializeOwned>(&self, metodo: Method, ruta: &str, body: Option<&Value>) -> Result<T, ClienteError> {
        self.ejecutar(metodo, ruta, &[], body).await?.json()
    }

    pub async fn validar(&self) -> Respuesta {
        self.authenticated_fetch(Method::GET, "/api/auth/validate", None).await
    }

    /// Inicia sesión y guarda token y usuario en la sesión local.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClienteError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let auth: AuthResponse = self.enviar(Method::POST, "/api/auth/login", Some(&body)).await?;
        self.sesion.guardar(&auth.token, auth.user.clone())?;
        Ok(auth)
    }

    pub async fn calcular(&self, solicitud: &SolicitudCalculo) -> Result<Importe, ClienteError> {
        let body = serde_json::to_value(solicitud)?;
        self.enviar(Method::POST, "/api/presupuestos/calcular", Some(&body)).await
    }

    pub async fn listar_presupuestos(
        &self,
        estado: Option<EstadoPresupuesto>,
        limite: Option<i64>,
    ) -> Result<Listado<Presupuesto>, ClienteError> {
        let mut consulta = Vec::new();
        if let Some(estado) = estado {
            consulta.push(("estado", estado.to_string()));
        }
        if let Some(limite) = limite {
            consulta.push(("limite", limite.to_string()));
        }
        self.ejecutar(Method::GET, "/api/presupuestos/listar", &consulta, None)
            .await?
            .json()
    }

    pub async fn actualizar_estado_presupuesto(
        &self,
        id: Uuid,
        estado: EstadoPresupuesto,
        mensaje: Option<String>,
    ) -> Result<Presupuesto, ClienteError> {
        let body = serde_json::to_value(ActualizarEstado { id, estado, mensaje })?;
        self.enviar(Method::PUT, "/api/presupuestos/actualizar-estado", Some(&body)).await
    }
}
