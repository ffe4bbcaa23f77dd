use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Estado de un proyecto. El planificador de producción usaba otra
/// nomenclatura (`no_iniciado`, `en_proceso`); se acepta solo como entrada.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoProyecto {
    #[serde(alias = "no_iniciado")]
    #[strum(to_string = "pendiente", serialize = "no_iniciado")]
    Pendiente,
    Aprobado,
    #[serde(alias = "en_proceso")]
    #[strum(to_string = "en_progreso", serialize = "en_proceso")]
    EnProgreso,
    Pausado,
    Completado,
    Rechazado,
}

impl EstadoProyecto {
    /// Un proyecto activo ocupa capacidad del taller.
    pub fn es_activo(self) -> bool {
        !matches!(self, EstadoProyecto::Completado | EstadoProyecto::Rechazado)
    }

    pub fn mensaje_automatico(self) -> &'static str {
        match self {
            EstadoProyecto::Pendiente => "Tu proyecto está pendiente de revisión.",
            EstadoProyecto::Aprobado => "¡Tu proyecto ha sido aprobado! Pronto empezaremos a trabajar en él.",
            EstadoProyecto::EnProgreso => "Tu proyecto está en producción en nuestro taller.",
            EstadoProyecto::Pausado => "Tu proyecto se ha pausado temporalmente. Te contactaremos en breve.",
            EstadoProyecto::Completado => "Tu proyecto está terminado y listo para la entrega.",
            EstadoProyecto::Rechazado => "Lamentablemente no podemos llevar a cabo este proyecto.",
        }
    }
}

impl TryFrom<String> for EstadoProyecto {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Prioridad {
    Baja,
    #[default]
    Media,
    Alta,
    Urgente,
}

impl TryFrom<String> for Prioridad {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comentario {
    pub mensaje: String,
    pub fecha: DateTime<Utc>,
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Proyecto {
    pub id: Uuid,
    pub usuario_id: Option<Uuid>,
    pub titulo: String,
    pub descripcion: String,
    pub tipo_proyecto: String,
    #[sqlx(json)]
    pub materiales_preferidos: Vec<String>,
    pub medidas: Option<String>,
    pub presupuesto_estimado: Option<f64>,
    pub fecha_solicitud: DateTime<Utc>,
    pub fecha_deseada: Option<NaiveDate>,
    pub fecha_entrega: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub prioridad: Prioridad,
    #[sqlx(try_from = "String")]
    pub estado: EstadoProyecto,
    #[sqlx(json)]
    pub comentarios: Vec<Comentario>,
    #[sqlx(json)]
    pub artesanos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitudProyecto {
    pub titulo: String,
    pub descripcion: String,
    pub tipo_proyecto: String,
    #[serde(default)]
    pub materiales_preferidos: Vec<String>,
    pub medidas: Option<String>,
    pub presupuesto_estimado: Option<f64>,
    pub fecha_deseada: Option<NaiveDate>,
    pub prioridad: Option<Prioridad>,
}

#[derive(Debug, Deserialize)]
pub struct FiltroProyectos {
    pub estado: Option<EstadoProyecto>,
    pub prioridad: Option<Prioridad>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NuevoComentario {
    pub proyecto_id: Uuid,
    pub mensaje: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ActualizarProyecto {
    pub id: Uuid,
    pub estado: Option<EstadoProyecto>,
    #[serde(default)]
    pub notificar_cliente: bool,
    pub mensaje: Option<String>,
    pub artesanos: Option<Vec<String>>,
    pub fecha_entrega: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulario_del_planificador_se_unifica() {
        let e: EstadoProyecto = serde_json::from_str("\"no_iniciado\"").unwrap();
        assert_eq!(e, EstadoProyecto::Pendiente);
        let e: EstadoProyecto = serde_json::from_str("\"en_proceso\"").unwrap();
        assert_eq!(e, EstadoProyecto::EnProgreso);
        assert_eq!("en_proceso".parse::<EstadoProyecto>().unwrap(), EstadoProyecto::EnProgreso);
        assert_eq!(EstadoProyecto::EnProgreso.to_string(), "en_progreso");
        assert_eq!(serde_json::to_string(&EstadoProyecto::Pendiente).unwrap(), "\"pendiente\"");
    }

    #[test]
    fn estados_activos() {
        assert!(EstadoProyecto::Pausado.es_activo());
        assert!(EstadoProyecto::Aprobado.es_activo());
        assert!(!EstadoProyecto::Completado.es_activo());
        assert!(!EstadoProyecto::Rechazado.es_activo());
    }

    #[test]
    fn prioridad_por_defecto_media() {
        assert_eq!(Prioridad::default(), Prioridad::Media);
        assert_eq!(Prioridad::try_from("urgente".to_string()).unwrap(), Prioridad::Urgente);
    }
}
