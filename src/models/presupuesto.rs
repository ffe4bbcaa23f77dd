use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

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
pub enum EstadoPresupuesto {
    Pendiente,
    EnProceso,
    // "aprobado" es la grafía antigua que aún mandan algunos formularios
    #[serde(alias = "aprobado")]
    #[strum(to_string = "aceptado", serialize = "aprobado")]
    Aceptado,
    Rechazado,
    Completado,
}

impl TryFrom<String> for EstadoPresupuesto {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl EstadoPresupuesto {
    /// Progreso y etapa que se asignan al pasar a este estado, junto con el
    /// mensaje automático que recibe el cliente.
    pub fn progreso_derivado(self) -> (u8, &'static str, &'static str) {
        match self {
            EstadoPresupuesto::Pendiente => (
                0,
                "Revisión",
                "Tu presupuesto ha vuelto a revisión. Te avisaremos en cuanto haya novedades.",
            ),
            EstadoPresupuesto::Aceptado => (
                10,
                "Diseño",
                "¡Tu presupuesto ha sido aceptado! Empezamos con el diseño de tu mueble.",
            ),
            EstadoPresupuesto::EnProceso => (
                50,
                "Fabricación",
                "Tu mueble ya está en el taller. Nuestros artesanos están trabajando en él.",
            ),
            EstadoPresupuesto::Rechazado => (
                0,
                "Cancelado",
                "Lo sentimos, no podemos realizar este presupuesto. Contacta con nosotros para buscar alternativas.",
            ),
            EstadoPresupuesto::Completado => (
                100,
                "Entregado",
                "Tu mueble está terminado. ¡Gracias por confiar en nuestro taller!",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensiones {
    pub ancho: f64,
    pub alto: f64,
    pub profundidad: f64,
}

impl Dimensiones {
    /// Volumen en metros cúbicos a partir de medidas en centímetros.
    pub fn volumen_m3(&self) -> f64 {
        self.ancho * self.alto * self.profundidad / 1_000_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Importe {
    pub subtotal: f64,
    pub descuento: f64,
    pub total: f64,
    pub tiempo_estimado: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Autor {
    Admin,
    Cliente,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mensaje {
    pub autor: Autor,
    pub mensaje: String,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progreso {
    pub porcentaje: u8,
    pub etapa_actual: String,
    pub fecha_estimada: Option<NaiveDate>,
}

impl Default for Progreso {
    fn default() -> Self {
        Progreso {
            porcentaje: 0,
            etapa_actual: "Revisión".to_string(),
            fecha_estimada: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Presupuesto {
    pub id: Uuid,
    pub usuario_id: Option<Uuid>,
    pub nombre: String,
    pub categoria: String,
    pub material: String,
    pub acabado: String,
    #[sqlx(json)]
    pub dimensiones: Dimensiones,
    pub unidades: i32,
    pub comentarios: Option<String>,
    #[sqlx(json)]
    pub imagenes: Vec<String>,
    #[sqlx(json)]
    pub presupuesto: Importe,
    #[sqlx(try_from = "String")]
    pub estado: EstadoPresupuesto,
    pub fecha_creacion: DateTime<Utc>,
    #[sqlx(json)]
    pub mensajes: Vec<Mensaje>,
    #[sqlx(json)]
    pub progreso: Progreso,
}

impl Presupuesto {
    /// Aplica localmente un cambio de estado: estado, progreso derivado y mensaje automático.
    pub fn aplicar_estado(&mut self, estado: EstadoPresupuesto, mensaje: Option<String>) {
        let (porcentaje, etapa, automatico) = estado.progreso_derivado();
        self.estado = estado;
        self.progreso.porcentaje = porcentaje;
        self.progreso.etapa_actual = etapa.to_string();
        self.mensajes.push(Mensaje {
            autor: Autor::Admin,
            mensaje: mensaje.unwrap_or_else(|| automatico.to_string()),
            fecha: Utc::now(),
        });
    }
}

/// Datos del formulario de presupuesto (campo `datos` del multipart).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormularioPresupuesto {
    pub nombre: String,
    pub categoria: String,
    pub material: String,
    pub acabado: String,
    pub dimensiones: Dimensiones,
    pub unidades: u32,
    pub comentarios: Option<String>,
    /// Total que mostró el formulario; solo orientativo.
    pub total_cliente: Option<f64>,
}

pub const LIMITE_POR_DEFECTO: i64 = 50;
pub const LIMITE_MAXIMO: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct FiltroListado {
    pub estado: Option<EstadoPresupuesto>,
    pub limite: Option<i64>,
}

impl FiltroListado {
    /// Límite pedido acotado a `1..=LIMITE_MAXIMO`.
    pub fn limite_efectivo(&self) -> i64 {
        self.limite.unwrap_or(LIMITE_POR_DEFECTO).clamp(1, LIMITE_MAXIMO)
    }
}

#[derive(Debug, Deserialize)]
pub struct DetalleQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NuevoMensaje {
    pub presupuesto_id: Uuid,
    pub mensaje: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActualizarProgreso {
    pub presupuesto_id: Uuid,
    pub porcentaje: u8,
    pub etapa_actual: String,
    pub fecha_estimada: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActualizarEstado {
    pub id: Uuid,
    pub estado: EstadoPresupuesto,
    pub mensaje: Option<String>,
}
