//! Datos de demostración y resultado etiquetado de los listados.
//!
//! Un listado es `real` cuando viene de la base de datos y `demo` cuando se
//! sustituyó por datos de ejemplo, con el motivo explícito.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    presupuesto::{
        Autor, Dimensiones, EstadoPresupuesto, FiltroListado, Importe, Mensaje, Presupuesto, Progreso,
    },
    proyecto::{Comentario, EstadoProyecto, Prioridad, Proyecto},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivoDemo {
    TablaInexistente,
    BackendNoDisponible,
}

/// Origen de los datos de un listado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origen", rename_all = "snake_case")]
pub enum Origen {
    Real,
    Demo { motivo: MotivoDemo },
}

impl Origen {
    pub fn es_demo(&self) -> bool {
        matches!(self, Origen::Demo { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listado<T> {
    #[serde(flatten)]
    pub origen: Origen,
    pub items: Vec<T>,
}

impl<T> Listado<T> {
    pub fn real(items: Vec<T>) -> Self {
        Listado { origen: Origen::Real, items }
    }

    pub fn demo(motivo: MotivoDemo, items: Vec<T>) -> Self {
        Listado { origen: Origen::Demo { motivo }, items }
    }
}

/// Decide si un error de base de datos admite datos de demostración.
/// Cualquier otro error se propaga.
pub fn motivo_para(error: &sqlx::Error) -> Option<MotivoDemo> {
    match error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(crate::db::SQLSTATE_TABLA_INEXISTENTE) => {
            Some(MotivoDemo::TablaInexistente)
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            Some(MotivoDemo::BackendNoDisponible)
        }
        _ => None,
    }
}

// Identificadores fijos para que el panel pueda operar sobre ellos en modo demo
fn id_demo(n: u128) -> Uuid {
    Uuid::from_u128(0x00000000_0000_4000_8000_000000000000 | n)
}

pub fn presupuestos_demo() -> Vec<Presupuesto> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().unwrap_or_else(Utc::now);

    let mut lista = vec![
        Presupuesto {
            id: id_demo(1),
            usuario_id: None,
            nombre: "María García".into(),
            categoria: "mesa".into(),
            material: "roble".into(),
            acabado: "barnizado".into(),
            dimensiones: Dimensiones { ancho: 180.0, alto: 75.0, profundidad: 90.0 },
            unidades: 1,
            comentarios: Some("Mesa de comedor para seis personas".into()),
            imagenes: vec![],
            presupuesto: Importe {
                subtotal: 3182.85,
                descuento: 159.14,
                total: 3023.71,
                tiempo_estimado: "2-3 semanas".into(),
            },
            estado: EstadoPresupuesto::Pendiente,
            fecha_creacion: base,
            mensajes: vec![],
            progreso: Progreso::default(),
        },
        Presupuesto {
            id: id_demo(2),
            usuario_id: None,
            nombre: "Javier Ruiz".into(),
            categoria: "armario".into(),
            material: "nogal".into(),
            acabado: "lacado".into(),
            dimensiones: Dimensiones { ancho: 200.0, alto: 220.0, profundidad: 60.0 },
            unidades: 1,
            comentarios: Some("Armario empotrado de dos puertas".into()),
            imagenes: vec![],
            presupuesto: Importe {
                subtotal: 9771.84,
                descuento: 0.0,
                total: 9771.84,
                tiempo_estimado: "3-4 semanas".into(),
            },
            estado: EstadoPresupuesto::EnProceso,
            fecha_creacion: base + Duration::days(3),
            mensajes: vec![Mensaje {
                autor: Autor::Admin,
                mensaje: "Tu mueble ya está en el taller.".into(),
                fecha: base + Duration::days(5),
            }],
            progreso: Progreso {
                porcentaje: 50,
                etapa_actual: "Fabricación".into(),
                fecha_estimada: NaiveDate::from_ymd_opt(2024, 4, 10),
            },
        },
        Presupuesto {
            id: id_demo(3),
            usuario_id: None,
            nombre: "Carmen Torres".into(),
            categoria: "silla".into(),
            material: "haya".into(),
            acabado: "natural".into(),
            dimensiones: Dimensiones { ancho: 45.0, alto: 90.0, profundidad: 50.0 },
            unidades: 6,
            comentarios: None,
            imagenes: vec![],
            presupuesto: Importe {
                subtotal: 3006.41,
                descuento: 150.32,
                total: 2856.09,
                tiempo_estimado: "4-6 semanas".into(),
            },
            estado: EstadoPresupuesto::Aceptado,
            fecha_creacion: base + Duration::days(7),
            mensajes: vec![],
            progreso: Progreso {
                porcentaje: 10,
                etapa_actual: "Diseño".into(),
                fecha_estimada: None,
            },
        },
        Presupuesto {
            id: id_demo(4),
            usuario_id: None,
            nombre: "Pablo Navarro".into(),
            categoria: "estanteria".into(),
            material: "pino".into(),
            acabado: "pintado".into(),
            dimensiones: Dimensiones { ancho: 120.0, alto: 200.0, profundidad: 35.0 },
            unidades: 1,
            comentarios: Some("Color blanco roto".into()),
            imagenes: vec![],
            presupuesto: Importe {
                subtotal: 1533.6,
                descuento: 0.0,
                total: 1533.6,
                tiempo_estimado: "3-4 semanas".into(),
            },
            estado: EstadoPresupuesto::Completado,
            fecha_creacion: base + Duration::days(10),
            mensajes: vec![],
            progreso: Progreso {
                porcentaje: 100,
                etapa_actual: "Entregado".into(),
                fecha_estimada: None,
            },
        },
    ];
    lista.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
    lista
}

/// Presupuestos de demostración con el mismo filtro y límite que el listado real.
pub fn presupuestos_filtrados(filtro: &FiltroListado) -> Vec<Presupuesto> {
    let limite = usize::try_from(filtro.limite_efectivo()).unwrap_or(1);
    presupuestos_demo()
        .into_iter()
        .filter(|p| filtro.estado.map_or(true, |estado| p.estado == estado))
        .take(limite)
        .collect()
}

pub fn proyectos_demo() -> Vec<Proyecto> {
    let base = Utc.with_ymd_and_hms(2024, 2, 15, 9, 0, 0).single().unwrap_or_else(Utc::now);

    let proyecto = |n: u128,
                    titulo: &str,
                    tipo: &str,
                    estado: EstadoProyecto,
                    prioridad: Prioridad,
                    artesanos: &[&str]| Proyecto {
        id: id_demo(100 + n),
        usuario_id: None,
        titulo: titulo.into(),
        descripcion: format!("Proyecto de ejemplo: {titulo}"),
        tipo_proyecto: tipo.into(),
        materiales_preferidos: vec!["roble".into()],
        medidas: None,
        presupuesto_estimado: Some(1500.0 * n as f64),
        fecha_solicitud: base + Duration::days(n as i64 * 2),
        fecha_deseada: NaiveDate::from_ymd_opt(2024, 5, 1),
        fecha_entrega: None,
        prioridad,
        estado,
        comentarios: vec![Comentario {
            mensaje: "Solicitud recibida".into(),
            fecha: base + Duration::days(n as i64 * 2),
            admin: true,
        }],
        artesanos: artesanos.iter().map(|a| a.to_string()).collect(),
    };

    vec![
        proyecto(1, "Cocina completa en roble", "cocina", EstadoProyecto::EnProgreso, Prioridad::Alta, &["Carlos Martínez", "Ana López"]),
        proyecto(2, "Biblioteca a medida", "salon", EstadoProyecto::Aprobado, Prioridad::Media, &["Miguel Fernández"]),
        proyecto(3, "Dormitorio infantil", "dormitorio", EstadoProyecto::Pendiente, Prioridad::Baja, &[]),
        proyecto(4, "Mostrador para tienda", "comercial", EstadoProyecto::Pausado, Prioridad::Urgente, &["Carlos Martínez"]),
        proyecto(5, "Mesa de reuniones", "oficina", EstadoProyecto::Completado, Prioridad::Media, &["Laura Sánchez"]),
    ]
}
