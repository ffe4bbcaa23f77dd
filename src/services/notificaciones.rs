use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    presupuesto::{Autor, Presupuesto},
    proyecto::Proyecto,
};

pub const MAX_NOTIFICACIONES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoNotificacion {
    Presupuesto,
    Proyecto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notificacion {
    pub tipo: TipoNotificacion,
    pub referencia_id: Uuid,
    pub titulo: String,
    pub mensaje: String,
    pub fecha: DateTime<Utc>,
}

/// Mensajes del taller hacia el cliente, los más recientes primero.
pub fn derivar(presupuestos: &[Presupuesto], proyectos: &[Proyecto]) -> Vec<Notificacion> {
    let de_presupuestos = presupuestos.iter().flat_map(|p| {
        p.mensajes
            .iter()
            .filter(|m| m.autor == Autor::Admin)
            .map(move |m| Notificacion {
                tipo: TipoNotificacion::Presupuesto,
                referencia_id: p.id,
                titulo: format!("Presupuesto de {}", p.categoria),
                mensaje: m.mensaje.clone(),
                fecha: m.fecha,
            })
    });

    let de_proyectos = proyectos.iter().flat_map(|p| {
        p.comentarios
            .iter()
            .filter(|c| c.admin)
            .map(move |c| Notificacion {
                tipo: TipoNotificacion::Proyecto,
                referencia_id: p.id,
                titulo: p.titulo.clone(),
                mensaje: c.mensaje.clone(),
                fecha: c.fecha,
            })
    });

    let mut todas: Vec<Notificacion> = de_presupuestos.chain(de_proyectos).collect();
    todas.sort_by(|a, b| b.fecha.cmp(&a.fecha));
    todas.truncate(MAX_NOTIFICACIONES);
    todas
}
