use chrono::NaiveDate;
use sqlx::types::Json;
use uuid::Uuid;

use super::DbPool;
use crate::models::proyecto::{
    Comentario, EstadoProyecto, Prioridad, Proyecto, SolicitudProyecto,
};

const COLUMNAS: &str = "id, usuario_id, titulo, descripcion, tipo_proyecto, materiales_preferidos, \
                        medidas, presupuesto_estimado, fecha_solicitud, fecha_deseada, fecha_entrega, \
                        prioridad, estado, comentarios, artesanos";

pub async fn crear(
    pool: &DbPool,
    usuario_id: Uuid,
    solicitud: &SolicitudProyecto,
) -> Result<Proyecto, sqlx::Error> {
    let sql = format!(
        "INSERT INTO proyectos \
            (id, usuario_id, titulo, descripcion, tipo_proyecto, materiales_preferidos, medidas, \
             presupuesto_estimado, fecha_deseada, prioridad, estado) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(Uuid::new_v4())
        .bind(usuario_id)
        .bind(solicitud.titulo.trim())
        .bind(solicitud.descripcion.trim())
        .bind(solicitud.tipo_proyecto.trim())
        .bind(Json(&solicitud.materiales_preferidos))
        .bind(solicitud.medidas.as_deref())
        .bind(solicitud.presupuesto_estimado)
        .bind(solicitud.fecha_deseada)
        .bind(solicitud.prioridad.unwrap_or_default().to_string())
        .bind(EstadoProyecto::Pendiente.to_string())
        .fetch_one(pool)
        .await
}

pub async fn por_usuario(
    pool: &DbPool,
    usuario_id: Uuid,
    estado: Option<EstadoProyecto>,
) -> Result<Vec<Proyecto>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNAS} FROM proyectos \
         WHERE usuario_id = $1 AND ($2::text IS NULL OR estado = $2) \
         ORDER BY fecha_solicitud DESC"
    );
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(usuario_id)
        .bind(estado.map(|e| e.to_string()))
        .fetch_all(pool)
        .await
}

pub async fn por_id(pool: &DbPool, id: Uuid) -> Result<Option<Proyecto>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNAS} FROM proyectos WHERE id = $1");
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn listar(
    pool: &DbPool,
    estado: Option<EstadoProyecto>,
    prioridad: Option<Prioridad>,
) -> Result<Vec<Proyecto>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNAS} FROM proyectos \
         WHERE ($1::text IS NULL OR estado = $1) AND ($2::text IS NULL OR prioridad = $2) \
         ORDER BY fecha_solicitud DESC"
    );
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(estado.map(|e| e.to_string()))
        .bind(prioridad.map(|p| p.to_string()))
        .fetch_all(pool)
        .await
}

pub async fn agregar_comentario(
    pool: &DbPool,
    id: Uuid,
    comentario: &Comentario,
) -> Result<Option<Proyecto>, sqlx::Error> {
    let sql = format!(
        "UPDATE proyectos SET comentarios = comentarios || $2::jsonb WHERE id = $1 RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(id)
        .bind(Json([comentario]))
        .fetch_optional(pool)
        .await
}

#[derive(Default)]
pub struct CambiosProyecto<'a> {
    pub estado: Option<EstadoProyecto>,
    pub artesanos: Option<&'a [String]>,
    pub fecha_entrega: Option<NaiveDate>,
    pub comentario: Option<Comentario>,
}

pub async fn actualizar(
    pool: &DbPool,
    id: Uuid,
    cambios: CambiosProyecto<'_>,
) -> Result<Option<Proyecto>, sqlx::Error> {
    let sql = format!(
        "UPDATE proyectos SET \
            estado = COALESCE($2, estado), \
            artesanos = COALESCE($3, artesanos), \
            fecha_entrega = COALESCE($4, fecha_entrega), \
            comentarios = CASE WHEN $5::jsonb IS NULL THEN comentarios ELSE comentarios || $5::jsonb END \
         WHERE id = $1 RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Proyecto>(&sql)
        .bind(id)
        .bind(cambios.estado.map(|e| e.to_string()))
        .bind(cambios.artesanos.map(Json))
        .bind(cambios.fecha_entrega)
        .bind(cambios.comentario.map(|c| Json([c])))
        .fetch_optional(pool)
        .await
}
