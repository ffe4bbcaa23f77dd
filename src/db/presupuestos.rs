use sqlx::types::Json;
use uuid::Uuid;

use super::DbPool;
use crate::models::presupuesto::{
    Dimensiones, EstadoPresupuesto, Importe, Mensaje, Presupuesto, Progreso,
};

const COLUMNAS: &str = "id, usuario_id, nombre, categoria, material, acabado, dimensiones, \
                        unidades, comentarios, imagenes, presupuesto, estado, fecha_creacion, \
                        mensajes, progreso";

pub struct NuevoPresupuesto<'a> {
    pub usuario_id: Uuid,
    pub nombre: &'a str,
    pub categoria: &'a str,
    pub material: &'a str,
    pub acabado: &'a str,
    pub dimensiones: Dimensiones,
    pub unidades: i32,
    pub comentarios: Option<&'a str>,
    pub imagenes: &'a [String],
    pub importe: &'a Importe,
}

pub async fn crear(pool: &DbPool, nuevo: NuevoPresupuesto<'_>) -> Result<Presupuesto, sqlx::Error> {
    let sql = format!(
        "INSERT INTO presupuestos \
            (id, usuario_id, nombre, categoria, material, acabado, dimensiones, unidades, \
             comentarios, imagenes, presupuesto, estado, mensajes, progreso) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, '[]'::jsonb, $13) \
         RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(Uuid::new_v4())
        .bind(nuevo.usuario_id)
        .bind(nuevo.nombre)
        .bind(nuevo.categoria.trim().to_lowercase())
        .bind(nuevo.material.trim().to_lowercase())
        .bind(nuevo.acabado.trim().to_lowercase())
        .bind(Json(nuevo.dimensiones))
        .bind(nuevo.unidades)
        .bind(nuevo.comentarios)
        .bind(Json(nuevo.imagenes))
        .bind(Json(nuevo.importe))
        .bind(EstadoPresupuesto::Pendiente.to_string())
        .bind(Json(Progreso::default()))
        .fetch_one(pool)
        .await
}

pub async fn por_usuario(pool: &DbPool, usuario_id: Uuid) -> Result<Vec<Presupuesto>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNAS} FROM presupuestos WHERE usuario_id = $1 ORDER BY fecha_creacion DESC"
    );
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(usuario_id)
        .fetch_all(pool)
        .await
}

pub async fn por_id(pool: &DbPool, id: Uuid) -> Result<Option<Presupuesto>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNAS} FROM presupuestos WHERE id = $1");
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

// ($1::text IS NULL OR estado = $1): si no envían estado, ignora el filtro
pub async fn listar(
    pool: &DbPool,
    estado: Option<EstadoPresupuesto>,
    limite: i64,
) -> Result<Vec<Presupuesto>, sqlx::Error> {
    let sql = format!(
        "SELECT {COLUMNAS} FROM presupuestos \
         WHERE ($1::text IS NULL OR estado = $1) \
         ORDER BY fecha_creacion DESC LIMIT $2"
    );
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(estado.map(|e| e.to_string()))
        .bind(limite)
        .fetch_all(pool)
        .await
}

/// Añade un mensaje al final del hilo en una sola sentencia.
pub async fn agregar_mensaje(
    pool: &DbPool,
    id: Uuid,
    mensaje: &Mensaje,
) -> Result<Option<Presupuesto>, sqlx::Error> {
    let sql = format!(
        "UPDATE presupuestos SET mensajes = mensajes || $2::jsonb WHERE id = $1 RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(id)
        .bind(Json([mensaje]))
        .fetch_optional(pool)
        .await
}

pub async fn actualizar_progreso(
    pool: &DbPool,
    id: Uuid,
    progreso: &Progreso,
) -> Result<Option<Presupuesto>, sqlx::Error> {
    let sql = format!("UPDATE presupuestos SET progreso = $2 WHERE id = $1 RETURNING {COLUMNAS}");
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(id)
        .bind(Json(progreso))
        .fetch_optional(pool)
        .await
}

/// Cambia el estado, ajusta porcentaje y etapa (conservando la fecha
/// estimada) y deja constancia en el hilo de mensajes.
pub async fn actualizar_estado(
    pool: &DbPool,
    id: Uuid,
    estado: EstadoPresupuesto,
    mensaje: &Mensaje,
) -> Result<Option<Presupuesto>, sqlx::Error> {
    let (porcentaje, etapa, _) = estado.progreso_derivado();
    let sql = format!(
        "UPDATE presupuestos SET \
            estado = $2, \
            progreso = progreso || jsonb_build_object('porcentaje', $3::int, 'etapa_actual', $4::text), \
            mensajes = mensajes || $5::jsonb \
         WHERE id = $1 RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Presupuesto>(&sql)
        .bind(id)
        .bind(estado.to_string())
        .bind(i32::from(porcentaje))
        .bind(etapa)
        .bind(Json([mensaje]))
        .fetch_optional(pool)
        .await
}

pub async fn contar_por_estado(pool: &DbPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT estado, COUNT(*) FROM presupuestos GROUP BY estado ORDER BY estado",
    )
    .fetch_all(pool)
    .await
}
