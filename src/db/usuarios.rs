use uuid::Uuid;

use super::DbPool;
use crate::models::user::{ActualizarPerfil, Rol, Usuario};

const COLUMNAS: &str = "id, nombre, apellidos, email, password_hash, telefono, direccion, \
                        ciudad, codigo_postal, provincia, rol, fecha_registro";

pub struct NuevoUsuario<'a> {
    pub nombre: &'a str,
    pub apellidos: Option<&'a str>,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub telefono: Option<&'a str>,
    pub rol: Rol,
}

pub async fn crear(pool: &DbPool, nuevo: NuevoUsuario<'_>) -> Result<Usuario, sqlx::Error> {
    let sql = format!(
        "INSERT INTO usuarios (id, nombre, apellidos, email, password_hash, telefono, rol) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(Uuid::new_v4())
        .bind(nuevo.nombre)
        .bind(nuevo.apellidos)
        .bind(nuevo.email.trim().to_lowercase())
        .bind(nuevo.password_hash)
        .bind(nuevo.telefono)
        .bind(nuevo.rol.to_string())
        .fetch_one(pool)
        .await
}

pub async fn por_email(pool: &DbPool, email: &str) -> Result<Option<Usuario>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNAS} FROM usuarios WHERE email = $1");
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
}

pub async fn por_id(pool: &DbPool, id: Uuid) -> Result<Option<Usuario>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNAS} FROM usuarios WHERE id = $1");
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

// COALESCE($n, campo): si no nos mandan el valor, se queda el que había
pub async fn actualizar_perfil(
    pool: &DbPool,
    id: Uuid,
    cambios: &ActualizarPerfil,
) -> Result<Option<Usuario>, sqlx::Error> {
    let sql = format!(
        "UPDATE usuarios SET \
            nombre = COALESCE($2, nombre), \
            apellidos = COALESCE($3, apellidos), \
            telefono = COALESCE($4, telefono), \
            direccion = COALESCE($5, direccion), \
            ciudad = COALESCE($6, ciudad), \
            codigo_postal = COALESCE($7, codigo_postal), \
            provincia = COALESCE($8, provincia) \
         WHERE id = $1 RETURNING {COLUMNAS}"
    );
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(id)
        .bind(cambios.nombre.as_deref())
        .bind(cambios.apellidos.as_deref())
        .bind(cambios.telefono.as_deref())
        .bind(cambios.direccion.as_deref())
        .bind(cambios.ciudad.as_deref())
        .bind(cambios.codigo_postal.as_deref())
        .bind(cambios.provincia.as_deref())
        .fetch_optional(pool)
        .await
}

pub async fn actualizar_password(pool: &DbPool, id: Uuid, hash: &str) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("UPDATE usuarios SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(hash)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn actualizar_rol(pool: &DbPool, email: &str, rol: Rol) -> Result<Option<Usuario>, sqlx::Error> {
    let sql = format!("UPDATE usuarios SET rol = $2 WHERE email = $1 RETURNING {COLUMNAS}");
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(email.trim().to_lowercase())
        .bind(rol.to_string())
        .fetch_optional(pool)
        .await
}
