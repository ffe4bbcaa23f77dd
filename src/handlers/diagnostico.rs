use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::State,
    response::IntoResponse,
    Extension,
};
use serde_json::json;

use crate::{
    db::{esquema, presupuestos, usuarios},
    error::{ApiError, ApiResult},
    handlers::auth::emitir_token,
    models::user::{Claims, Rol},
    utils::extract::Json,
    AppState,
};

// GET /api/diagnostico/presupuestos (admin)
pub async fn presupuestos_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tabla_existe = esquema::tabla_existe(&state.pool, "presupuestos").await?;
    let funcion_rpc_existe = esquema::funcion_existe(&state.pool, esquema::NOMBRE_FUNCION_RPC).await?;

    let por_estado: BTreeMap<String, i64> = if tabla_existe {
        presupuestos::contar_por_estado(&state.pool).await?.into_iter().collect()
    } else {
        BTreeMap::new()
    };
    let total: i64 = por_estado.values().sum();

    Ok(Json(json!({
        "tabla_existe": tabla_existe,
        "funcion_rpc_existe": funcion_rpc_existe,
        "total": total,
        "por_estado": por_estado,
    })))
}

// POST /api/diagnostico/resolver-admin
// Solo para cuentas listadas en ADMIN_EMAILS: corrige el rol guardado y
// entrega un token nuevo con ese rol.
pub async fn resolver_admin_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    if !state.settings.es_admin_bootstrap(&claims.email) {
        tracing::warn!("{} intentó resolver su rol de administrador", claims.email);
        return Err(ApiError::forbidden("Esta cuenta no está autorizada como administradora"));
    }

    let antes = usuarios::por_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;
    let usuario = usuarios::actualizar_rol(&state.pool, &antes.email, Rol::Admin)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;
    let token = emitir_token(&state, &usuario)?;

    tracing::info!("Rol de {} corregido: {} -> {}", usuario.email, antes.rol, usuario.rol);
    Ok(Json(json!({
        "rol_anterior": antes.rol,
        "rol_token_anterior": claims.rol,
        "user": usuario,
        "token": token,
    })))
}

// POST /api/diagnostico/crear-funcion-rpc (admin)
pub async fn crear_funcion_rpc_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    esquema::crear_funcion_rpc(&state.pool).await?;
    tracing::info!("Función {} creada por {}", esquema::NOMBRE_FUNCION_RPC, claims.email);
    Ok(Json(json!({
        "message": format!("Función {} disponible", esquema::NOMBRE_FUNCION_RPC)
    })))
}

/// `true`/`false` si se pudo comprobar la tabla; si no, el error.
fn entrada_tabla(tabla: &str, resultado: Result<bool, sqlx::Error>) -> serde_json::Value {
    match resultado {
        Ok(existe) => json!(existe),
        Err(e) => {
            tracing::error!("No se pudo comprobar la tabla {}: {}", tabla, e);
            json!({ "error": e.to_string() })
        }
    }
}

// GET /api/debug/supabase (admin): conectividad con la base de datos
pub async fn estado_backend_handler(State(state): State<AppState>) -> impl IntoResponse {
    let inicio = Instant::now();
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool).await;
    let latencia_ms = inicio.elapsed().as_millis() as u64;

    match ping {
        Ok(_) => {
            let mut tablas = BTreeMap::new();
            for tabla in ["usuarios", "presupuestos", "proyectos"] {
                let existe = esquema::tabla_existe(&state.pool, tabla).await;
                tablas.insert(tabla, entrada_tabla(tabla, existe));
            }
            Json(json!({
                "conectado": true,
                "latencia_ms": latencia_ms,
                "tablas": tablas,
            }))
        }
        Err(e) => {
            tracing::error!("Base de datos no disponible: {:?}", e);
            Json(json!({
                "conectado": false,
                "latencia_ms": latencia_ms,
                "error": e.to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabla_no_comprobada_muestra_el_error() {
        assert_eq!(entrada_tabla("usuarios", Ok(true)), json!(true));
        assert_eq!(entrada_tabla("usuarios", Ok(false)), json!(false));

        let entrada = entrada_tabla("presupuestos", Err(sqlx::Error::PoolTimedOut));
        assert_eq!(entrada["error"], sqlx::Error::PoolTimedOut.to_string());
    }
}
