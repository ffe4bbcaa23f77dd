use axum::{
    extract::State,
    response::IntoResponse,
    Extension,
};
use serde_json::json;

use crate::{
    db::usuarios,
    error::{ApiError, ApiResult},
    handlers::auth::usuario_actual,
    models::user::{ActualizarPerfil, CambiarPassword, Claims, Usuario},
    utils::{
        extract::Json,
        security::{hash_password, validar_password, verify_password},
    },
    AppState,
};

// GET /api/user/profile
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Usuario>> {
    Ok(Json(usuario_actual(&state, &claims).await?))
}

// POST /api/user/update-profile
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<ActualizarPerfil>,
) -> ApiResult<Json<Usuario>> {
    if body.nombre.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("El nombre no puede quedar vacío"));
    }

    let usuario = usuarios::actualizar_perfil(&state.pool, claims.id, &body)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;
    Ok(Json(usuario))
}

// POST /api/user/change-password
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CambiarPassword>,
) -> ApiResult<impl IntoResponse> {
    validar_password(&body.nueva)?;

    let usuario = usuario_actual(&state, &claims).await?;
    if !verify_password(&body.actual, &usuario.password_hash) {
        return Err(ApiError::unauthorized("La contraseña actual no es correcta"));
    }

    let hash = hash_password(&body.nueva)?;
    usuarios::actualizar_password(&state.pool, usuario.id, &hash).await?;
    tracing::info!("Contraseña actualizada para {}", usuario.email);

    Ok(Json(json!({ "message": "Contraseña actualizada" })))
}
