use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use serde_json::json;

use crate::{
    db::{self, usuarios},
    error::{ApiError, ApiResult},
    models::user::{ActualizarRol, AuthResponse, Claims, LoginPayload, RegisterPayload, Rol, Usuario},
    utils::{
        extract::Json,
        jwt::crear_token,
        security::{hash_password, validar_password, verify_password},
    },
    AppState,
};

pub(crate) fn emitir_token(state: &AppState, usuario: &Usuario) -> ApiResult<String> {
    Ok(crear_token(
        usuario,
        &state.settings.jwt_secret,
        state.settings.jwt_expiration_hours,
    )?)
}

fn respuesta_sesion(state: &AppState, usuario: Usuario) -> ApiResult<AuthResponse> {
    let token = emitir_token(state, &usuario)?;
    Ok(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        redirect: usuario.rol.destino().to_string(),
        user: usuario,
    })
}

/// Usuario al que pertenece el token. Un token de un usuario borrado no vale.
pub(crate) async fn usuario_actual(state: &AppState, claims: &Claims) -> ApiResult<Usuario> {
    usuarios::por_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("El usuario de la sesión ya no existe"))
}

// POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<impl IntoResponse> {
    // 1. Validar nombre, email y contraseña
    let email = payload.email.trim().to_lowercase();
    if payload.nombre.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("Nombre y email válidos son obligatorios"));
    }
    validar_password(&payload.password)?;

    // 2. Decidir el rol: los emails de ADMIN_EMAILS entran como administradores
    let rol = if state.settings.es_admin_bootstrap(&email) { Rol::Admin } else { Rol::Client };

    // 3. Hashear la contraseña (nunca guardarla plana)
    let password_hash = hash_password(&payload.password)?;

    // 4. Insertar en Base de Datos
    let usuario = usuarios::crear(
        &state.pool,
        usuarios::NuevoUsuario {
            nombre: payload.nombre.trim(),
            apellidos: payload.apellidos.as_deref(),
            email: &email,
            password_hash: &password_hash,
            telefono: payload.telefono.as_deref(),
            rol,
        },
    )
    .await
    .map_err(|e| {
        if db::es_duplicado(&e) {
            ApiError::Conflict("El email ya está registrado".into())
        } else {
            ApiError::Database(e)
        }
    })?;

    // 5. Responder con la sesión ya iniciada
    tracing::info!("Usuario registrado: {} ({})", usuario.email, usuario.rol);
    Ok((StatusCode::CREATED, Json(respuesta_sesion(&state, usuario)?)))
}

// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<AuthResponse>> {
    let credenciales_invalidas = || ApiError::unauthorized("Credenciales inválidas");

    let usuario = usuarios::por_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(credenciales_invalidas)?;

    if !verify_password(&payload.password, &usuario.password_hash) {
        tracing::warn!("Contraseña incorrecta para {}", usuario.email);
        return Err(credenciales_invalidas());
    }

    Ok(Json(respuesta_sesion(&state, usuario)?))
}

// GET /api/auth/validate
pub async fn validate_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let usuario = usuario_actual(&state, &claims).await?;
    Ok(Json(json!({ "valid": true, "user": usuario })))
}

// POST /api/auth/update-rol (admin)
pub async fn update_rol_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<ActualizarRol>,
) -> ApiResult<Json<Usuario>> {
    let usuario = usuarios::actualizar_rol(&state.pool, &body.email, body.rol)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuario no encontrado"))?;

    tracing::info!("{} cambió el rol de {} a {}", claims.email, usuario.email, usuario.rol);
    Ok(Json(usuario))
}

// POST /api/auth/refresh-token
// El token nuevo lleva el rol que hay guardado, no el del token anterior.
pub async fn refresh_token_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<AuthResponse>> {
    let usuario = usuario_actual(&state, &claims).await?;
    if usuario.rol != claims.rol {
        tracing::info!(
            "Token de {} renovado: rol {} -> {}",
            usuario.email,
            claims.rol,
            usuario.rol
        );
    }
    Ok(Json(respuesta_sesion(&state, usuario)?))
}

// GET /api/debug/usuario
pub async fn debug_usuario_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let usuario = usuarios::por_id(&state.pool, claims.id).await?;
    let db_rol = usuario.as_ref().map(|u| u.rol);

    Ok(Json(json!({
        "token_rol": claims.rol,
        "db_rol": db_rol,
        "coinciden": db_rol == Some(claims.rol),
        "usuario": usuario,
    })))
}
