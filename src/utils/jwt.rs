use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    error::ApiError,
    models::user::{Claims, Usuario},
    AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no se pudo firmar el token: {0}")]
    Firma(jsonwebtoken::errors::Error),
    #[error("Token inválido o expirado")]
    Invalido,
    #[error("duración de token fuera de rango: {0} h")]
    Duracion(i64),
}

/// Firma un token HS256 con `{id, email, rol}` y la expiración configurada.
pub fn crear_token(usuario: &Usuario, secret: &str, horas: i64) -> Result<String, TokenError> {
    let ahora = Utc::now();
    let expiracion = Duration::try_hours(horas)
        .and_then(|duracion| ahora.checked_add_signed(duracion))
        .ok_or(TokenError::Duracion(horas))?;

    let claims = Claims {
        sub: usuario.email.clone(),
        id: usuario.id,
        email: usuario.email.clone(),
        rol: usuario.rol,
        iat: ahora.timestamp() as usize,
        exp: expiracion.timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Firma)
}

pub fn verificar_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("Token rechazado: {}", e);
            TokenError::Invalido
        })
}

/// Claims del token si la petición trae uno válido; `None` en cualquier otro caso.
pub fn claims_opcionales(
    state: &AppState,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Option<Claims> {
    let TypedHeader(auth) = auth?;
    verificar_token(auth.token(), &state.settings.jwt_secret).ok()
}

// Se ejecuta antes de cualquier handler que necesite sesión
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(auth) = auth.ok_or_else(|| ApiError::unauthorized("No hay sesión activa"))?;
    let claims = verificar_token(auth.token(), &state.settings.jwt_secret)?;

    // Adjuntamos claims para que los handlers sepan quién es el usuario
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

pub async fn admin_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(auth) = auth.ok_or_else(|| ApiError::unauthorized("No hay sesión activa"))?;
    let claims = verificar_token(auth.token(), &state.settings.jwt_secret)?;

    if !claims.rol.es_admin() {
        tracing::warn!("Acceso de administración denegado a {}", claims.email);
        return Err(ApiError::forbidden("Se requieren permisos de administrador"));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Rol;
    use uuid::Uuid;

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: Uuid::new_v4(),
            nombre: "Lucía".into(),
            apellidos: None,
            email: "lucia@correo.es".into(),
            password_hash: String::new(),
            telefono: None,
            direccion: None,
            ciudad: None,
            codigo_postal: None,
            provincia: None,
            rol,
            fecha_registro: Utc::now(),
        }
    }

    #[test]
    fn token_lleva_id_email_y_rol() {
        let u = usuario(Rol::Admin);
        let token = crear_token(&u, "secreto", 24).unwrap();
        let claims = verificar_token(&token, "secreto").unwrap();
        assert_eq!(claims.id, u.id);
        assert_eq!(claims.email, u.email);
        assert_eq!(claims.rol, Rol::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn rechaza_otro_secreto() {
        let token = crear_token(&usuario(Rol::Client), "secreto", 24).unwrap();
        assert!(matches!(verificar_token(&token, "otro"), Err(TokenError::Invalido)));
    }

    #[test]
    fn duracion_desbordada_es_error_y_no_panico() {
        let err = crear_token(&usuario(Rol::Client), "secreto", 9_000_000_000_000).unwrap_err();
        assert!(matches!(err, TokenError::Duracion(9_000_000_000_000)));
        assert!(crear_token(&usuario(Rol::Client), "secreto", i64::MAX).is_err());
    }

    #[test]
    fn rechaza_token_expirado() {
        // más allá del margen de 60 s que aplica la validación
        let token = crear_token(&usuario(Rol::Client), "secreto", -1).unwrap();
        assert!(verificar_token(&token, "secreto").is_err());
    }
}
