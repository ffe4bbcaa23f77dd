use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::ApiError;

pub const LONGITUD_MINIMA_PASSWORD: usize = 8;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Error al encriptar contraseña: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn validar_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < LONGITUD_MINIMA_PASSWORD {
        return Err(ApiError::bad_request(format!(
            "La contraseña debe tener al menos {LONGITUD_MINIMA_PASSWORD} caracteres"
        )));
    }
    Ok(())
}
