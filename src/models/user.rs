use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Rol {
    Admin,
    Client,
    Usuario,
}

impl Rol {
    /// Página a la que se envía al usuario tras iniciar sesión.
    pub fn destino(self) -> &'static str {
        match self {
            Rol::Admin => "/dashboard",
            Rol::Client | Rol::Usuario => "/client-portal",
        }
    }

    pub fn es_admin(self) -> bool {
        self == Rol::Admin
    }
}

impl TryFrom<String> for Rol {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Fila de la tabla usuarios
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: Option<String>,
    pub email: String,
    #[serde(skip)] // ¡Jamás envíes el hash de la contraseña en el JSON!
    pub password_hash: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub codigo_postal: Option<String>,
    pub provincia: Option<String>,
    #[sqlx(try_from = "String")]
    pub rol: Rol,
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub nombre: String,
    pub apellidos: Option<String>,
    pub email: String,
    pub password: String,
    pub telefono: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub user: Usuario,
    pub redirect: String,
}

// Lo que viaja dentro del token firmado
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub id: Uuid,
    pub email: String,
    pub rol: Rol,
    pub iat: usize,
    pub exp: usize,
}

/// Campos de contacto editables desde el perfil. El email no se puede cambiar.
#[derive(Debug, Default, Deserialize)]
pub struct ActualizarPerfil {
    pub nombre: Option<String>,
    pub apellidos: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub codigo_postal: Option<String>,
    pub provincia: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CambiarPassword {
    pub actual: String,
    pub nueva: String,
}

#[derive(Debug, Deserialize)]
pub struct ActualizarRol {
    pub email: String,
    pub rol: Rol,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destino_por_rol() {
        assert_eq!(Rol::Admin.destino(), "/dashboard");
        assert_eq!(Rol::Client.destino(), "/client-portal");
        assert_eq!(Rol::Usuario.destino(), "/client-portal");
    }

    #[test]
    fn rol_se_lee_sin_distinguir_mayusculas() {
        assert_eq!(Rol::try_from("ADMIN".to_string()).unwrap(), Rol::Admin);
        assert_eq!("client".parse::<Rol>().unwrap(), Rol::Client);
        assert!("editor".parse::<Rol>().is_err());
        assert_eq!(Rol::Usuario.to_string(), "usuario");
    }
}
