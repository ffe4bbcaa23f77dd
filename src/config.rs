use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} no está definido")]
    Falta(&'static str),
    #[error("{0} no puede estar vacío")]
    Vacio(&'static str),
    #[error("valor inválido para {clave}: {valor}")]
    Invalido { clave: &'static str, valor: String },
}

/// Vida máxima de un token: un año.
pub const MAX_HORAS_TOKEN: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub upload_dir: PathBuf,
    pub max_image_bytes: usize,
    pub max_imagenes: usize,
    pub admin_emails: Vec<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub auto_migrate: bool,
}

impl Settings {
    /// Lee `.env` (si existe) y luego el entorno del proceso.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|clave| env::var(clave).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Falta("DATABASE_URL"))?;

        // Sin secreto por defecto: arrancar sin JWT_SECRET es un error.
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Falta("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Vacio("JWT_SECRET"));
        }

        let admin_emails = lookup("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Settings {
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url,
            jwt_secret,
            jwt_expiration_hours: parse_en_rango(
                &lookup,
                "JWT_EXPIRATION_HOURS",
                24,
                1..=MAX_HORAS_TOKEN,
            )?,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", 5 * 1024 * 1024)?,
            max_imagenes: parse_or(&lookup, "MAX_IMAGENES", 5)?,
            admin_emails,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            auto_migrate: lookup("AUTO_MIGRATE")
                .map(|s| matches!(s.as_str(), "1" | "true" | "True" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn es_admin_bootstrap(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn parse_or<F, T>(lookup: &F, clave: &'static str, defecto: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(clave) {
        None => Ok(defecto),
        Some(valor) => valor
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalido { clave, valor }),
    }
}

fn parse_en_rango<F>(
    lookup: &F,
    clave: &'static str,
    defecto: i64,
    rango: std::ops::RangeInclusive<i64>,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let valor = parse_or(lookup, clave, defecto)?;
    if rango.contains(&valor) {
        Ok(valor)
    } else {
        Err(ConfigError::Invalido { clave, valor: valor.to_string() })
    }
}
