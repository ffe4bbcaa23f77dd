use std::path::Path;

use axum::extract::multipart::Field;
use mime::Mime;
use tokio::fs; // Usamos el sistema de archivos asíncrono
use uuid::Uuid;

use crate::{config::Settings, error::ApiError};

fn es_imagen_permitida(ct: &Mime) -> bool {
    matches!(
        (ct.type_().as_str(), ct.subtype().as_str()),
        ("image", "jpeg") | ("image", "png") | ("image", "webp") | ("image", "gif")
    )
}

/// Guarda una imagen adjunta al presupuesto y devuelve su URL pública
/// (`/uploads/<uuid>.<ext>`).
pub async fn guardar_imagen(settings: &Settings, field: Field<'_>) -> Result<String, ApiError> {
    let file_name = field.file_name().unwrap_or("imagen.jpg").to_string();
    let content_type: Option<Mime> = field.content_type().and_then(|ct| ct.parse().ok());

    if let Some(ct) = &content_type {
        if !es_imagen_permitida(ct) {
            return Err(ApiError::bad_request(
                "Solo se permiten imágenes (jpg, png, webp, gif)",
            ));
        }
    }

    let extension = Path::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp" | "gif"))
        .unwrap_or_else(|| "jpg".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|_| ApiError::bad_request("Error al leer el archivo"))?;

    if data.len() > settings.max_image_bytes {
        return Err(ApiError::bad_request(format!(
            "La imagen {file_name} excede el tamaño máximo de {} bytes",
            settings.max_image_bytes
        )));
    }

    fs::create_dir_all(&settings.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("No se pudo crear {:?}: {e}", settings.upload_dir)))?;

    let new_filename = format!("{}.{}", Uuid::new_v4(), extension);
    let filepath = settings.upload_dir.join(&new_filename);
    fs::write(&filepath, data)
        .await
        .map_err(|e| ApiError::Internal(format!("No se pudo guardar la imagen: {e}")))?;

    Ok(format!("/uploads/{new_filename}"))
}
