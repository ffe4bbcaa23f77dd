use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::{extract::WithRejection, TypedHeader};
use chrono::Utc;
use serde_json::json;

use crate::{
    db::{esquema, presupuestos},
    error::{ApiError, ApiResult},
    handlers::upload::guardar_imagen,
    models::{
        presupuesto::{
            ActualizarEstado, ActualizarProgreso, Autor, DetalleQuery, FiltroListado,
            FormularioPresupuesto, Importe, Mensaje, NuevoMensaje, Presupuesto, Progreso,
        },
        user::Claims,
    },
    services::{
        calculadora::{self, SolicitudCalculo},
        demo::{self, Listado},
    },
    utils::{
        extract::{Json, Query},
        jwt::claims_opcionales,
    },
    AppState,
};

fn solicitud_de(form: &FormularioPresupuesto) -> SolicitudCalculo {
    SolicitudCalculo {
        categoria: form.categoria.clone(),
        material: form.material.clone(),
        acabado: form.acabado.clone(),
        dimensiones: form.dimensiones,
        unidades: form.unidades,
    }
}

fn puede_ver(claims: &Claims, presupuesto: &Presupuesto) -> bool {
    claims.rol.es_admin() || presupuesto.usuario_id == Some(claims.id)
}

// POST /api/presupuestos/calcular (token opcional: con sesión se aplica el descuento)
pub async fn calcular_handler(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(body): Json<SolicitudCalculo>,
) -> ApiResult<Json<Importe>> {
    let autenticado = claims_opcionales(&state, auth).is_some();
    Ok(Json(calculadora::calcular(&body, autenticado)?))
}

// POST /api/presupuestos/crear (multipart: "datos" + "imagen_0".."imagen_N")
pub async fn crear_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let mut imagenes: Vec<String> = Vec::new();

    // 1. Leer 'datos' y guardar las imágenes en disco según llegan
    // 2. Recalcular el importe e insertar en Base de Datos
    let guardado = match leer_formulario(&state, &mut multipart, &mut imagenes).await {
        Ok(form) => guardar(&state, &claims, &form, &imagenes).await,
        Err(e) => Err(e),
    };

    // 3. Si algo falló, no dejar imágenes huérfanas en 'uploads'
    match guardado {
        Ok(presupuesto) => Ok((StatusCode::CREATED, Json(presupuesto))),
        Err(e) => {
            borrar_imagenes(&state, &imagenes).await;
            Err(e)
        }
    }
}

/// Recorre el multipart. Las imágenes se van guardando en disco y sus URLs
/// quedan en `imagenes` aunque luego falle algo, para poder borrarlas.
async fn leer_formulario(
    state: &AppState,
    multipart: &mut Multipart,
    imagenes: &mut Vec<String>,
) -> ApiResult<FormularioPresupuesto> {
    let mut formulario: Option<FormularioPresupuesto> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulario inválido: {e}")))?
    {
        let nombre = field.name().unwrap_or("").to_string();
        if nombre == "datos" {
            let texto = field
                .text()
                .await
                .map_err(|_| ApiError::bad_request("No se pudo leer el campo 'datos'"))?;
            let form = serde_json::from_str(&texto)
                .map_err(|e| ApiError::bad_request(format!("Campo 'datos' inválido: {e}")))?;
            formulario = Some(form);
        } else if nombre.starts_with("imagen") {
            if imagenes.len() >= state.settings.max_imagenes {
                return Err(ApiError::bad_request(format!(
                    "Se admiten como máximo {} imágenes",
                    state.settings.max_imagenes
                )));
            }
            imagenes.push(guardar_imagen(&state.settings, field).await?);
        }
    }

    formulario.ok_or_else(|| ApiError::bad_request("No se envió el campo 'datos'"))
}

async fn guardar(
    state: &AppState,
    claims: &Claims,
    form: &FormularioPresupuesto,
    imagenes: &[String],
) -> ApiResult<Presupuesto> {
    if form.nombre.trim().is_empty() {
        return Err(ApiError::bad_request("El nombre es obligatorio"));
    }

    // El importe se recalcula aquí; el del formulario solo es orientativo
    let importe = calculadora::calcular(&solicitud_de(form), true)?;
    if let Some(total_cliente) = form.total_cliente {
        if (total_cliente - importe.total).abs() >= 0.01 {
            tracing::warn!(
                "Total del formulario ({}) distinto del calculado ({}) para {}",
                total_cliente,
                importe.total,
                claims.email
            );
        }
    }

    let unidades = i32::try_from(form.unidades)
        .map_err(|_| ApiError::bad_request("Número de unidades fuera de rango"))?;

    let presupuesto = presupuestos::crear(
        &state.pool,
        presupuestos::NuevoPresupuesto {
            usuario_id: claims.id,
            nombre: form.nombre.trim(),
            categoria: &form.categoria,
            material: &form.material,
            acabado: &form.acabado,
            dimensiones: form.dimensiones,
            unidades,
            comentarios: form.comentarios.as_deref(),
            imagenes,
            importe: &importe,
        },
    )
    .await?;

    tracing::info!(
        "Presupuesto {} creado por {} ({} €)",
        presupuesto.id,
        claims.email,
        presupuesto.presupuesto.total
    );
    Ok(presupuesto)
}

async fn borrar_imagenes(state: &AppState, imagenes: &[String]) {
    for url in imagenes {
        if let Some(nombre) = url.strip_prefix("/uploads/") {
            let ruta = state.settings.upload_dir.join(nombre);
            if let Err(e) = tokio::fs::remove_file(&ruta).await {
                tracing::warn!("No se pudo borrar {:?}: {}", ruta, e);
            }
        }
    }
}

// GET /api/presupuestos/usuario
pub async fn usuario_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Presupuesto>>> {
    Ok(Json(presupuestos::por_usuario(&state.pool, claims.id).await?))
}

// GET /api/presupuestos/detalle?id=
pub async fn detalle_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<DetalleQuery>,
) -> ApiResult<Json<Presupuesto>> {
    let presupuesto = presupuestos::por_id(&state.pool, q.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Presupuesto no encontrado"))?;

    if !puede_ver(&claims, &presupuesto) {
        return Err(ApiError::forbidden("No puedes ver presupuestos de otros clientes"));
    }
    Ok(Json(presupuesto))
}

// GET /api/presupuestos/listar?estado=&limite= (admin)
pub async fn listar_handler(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroListado>,
) -> ApiResult<Json<Listado<Presupuesto>>> {
    match presupuestos::listar(&state.pool, filtro.estado, filtro.limite_efectivo()).await {
        Ok(items) => Ok(Json(Listado::real(items))),
        Err(e) => {
            let motivo = demo::motivo_para(&e).ok_or(ApiError::Database(e))?;
            tracing::warn!("Listado de presupuestos en modo demostración: {:?}", motivo);
            Ok(Json(Listado::demo(motivo, demo::presupuestos_filtrados(&filtro))))
        }
    }
}

// POST /api/presupuestos/crear-tabla (admin)
pub async fn crear_tabla_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    esquema::crear_tabla_presupuestos(&state.pool).await?;
    tracing::info!("Tabla de presupuestos creada por {}", claims.email);
    Ok(Json(json!({ "message": "Tabla de presupuestos lista" })))
}

// POST /api/presupuestos/mensaje
pub async fn mensaje_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<NuevoMensaje>,
) -> ApiResult<Json<Presupuesto>> {
    let texto = body.mensaje.trim();
    if texto.is_empty() {
        return Err(ApiError::bad_request("El mensaje no puede estar vacío"));
    }

    let presupuesto = presupuestos::por_id(&state.pool, body.presupuesto_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Presupuesto no encontrado"))?;
    if !puede_ver(&claims, &presupuesto) {
        return Err(ApiError::forbidden("No puedes escribir en presupuestos de otros clientes"));
    }

    let mensaje = Mensaje {
        autor: if claims.rol.es_admin() { Autor::Admin } else { Autor::Cliente },
        mensaje: texto.to_string(),
        fecha: Utc::now(),
    };
    let actualizado = presupuestos::agregar_mensaje(&state.pool, presupuesto.id, &mensaje)
        .await?
        .ok_or_else(|| ApiError::not_found("Presupuesto no encontrado"))?;
    Ok(Json(actualizado))
}

// POST /api/presupuestos/progreso (admin)
pub async fn progreso_handler(
    State(state): State<AppState>,
    Json(body): Json<ActualizarProgreso>,
) -> ApiResult<Json<Presupuesto>> {
    if body.porcentaje > 100 {
        return Err(ApiError::bad_request("El porcentaje debe estar entre 0 y 100"));
    }
    if body.etapa_actual.trim().is_empty() {
        return Err(ApiError::bad_request("La etapa actual es obligatoria"));
    }

    let progreso = Progreso {
        porcentaje: body.porcentaje,
        etapa_actual: body.etapa_actual.trim().to_string(),
        fecha_estimada: body.fecha_estimada,
    };
    let actualizado = presupuestos::actualizar_progreso(&state.pool, body.presupuesto_id, &progreso)
        .await?
        .ok_or_else(|| ApiError::not_found("Presupuesto no encontrado"))?;
    Ok(Json(actualizado))
}

// PUT /api/presupuestos/actualizar-estado (admin)
pub async fn actualizar_estado_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<ActualizarEstado>,
) -> ApiResult<Json<Presupuesto>> {
    let (_, _, automatico) = body.estado.progreso_derivado();
    let texto = body
        .mensaje
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(automatico);

    let mensaje = Mensaje {
        autor: Autor::Admin,
        mensaje: texto.to_string(),
        fecha: Utc::now(),
    };
    let actualizado = presupuestos::actualizar_estado(&state.pool, body.id, body.estado, &mensaje)
        .await?
        .ok_or_else(|| ApiError::not_found("Presupuesto no encontrado"))?;

    tracing::info!("{} pasó el presupuesto {} a {}", claims.email, body.id, body.estado);
    Ok(Json(actualizado))
}
