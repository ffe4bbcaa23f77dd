use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{presupuestos, proyectos},
    error::{ApiError, ApiResult},
    models::{
        proyecto::{
            ActualizarProyecto, Comentario, FiltroProyectos, NuevoComentario, Proyecto,
            SolicitudProyecto,
        },
        user::Claims,
    },
    services::{
        demo::{self, Listado, Origen},
        notificaciones::{self, Notificacion},
        planificador::{self, Filtro, Planificacion},
    },
    utils::extract::{Json, Query},
    AppState,
};

// POST /api/client/solicitar-proyecto
pub async fn solicitar_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<SolicitudProyecto>,
) -> ApiResult<impl IntoResponse> {
    if body.titulo.trim().is_empty() || body.descripcion.trim().is_empty() {
        return Err(ApiError::bad_request("Título y descripción son obligatorios"));
    }
    if body.presupuesto_estimado.is_some_and(|p| p < 0.0) {
        return Err(ApiError::bad_request("El presupuesto estimado no puede ser negativo"));
    }

    let proyecto = proyectos::crear(&state.pool, claims.id, &body).await?;
    tracing::info!("Proyecto {} solicitado por {}", proyecto.id, claims.email);
    Ok((StatusCode::CREATED, Json(proyecto)))
}

// GET /api/client/proyectos?estado=
pub async fn mis_proyectos_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filtro): Query<FiltroProyectos>,
) -> ApiResult<Json<Vec<Proyecto>>> {
    Ok(Json(proyectos::por_usuario(&state.pool, claims.id, filtro.estado).await?))
}

// POST /api/client/comentar-proyecto
pub async fn comentar_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<NuevoComentario>,
) -> ApiResult<Json<Proyecto>> {
    let texto = body.mensaje.trim();
    if texto.is_empty() {
        return Err(ApiError::bad_request("El comentario no puede estar vacío"));
    }

    let proyecto = proyectos::por_id(&state.pool, body.proyecto_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Proyecto no encontrado"))?;
    if proyecto.usuario_id != Some(claims.id) {
        return Err(ApiError::forbidden("Solo puedes comentar tus propios proyectos"));
    }

    let comentario = Comentario {
        mensaje: texto.to_string(),
        fecha: Utc::now(),
        admin: false,
    };
    let actualizado = proyectos::agregar_comentario(&state.pool, proyecto.id, &comentario)
        .await?
        .ok_or_else(|| ApiError::not_found("Proyecto no encontrado"))?;
    Ok(Json(actualizado))
}

#[derive(Debug, Serialize)]
pub struct ElementoResumen {
    pub id: Uuid,
    pub tipo: &'static str,
    pub titulo: String,
    pub estado: String,
    pub porcentaje: Option<u8>,
    pub fecha: DateTime<Utc>,
}

// GET /api/client/projects: resumen del portal del cliente
pub async fn resumen_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ElementoResumen>>> {
    let (mis_presupuestos, mis_proyectos) = tokio::try_join!(
        presupuestos::por_usuario(&state.pool, claims.id),
        proyectos::por_usuario(&state.pool, claims.id, None),
    )?;

    let mut resumen: Vec<ElementoResumen> = mis_presupuestos
        .into_iter()
        .map(|p| ElementoResumen {
            id: p.id,
            tipo: "presupuesto",
            titulo: format!("{} de {}", p.categoria, p.material),
            estado: p.estado.to_string(),
            porcentaje: Some(p.progreso.porcentaje),
            fecha: p.fecha_creacion,
        })
        .chain(mis_proyectos.into_iter().map(|p| ElementoResumen {
            id: p.id,
            tipo: "proyecto",
            titulo: p.titulo,
            estado: p.estado.to_string(),
            porcentaje: None,
            fecha: p.fecha_solicitud,
        }))
        .collect();
    resumen.sort_by(|a, b| b.fecha.cmp(&a.fecha));
    Ok(Json(resumen))
}

// GET /api/client/notifications
pub async fn notificaciones_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Notificacion>>> {
    let (mis_presupuestos, mis_proyectos) = tokio::try_join!(
        presupuestos::por_usuario(&state.pool, claims.id),
        proyectos::por_usuario(&state.pool, claims.id, None),
    )?;
    Ok(Json(notificaciones::derivar(&mis_presupuestos, &mis_proyectos)))
}

async fn cargar_proyectos(state: &AppState, filtro: &FiltroProyectos) -> ApiResult<Listado<Proyecto>> {
    match proyectos::listar(&state.pool, filtro.estado, filtro.prioridad).await {
        Ok(items) => Ok(Listado::real(items)),
        Err(e) => {
            let motivo = demo::motivo_para(&e).ok_or(ApiError::Database(e))?;
            tracing::warn!("Listado de proyectos en modo demostración: {:?}", motivo);

            let items = demo::proyectos_demo()
                .into_iter()
                .filter(|p| filtro.estado.map_or(true, |e| p.estado == e))
                .filter(|p| filtro.prioridad.map_or(true, |pr| p.prioridad == pr))
                .collect();
            Ok(Listado::demo(motivo, items))
        }
    }
}

// GET /api/admin/proyectos?estado=&prioridad= (admin)
pub async fn admin_listar_handler(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroProyectos>,
) -> ApiResult<Json<Listado<Proyecto>>> {
    Ok(Json(cargar_proyectos(&state, &filtro).await?))
}

// POST /api/admin/actualizar-proyecto (admin)
pub async fn admin_actualizar_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<ActualizarProyecto>,
) -> ApiResult<Json<Proyecto>> {
    // 1. Comprobar que hay algo que cambiar
    if body.estado.is_none() && body.artesanos.is_none() && body.fecha_entrega.is_none() && !body.notificar_cliente {
        return Err(ApiError::bad_request("No hay cambios que aplicar"));
    }

    // 2. Preparar el comentario para el cliente (mensaje propio o el automático del estado)
    let comentario = if body.notificar_cliente {
        let texto = body
            .mensaje
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| body.estado.map(|e| e.mensaje_automatico().to_string()))
            .ok_or_else(|| ApiError::bad_request("Indica un mensaje o un estado para notificar"))?;
        Some(Comentario { mensaje: texto, fecha: Utc::now(), admin: true })
    } else {
        None
    };

    // 3. Limpiar la lista de artesanos
    let artesanos = body.artesanos.as_ref().map(|lista| {
        lista
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
    });

    // 4. Guardar todos los cambios en una sola sentencia
    let actualizado = proyectos::actualizar(
        &state.pool,
        body.id,
        proyectos::CambiosProyecto {
            estado: body.estado,
            artesanos: artesanos.as_deref(),
            fecha_entrega: body.fecha_entrega,
            comentario,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Proyecto no encontrado"))?;

    tracing::info!(
        "{} actualizó el proyecto {} (estado {}, notificado: {})",
        claims.email,
        actualizado.id,
        actualizado.estado,
        body.notificar_cliente
    );
    Ok(Json(actualizado))
}

#[derive(Debug, Serialize)]
pub struct RespuestaPlanificacion {
    #[serde(flatten)]
    pub origen: Origen,
    #[serde(flatten)]
    pub plan: Planificacion,
}

// GET /api/admin/planificacion?estado=&prioridad=&artesano= (admin)
pub async fn planificacion_handler(
    State(state): State<AppState>,
    Query(filtro): Query<Filtro>,
) -> ApiResult<Json<RespuestaPlanificacion>> {
    // el filtro de estado y prioridad se aplica en memoria junto al de artesano
    let listado = cargar_proyectos(&state, &FiltroProyectos { estado: None, prioridad: None }).await?;
    Ok(Json(RespuestaPlanificacion {
        origen: listado.origen,
        plan: planificador::planificar(&listado.items, &filtro),
    }))
}
