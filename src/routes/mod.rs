use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    error::ApiError,
    handlers::{auth, catalogo, diagnostico, perfil, presupuestos, proyectos},
    utils::jwt::{admin_middleware, auth_middleware},
    AppState,
};

// Margen para el campo "datos" y las cabeceras del multipart
const MARGEN_MULTIPART: usize = 1024 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let limite_multipart =
        state.settings.max_image_bytes * state.settings.max_imagenes + MARGEN_MULTIPART;

    // 1. Rutas públicas
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/presupuestos/calcular", post(presupuestos::calcular_handler))
        .route("/api/productos", get(catalogo::listar_productos_handler))
        .route("/api/productos/:id", get(catalogo::producto_handler))
        .nest_service("/uploads", ServeDir::new(&state.settings.upload_dir));

    // 2. Rutas con sesión (clientes y administradores)
    let session_routes = Router::new()
        .route("/api/auth/validate", get(auth::validate_handler))
        .route("/api/auth/refresh-token", post(auth::refresh_token_handler))
        .route("/api/debug/usuario", get(auth::debug_usuario_handler))
        .route("/api/user/profile", get(perfil::profile_handler))
        .route("/api/user/update-profile", post(perfil::update_profile_handler))
        .route("/api/user/change-password", post(perfil::change_password_handler))
        .route("/api/client/projects", get(proyectos::resumen_handler))
        .route("/api/client/notifications", get(proyectos::notificaciones_handler))
        .route("/api/client/proyectos", get(proyectos::mis_proyectos_handler))
        .route("/api/client/comentar-proyecto", post(proyectos::comentar_handler))
        .route("/api/client/solicitar-proyecto", post(proyectos::solicitar_handler))
        .route("/api/presupuestos/usuario", get(presupuestos::usuario_handler))
        .route("/api/presupuestos/detalle", get(presupuestos::detalle_handler))
        .route(
            "/api/presupuestos/crear",
            post(presupuestos::crear_handler).layer(DefaultBodyLimit::max(limite_multipart)),
        )
        .route("/api/presupuestos/mensaje", post(presupuestos::mensaje_handler))
        .route("/api/diagnostico/resolver-admin", post(diagnostico::resolver_admin_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // 3. Rutas de administración
    let admin_routes = Router::new()
        .route("/api/auth/update-rol", post(auth::update_rol_handler))
        .route("/api/presupuestos/listar", get(presupuestos::listar_handler))
        .route("/api/presupuestos/crear-tabla", post(presupuestos::crear_tabla_handler))
        .route("/api/presupuestos/progreso", post(presupuestos::progreso_handler))
        .route("/api/presupuestos/actualizar-estado", put(presupuestos::actualizar_estado_handler))
        .route("/api/admin/proyectos", get(proyectos::admin_listar_handler))
        .route("/api/admin/actualizar-proyecto", post(proyectos::admin_actualizar_handler))
        .route("/api/admin/planificacion", get(proyectos::planificacion_handler))
        .route("/api/diagnostico/presupuestos", get(diagnostico::presupuestos_handler))
        .route("/api/diagnostico/crear-funcion-rpc", post(diagnostico::crear_funcion_rpc_handler))
        .route("/api/debug/supabase", get(diagnostico::estado_backend_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    // Fusionamos todo
    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .fallback(ruta_no_encontrada)
        .with_state(state)
}

async fn ruta_no_encontrada() -> ApiError {
    ApiError::not_found("Ruta no encontrada")
}

/// Router completo con CORS y trazas de peticiones.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
