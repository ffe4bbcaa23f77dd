use crate::{
    error::{ApiError, ApiResult},
    models::producto::{FiltroCatalogo, Producto},
    services::catalogo,
    utils::extract::{Json, Path, Query},
};

// GET /api/productos?categoria=&material=&estilo=
pub async fn listar_productos_handler(Query(filtro): Query<FiltroCatalogo>) -> Json<Vec<&'static Producto>> {
    Json(catalogo::buscar(&filtro))
}

// GET /api/productos/:id
pub async fn producto_handler(Path(id): Path<u32>) -> ApiResult<Json<&'static Producto>> {
    catalogo::producto(id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Producto no encontrado"))
}
