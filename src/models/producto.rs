use serde::{Deserialize, Serialize};

// Artículos del catálogo público. Son datos fijos, no viven en la base de datos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producto {
    pub id: u32,
    pub nombre: String,
    pub descripcion: String,
    pub precio: f64,
    pub imagenes: Vec<String>,
    pub categoria: String,
    pub material: String,
    pub estilo: String,
    pub dimensiones: String,
    pub opciones: Opciones,
    pub cuidados: Vec<String>,
    pub garantia: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opciones {
    pub colores: Vec<String>,
    pub acabados: Vec<String>,
    pub tamanos: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroCatalogo {
    pub categoria: Option<String>,
    pub material: Option<String>,
    pub estilo: Option<String>,
}
