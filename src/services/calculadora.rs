//! Cálculo del precio de un presupuesto a partir del formulario.
//!
//! ```text
//! precio  = base(categoria)
//! precio += precio * volumen_m3 * 0.5
//! precio *= factor(material) * factor(acabado) * unidades
//! descuento = 5 % si el cliente está registrado
//! ```
//!
//! Solo se redondea a céntimos al final.

use serde::{Deserialize, Serialize};

use crate::models::presupuesto::{Dimensiones, Importe};

pub const AJUSTE_VOLUMEN: f64 = 0.5;
pub const DESCUENTO_REGISTRADO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculoError {
    #[error("Categoría desconocida: {0}")]
    CategoriaDesconocida(String),
    #[error("Material desconocido: {0}")]
    MaterialDesconocido(String),
    #[error("Acabado desconocido: {0}")]
    AcabadoDesconocido(String),
    #[error("Las dimensiones deben ser mayores que cero")]
    DimensionesInvalidas,
    #[error("Debe pedirse al menos una unidad")]
    SinUnidades,
}

pub const CATEGORIAS: &[(&str, f64)] = &[
    ("mesa", 1200.0),
    ("silla", 350.0),
    ("armario", 1800.0),
    ("estanteria", 900.0),
    ("cama", 1500.0),
    ("escritorio", 1000.0),
    ("comoda", 950.0),
    ("aparador", 1300.0),
];

pub const MATERIALES: &[(&str, f64)] = &[
    ("pino", 1.0),
    ("haya", 1.3),
    ("roble", 1.5),
    ("cerezo", 1.7),
    ("nogal", 1.8),
    ("mdf", 0.7),
];

pub const ACABADOS: &[(&str, f64)] = &[
    ("natural", 1.0),
    ("encerado", 1.05),
    ("barnizado", 1.1),
    ("pintado", 1.2),
    ("envejecido", 1.25),
    ("lacado", 1.3),
];

fn buscar(tabla: &[(&str, f64)], clave: &str) -> Option<f64> {
    let clave = clave.trim().to_lowercase();
    tabla.iter().find(|(k, _)| *k == clave).map(|(_, v)| *v)
}

pub fn precio_base(categoria: &str) -> Result<f64, CalculoError> {
    buscar(CATEGORIAS, categoria).ok_or_else(|| CalculoError::CategoriaDesconocida(categoria.to_string()))
}

pub fn factor_material(material: &str) -> Result<f64, CalculoError> {
    buscar(MATERIALES, material).ok_or_else(|| CalculoError::MaterialDesconocido(material.to_string()))
}

pub fn factor_acabado(acabado: &str) -> Result<f64, CalculoError> {
    buscar(ACABADOS, acabado).ok_or_else(|| CalculoError::AcabadoDesconocido(acabado.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitudCalculo {
    pub categoria: String,
    pub material: String,
    pub acabado: String,
    pub dimensiones: Dimensiones,
    pub unidades: u32,
}

/// Plazo orientativo de entrega.
pub fn tiempo_estimado(categoria: &str, unidades: u32) -> &'static str {
    if unidades > 5 {
        return "4-6 semanas";
    }
    match categoria.trim().to_lowercase().as_str() {
        "armario" | "estanteria" => "3-4 semanas",
        _ => "2-3 semanas",
    }
}

/// Precio antes de descuento, sin redondear.
pub fn precio_bruto(solicitud: &SolicitudCalculo) -> Result<f64, CalculoError> {
    let d = &solicitud.dimensiones;
    if !(d.ancho > 0.0 && d.alto > 0.0 && d.profundidad > 0.0) {
        return Err(CalculoError::DimensionesInvalidas);
    }
    if solicitud.unidades == 0 {
        return Err(CalculoError::SinUnidades);
    }

    let mut precio = precio_base(&solicitud.categoria)?;
    precio += precio * d.volumen_m3() * AJUSTE_VOLUMEN;
    precio *= factor_material(&solicitud.material)?;
    precio *= factor_acabado(&solicitud.acabado)?;
    precio *= f64::from(solicitud.unidades);
    Ok(precio)
}

pub fn calcular(solicitud: &SolicitudCalculo, autenticado: bool) -> Result<Importe, CalculoError> {
    let subtotal = precio_bruto(solicitud)?;
    let descuento = if autenticado { subtotal * DESCUENTO_REGISTRADO } else { 0.0 };

    let subtotal = redondear(subtotal);
    let descuento = redondear(descuento);
    Ok(Importe {
        subtotal,
        descuento,
        total: redondear(subtotal - descuento),
        tiempo_estimado: tiempo_estimado(&solicitud.categoria, solicitud.unidades).to_string(),
    })
}

pub fn redondear(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesa(unidades: u32) -> SolicitudCalculo {
        SolicitudCalculo {
            categoria: "mesa".into(),
            material: "pino".into(),
            acabado: "natural".into(),
            dimensiones: Dimensiones { ancho: 100.0, alto: 75.0, profundidad: 60.0 },
            unidades,
        }
    }

    #[test]
    fn mesa_de_pino_sin_registro() {
        let r = calcular(&mesa(1), false).unwrap();
        assert_eq!(r.subtotal, 1470.0);
        assert_eq!(r.descuento, 0.0);
        assert_eq!(r.total, 1470.0);
        assert_eq!(r.tiempo_estimado, "2-3 semanas");
    }

    #[test]
    fn mesa_de_pino_registrado() {
        let r = calcular(&mesa(1), true).unwrap();
        assert_eq!(r.descuento, 73.5);
        assert_eq!(r.total, 1396.5);
    }

    #[test]
    fn unidades_multiplican_antes_del_descuento() {
        let r = calcular(&mesa(3), true).unwrap();
        assert_eq!(r.subtotal, 4410.0);
        assert_eq!(r.descuento, 220.5);
        assert_eq!(r.total, 4189.5);
    }

    #[test]
    fn plazos_de_entrega() {
        assert_eq!(tiempo_estimado("mesa", 6), "4-6 semanas");
        assert_eq!(tiempo_estimado("armario", 6), "4-6 semanas");
        assert_eq!(tiempo_estimado("armario", 1), "3-4 semanas");
        assert_eq!(tiempo_estimado("estanteria", 5), "3-4 semanas");
        assert_eq!(tiempo_estimado("silla", 5), "2-3 semanas");
    }

    #[test]
    fn rechaza_entradas_invalidas() {
        let mut s = mesa(1);
        s.categoria = "trono".into();
        assert_eq!(calcular(&s, false), Err(CalculoError::CategoriaDesconocida("trono".into())));

        let mut s = mesa(1);
        s.material = "plastico".into();
        assert!(matches!(calcular(&s, false), Err(CalculoError::MaterialDesconocido(_))));

        let mut s = mesa(1);
        s.acabado = "cromado".into();
        assert!(matches!(calcular(&s, false), Err(CalculoError::AcabadoDesconocido(_))));

        let mut s = mesa(1);
        s.dimensiones.alto = 0.0;
        assert_eq!(calcular(&s, false), Err(CalculoError::DimensionesInvalidas));

        assert_eq!(calcular(&mesa(0), false), Err(CalculoError::SinUnidades));
    }

    #[test]
    fn claves_sin_distinguir_mayusculas() {
        let mut s = mesa(1);
        s.categoria = " Mesa ".into();
        s.material = "PINO".into();
        assert_eq!(calcular(&s, false).unwrap().total, 1470.0);
    }
}
