use std::sync::OnceLock;

use crate::models::producto::{FiltroCatalogo, Opciones, Producto};

static CATALOGO: OnceLock<Vec<Producto>> = OnceLock::new();

fn strings(valores: &[&str]) -> Vec<String> {
    valores.iter().map(|v| v.to_string()).collect()
}

fn cargar() -> Vec<Producto> {
    let cuidados_madera = strings(&[
        "Limpiar con un paño suave y seco",
        "Evitar la exposición directa al sol",
        "Aplicar cera natural cada seis meses",
    ]);

    vec![
        Producto {
            id: 1,
            nombre: "Mesa de comedor Alba".into(),
            descripcion: "Mesa de roble macizo con patas torneadas a mano.".into(),
            precio: 1290.0,
            imagenes: strings(&["/img/productos/mesa-alba-1.jpg", "/img/productos/mesa-alba-2.jpg"]),
            categoria: "mesa".into(),
            material: "roble".into(),
            estilo: "clasico".into(),
            dimensiones: "180 x 90 x 75 cm".into(),
            opciones: Opciones {
                colores: strings(&["natural", "miel", "nogal"]),
                acabados: strings(&["barnizado", "encerado"]),
                tamanos: strings(&["160 cm", "180 cm", "200 cm"]),
            },
            cuidados: cuidados_madera.clone(),
            garantia: "5 años".into(),
        },
        Producto {
            id: 2,
            nombre: "Silla Nórdica".into(),
            descripcion: "Silla de haya con asiento ergonómico.".into(),
            precio: 189.0,
            imagenes: strings(&["/img/productos/silla-nordica.jpg"]),
            categoria: "silla".into(),
            material: "haya".into(),
            estilo: "nordico".into(),
            dimensiones: "45 x 50 x 90 cm".into(),
            opciones: Opciones {
                colores: strings(&["natural", "blanco", "negro"]),
                acabados: strings(&["natural", "lacado"]),
                tamanos: vec![],
            },
            cuidados: cuidados_madera.clone(),
            garantia: "2 años".into(),
        },
        Producto {
            id: 3,
            nombre: "Armario Sierra".into(),
            descripcion: "Armario de nogal de dos puertas con cajonera interior.".into(),
            precio: 2450.0,
            imagenes: strings(&["/img/productos/armario-sierra.jpg"]),
            categoria: "armario".into(),
            material: "nogal".into(),
            estilo: "moderno".into(),
            dimensiones: "120 x 60 x 210 cm".into(),
            opciones: Opciones {
                colores: strings(&["nogal"]),
                acabados: strings(&["barnizado", "lacado"]),
                tamanos: strings(&["2 puertas", "3 puertas"]),
            },
            cuidados: cuidados_madera.clone(),
            garantia: "5 años".into(),
        },
        Producto {
            id: 4,
            nombre: "Estantería Rústica".into(),
            descripcion: "Estantería de pino envejecido con cinco baldas.".into(),
            precio: 540.0,
            imagenes: strings(&["/img/productos/estanteria-rustica.jpg"]),
            categoria: "estanteria".into(),
            material: "pino".into(),
            estilo: "rustico".into(),
            dimensiones: "100 x 35 x 190 cm".into(),
            opciones: Opciones {
                colores: strings(&["envejecido", "natural"]),
                acabados: strings(&["envejecido", "encerado"]),
                tamanos: strings(&["100 cm", "140 cm"]),
            },
            cuidados: cuidados_madera.clone(),
            garantia: "3 años".into(),
        },
        Producto {
            id: 5,
            nombre: "Cama Olivo".into(),
            descripcion: "Cabecero y estructura de cerezo con somier de láminas.".into(),
            precio: 1650.0,
            imagenes: strings(&["/img/productos/cama-olivo.jpg"]),
            categoria: "cama".into(),
            material: "cerezo".into(),
            estilo: "clasico".into(),
            dimensiones: "160 x 200 cm".into(),
            opciones: Opciones {
                colores: strings(&["cerezo"]),
                acabados: strings(&["barnizado"]),
                tamanos: strings(&["135 cm", "150 cm", "160 cm"]),
            },
            cuidados: cuidados_madera,
            garantia: "5 años".into(),
        },
    ]
}

pub fn catalogo() -> &'static [Producto] {
    CATALOGO.get_or_init(cargar)
}

pub fn buscar(filtro: &FiltroCatalogo) -> Vec<&'static Producto> {
    let coincide = |valor: &str, esperado: &Option<String>| {
        esperado
            .as_deref()
            .map_or(true, |e| valor.eq_ignore_ascii_case(e.trim()))
    };

    catalogo()
        .iter()
        .filter(|p| {
            coincide(&p.categoria, &filtro.categoria)
                && coincide(&p.material, &filtro.material)
                && coincide(&p.estilo, &filtro.estilo)
        })
        .collect()
}

pub fn producto(id: u32) -> Option<&'static Producto> {
    catalogo().iter().find(|p| p.id == id)
}
