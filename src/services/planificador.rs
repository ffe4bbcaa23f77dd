//! Planificación de producción: filtros, agrupación por estado y carga de
//! trabajo de cada artesano sobre los proyectos asignados.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::proyecto::{EstadoProyecto, Prioridad, Proyecto};

pub const PLANTILLA_ARTESANOS: &[&str] = &[
    "Carlos Martínez",
    "Ana López",
    "Miguel Fernández",
    "Laura Sánchez",
];

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Filtro {
    pub estado: Option<EstadoProyecto>,
    pub prioridad: Option<Prioridad>,
    pub artesano: Option<String>,
}

impl Filtro {
    fn acepta(&self, proyecto: &Proyecto) -> bool {
        self.estado.map_or(true, |e| proyecto.estado == e)
            && self.prioridad.map_or(true, |p| proyecto.prioridad == p)
            && self
                .artesano
                .as_deref()
                .map_or(true, |a| proyecto.artesanos.iter().any(|x| x == a))
    }
}

pub fn filtrar<'a>(proyectos: &'a [Proyecto], filtro: &Filtro) -> Vec<&'a Proyecto> {
    proyectos.iter().filter(|p| filtro.acepta(p)).collect()
}

pub fn agrupar_por_estado<'a>(
    proyectos: &[&'a Proyecto],
) -> BTreeMap<EstadoProyecto, Vec<&'a Proyecto>> {
    let mut grupos: BTreeMap<EstadoProyecto, Vec<&'a Proyecto>> = BTreeMap::new();
    for p in proyectos {
        grupos.entry(p.estado).or_default().push(p);
    }
    grupos
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargaArtesano {
    pub artesano: String,
    pub proyectos_activos: usize,
    pub urgentes: usize,
}

/// Cuenta, para cada artesano de la plantilla, los proyectos activos que
/// tiene asignados. Los proyectos cerrados no ocupan taller.
pub fn carga_por_artesano(proyectos: &[&Proyecto], plantilla: &[&str]) -> Vec<CargaArtesano> {
    plantilla
        .iter()
        .map(|artesano| {
            let asignados: Vec<_> = proyectos
                .iter()
                .filter(|p| p.estado.es_activo() && p.artesanos.iter().any(|a| a == artesano))
                .collect();
            CargaArtesano {
                artesano: artesano.to_string(),
                proyectos_activos: asignados.len(),
                urgentes: asignados
                    .iter()
                    .filter(|p| p.prioridad == Prioridad::Urgente)
                    .count(),
            }
        })
        .collect()
}

/// Proyectos activos sin nadie asignado.
pub fn sin_asignar<'a>(proyectos: &[&'a Proyecto]) -> Vec<&'a Proyecto> {
    proyectos
        .iter()
        .copied()
        .filter(|p| p.estado.es_activo() && p.artesanos.is_empty())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planificacion {
    pub grupos: BTreeMap<EstadoProyecto, Vec<Proyecto>>,
    pub carga: Vec<CargaArtesano>,
    pub sin_asignar: Vec<Proyecto>,
}

pub fn planificar(proyectos: &[Proyecto], filtro: &Filtro) -> Planificacion {
    let filtrados = filtrar(proyectos, filtro);
    let grupos = agrupar_por_estado(&filtrados)
        .into_iter()
        .map(|(estado, lista)| (estado, lista.into_iter().cloned().collect()))
        .collect();

    Planificacion {
        grupos,
        carga: carga_por_artesano(&filtrados, PLANTILLA_ARTESANOS),
        sin_asignar: sin_asignar(&filtrados).into_iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::demo::proyectos_demo;

    #[test]
    fn carga_cuenta_solo_proyectos_activos() {
        let proyectos = proyectos_demo();
        let todos: Vec<&Proyecto> = proyectos.iter().collect();
        let carga = carga_por_artesano(&todos, PLANTILLA_ARTESANOS);

        let de = |nombre: &str| carga.iter().find(|c| c.artesano == nombre).unwrap().clone();
        // cocina (en progreso) + mostrador (pausado, urgente)
        assert_eq!(de("Carlos Martínez").proyectos_activos, 2);
        assert_eq!(de("Carlos Martínez").urgentes, 1);
        assert_eq!(de("Ana López").proyectos_activos, 1);
        assert_eq!(de("Miguel Fernández").proyectos_activos, 1);
        // la mesa de reuniones ya está completada
        assert_eq!(de("Laura Sánchez").proyectos_activos, 0);
    }

    #[test]
    fn filtros_se_combinan() {
        let proyectos = proyectos_demo();
        let filtro = Filtro {
            artesano: Some("Carlos Martínez".into()),
            prioridad: Some(Prioridad::Urgente),
            ..Default::default()
        };
        let r = filtrar(&proyectos, &filtro);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].titulo, "Mostrador para tienda");

        let filtro = Filtro { estado: Some(EstadoProyecto::Rechazado), ..Default::default() };
        assert!(filtrar(&proyectos, &filtro).is_empty());
    }

    #[test]
    fn planificacion_agrupa_y_detecta_sin_asignar() {
        let proyectos = proyectos_demo();
        let plan = planificar(&proyectos, &Filtro::default());
        let total: usize = plan.grupos.values().map(Vec::len).sum();
        assert_eq!(total, proyectos.len());
        assert_eq!(plan.grupos[&EstadoProyecto::Pendiente].len(), 1);
        assert_eq!(plan.sin_asignar.len(), 1);
        assert_eq!(plan.sin_asignar[0].titulo, "Dormitorio infantil");
        assert_eq!(plan.carga.len(), PLANTILLA_ARTESANOS.len());
    }
}
