//! Panel de administración de presupuestos.
//!
//! Mantiene la lista cargada y su origen. Cuando el listado es de
//! demostración los cambios de estado se aplican solo en local.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::{api::ApiClient, ClienteError};
use crate::{
    models::presupuesto::{EstadoPresupuesto, FiltroListado, Presupuesto},
    services::demo::{self, MotivoDemo, Origen},
};

#[derive(Debug)]
struct Lista {
    items: Vec<Presupuesto>,
    origen: Origen,
}

pub struct PanelPresupuestos {
    api: ApiClient,
    lista: Mutex<Lista>,
    en_curso: Mutex<HashSet<Uuid>>,
}

/// Marca un presupuesto como ocupado mientras vive.
struct Reserva<'a> {
    en_curso: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl<'a> Reserva<'a> {
    fn tomar(en_curso: &'a Mutex<HashSet<Uuid>>, id: Uuid) -> Result<Self, ClienteError> {
        let mut ocupados = en_curso.lock().unwrap_or_else(PoisonError::into_inner);
        if !ocupados.insert(id) {
            return Err(ClienteError::EnCurso(id));
        }
        Ok(Reserva { en_curso, id })
    }
}

impl Drop for Reserva<'_> {
    fn drop(&mut self) {
        self.en_curso
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl PanelPresupuestos {
    pub fn new(api: ApiClient) -> Self {
        PanelPresupuestos {
            api,
            lista: Mutex::new(Lista { items: Vec::new(), origen: Origen::Real }),
            en_curso: Mutex::new(HashSet::new()),
        }
    }

    fn lista(&self) -> MutexGuard<'_, Lista> {
        self.lista.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn items(&self) -> Vec<Presupuesto> {
        self.lista().items.clone()
    }

    pub fn origen(&self) -> Origen {
        self.lista().origen
    }

    pub fn usando_datos_demo(&self) -> bool {
        self.origen().es_demo()
    }

    /// Carga el listado. Si el servidor no contesta se muestran los datos de
    /// demostración locales; los errores de la API (permisos, validación) se
    /// devuelven tal cual.
    pub async fn cargar(&self, estado: Option<EstadoPresupuesto>, limite: Option<i64>) -> Result<Origen, ClienteError> {
        let (items, origen) = match self.api.listar_presupuestos(estado, limite).await {
            Ok(listado) => (listado.items, listado.origen),
            Err(ClienteError::Http(e)) => {
                tracing::warn!("Servidor no disponible, panel en modo demostración: {}", e);
                let items = demo::presupuestos_filtrados(&FiltroListado { estado, limite });
                (items, Origen::Demo { motivo: MotivoDemo::BackendNoDisponible })
            }
            Err(e) => return Err(e),
        };

        let mut lista = self.lista();
        lista.items = items;
        lista.origen = origen;
        Ok(origen)
    }

    /// Cambia el estado de un presupuesto. Un segundo cambio sobre el mismo
    /// presupuesto mientras el primero sigue en vuelo se rechaza con `EnCurso`.
    pub async fn cambiar_estado(
        &self,
        id: Uuid,
        estado: EstadoPresupuesto,
        mensaje: Option<String>,
    ) -> Result<Presupuesto, ClienteError> {
        let _reserva = Reserva::tomar(&self.en_curso, id)?;

        if self.usando_datos_demo() {
            let mut lista = self.lista();
            let presupuesto = lista
                .items
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ClienteError::NoEncontrado(id))?;
            presupuesto.aplicar_estado(estado, mensaje);
            return Ok(presupuesto.clone());
        }

        let actualizado = self.api.actualizar_estado_presupuesto(id, estado, mensaje).await?;
        let mut lista = self.lista();
        match lista.items.iter_mut().find(|p| p.id == id) {
            Some(p) => *p = actualizado.clone(),
            None => lista.items.insert(0, actualizado.clone()),
        }
        Ok(actualizado)
    }
}
