use crate::models::user::{Rol, Usuario};

use super::session::RUTA_LOGIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceso {
    Permitir,
    Redirigir(&'static str),
}

/// Decide si se puede entrar en una página. Sin sesión se va al login; con un
/// rol no permitido, a la página de inicio de ese rol. Una lista vacía admite
/// a cualquier usuario con sesión.
pub fn proteger(usuario: Option<&Usuario>, permitidos: &[Rol]) -> Acceso {
    match usuario {
        None => Acceso::Redirigir(RUTA_LOGIN),
        Some(u) if permitidos.is_empty() || permitidos.contains(&u.rol) => Acceso::Permitir,
        Some(u) => {
            tracing::debug!("{} ({}) no puede entrar aquí", u.email, u.rol);
            Acceso::Redirigir(u.rol.destino())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn con_rol(rol: Rol) -> Usuario {
        Usuario {
            id: Uuid::new_v4(),
            nombre: "Pablo".into(),
            apellidos: None,
            email: "pablo@correo.es".into(),
            password_hash: String::new(),
            telefono: None,
            direccion: None,
            ciudad: None,
            codigo_postal: None,
            provincia: None,
            rol,
            fecha_registro: Utc::now(),
        }
    }

    #[test]
    fn sin_sesion_va_al_login() {
        assert_eq!(proteger(None, &[Rol::Admin]), Acceso::Redirigir("/login"));
        assert_eq!(proteger(None, &[]), Acceso::Redirigir("/login"));
    }

    #[test]
    fn rol_permitido_entra() {
        let admin = con_rol(Rol::Admin);
        assert_eq!(proteger(Some(&admin), &[Rol::Admin]), Acceso::Permitir);
        assert_eq!(proteger(Some(&admin), &[]), Acceso::Permitir);
    }

    #[test]
    fn cliente_en_el_panel_vuelve_a_su_portal() {
        let cliente = con_rol(Rol::Client);
        assert_eq!(proteger(Some(&cliente), &[Rol::Admin]), Acceso::Redirigir("/client-portal"));
        assert_eq!(
            proteger(Some(&cliente), &[Rol::Client, Rol::Usuario]),
            Acceso::Permitir
        );
    }

    #[test]
    fn admin_en_el_portal_vuelve_al_panel() {
        let admin = con_rol(Rol::Admin);
        assert_eq!(proteger(Some(&admin), &[Rol::Client]), Acceso::Redirigir("/dashboard"));
    }
}
