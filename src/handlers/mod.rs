pub mod auth;
pub mod catalogo;
pub mod diagnostico;
pub mod perfil;
pub mod presupuestos;
pub mod proyectos;
pub mod upload;
