pub mod calculadora;
pub mod catalogo;
pub mod demo;
pub mod notificaciones;
pub mod planificador;
