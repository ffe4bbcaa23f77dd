pub mod presupuesto;
pub mod producto;
pub mod proyecto;
pub mod user;
