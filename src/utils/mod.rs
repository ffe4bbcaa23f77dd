pub mod extract;
pub mod jwt;
pub mod security;
