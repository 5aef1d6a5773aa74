pub mod health;
pub mod occurrence;
pub mod session;
