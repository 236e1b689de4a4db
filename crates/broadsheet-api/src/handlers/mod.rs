pub mod health;
pub mod processing;
