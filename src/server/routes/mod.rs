//! API Routes

pub mod generate;
pub mod health;
pub mod history;
pub mod models;
pub mod voices;
