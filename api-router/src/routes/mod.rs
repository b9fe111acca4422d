pub mod campaign;
pub mod health;
pub mod readiness;
pub mod search;
