pub mod epochs;
pub mod health;
pub mod now;
