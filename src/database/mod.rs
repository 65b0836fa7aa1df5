mod connection;
pub mod schema;
pub mod seed;

pub use connection::{check_health, create_pool};
