pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod repository;
pub mod retry;
pub mod seed;

pub use dynamodb::*;
pub use memory::*;
pub use models::*;
pub use repository::*;
pub use retry::*;
pub use seed::*;
