pub mod errors;
pub mod filter;
pub mod summary;
pub mod todo;

pub use errors::*;
pub use filter::*;
pub use summary::*;
pub use todo::*;
