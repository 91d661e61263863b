pub mod codec;
pub mod message;
pub mod registry;
pub mod server;
pub mod sexp;

pub use crate::domain::model::Value;
pub use crate::domain::ports::Procedure;
pub use crate::utils::error::Result;
