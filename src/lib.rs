pub mod app;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub mod config;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::procedures::{default_registry, query, QueryProcedure};
pub use crate::core::{registry::MethodRegistry, server::EpcServer};
pub use domain::model::Value;
pub use utils::error::{Result, ServerError};
