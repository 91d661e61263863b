pub mod query;

use crate::core::registry::MethodRegistry;

pub use query::{query, QueryProcedure, QUERY_METHOD, QUERY_SUFFIX};

/// The registry the binary serves: just `query`.
pub fn default_registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register(QUERY_METHOD, QueryProcedure);
    registry
}
