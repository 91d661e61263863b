use crate::domain::model::Value;
use crate::utils::error::Result;

/// A procedure callable by name over EPC.
pub trait Procedure: Send + Sync {
    fn call(&self, args: &[Value]) -> Result<Value>;

    /// Argument names reported by `methods`; `nil` when unknown.
    fn arg_spec(&self) -> Value {
        Value::Nil
    }

    fn docstring(&self) -> &str {
        ""
    }
}

impl<F> Procedure for F
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> Result<Value> {
        self(args)
    }
}
