use crate::domain::model::Value;
use crate::domain::ports::Procedure;
use crate::utils::error::{Result, ServerError};

pub const QUERY_METHOD: &str = "query";
pub const QUERY_SUFFIX: &str = "polpetteeee";

/// Appends [`QUERY_SUFFIX`] to its single string argument, verbatim.
pub fn query(a: &str) -> String {
    let mut out = String::with_capacity(a.len() + QUERY_SUFFIX.len());
    out.push_str(a);
    out.push_str(QUERY_SUFFIX);
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryProcedure;

impl Procedure for QueryProcedure {
    fn call(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::Str(a)] => Ok(Value::Str(query(a))),
            [other] => Err(ServerError::procedure(format!(
                "{QUERY_METHOD}: expected a string argument, got {} {}",
                other.type_name(),
                other
            ))),
            _ => Err(ServerError::procedure(format!(
                "{QUERY_METHOD}: takes exactly 1 argument ({} given)",
                args.len()
            ))),
        }
    }

    fn arg_spec(&self) -> Value {
        Value::List(vec![Value::symbol("a")])
    }

    fn docstring(&self) -> &str {
        "Return A with \"polpetteeee\" appended."
    }
}
