use crate::domain::model::Value;
use crate::utils::error::{Result, ServerError};

/// One EPC message, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `(call UID METHOD ARGS)`
    Call {
        uid: Value,
        method: String,
        args: Vec<Value>,
    },
    /// `(methods UID)`
    Methods { uid: Value },
    /// `(return UID VALUE)`
    Return { uid: Value, value: Value },
    /// `(return-error UID ERROR)`: the procedure itself failed.
    ReturnError { uid: Value, error: Value },
    /// `(epc-error UID ERROR)`: the call could not be made at all.
    EpcError { uid: Value, error: Value },
}

impl Message {
    pub fn epc_error(uid: Value, message: impl std::fmt::Display) -> Self {
        Message::EpcError {
            uid,
            error: Value::string(format!("EPC-ERROR: {message}")),
        }
    }

    pub fn uid(&self) -> &Value {
        match self {
            Message::Call { uid, .. }
            | Message::Methods { uid }
            | Message::Return { uid, .. }
            | Message::ReturnError { uid, .. }
            | Message::EpcError { uid, .. } => uid,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Call { .. } => "call",
            Message::Methods { .. } => "methods",
            Message::Return { .. } => "return",
            Message::ReturnError { .. } => "return-error",
            Message::EpcError { .. } => "epc-error",
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(items) = value.as_list().filter(|items| !items.is_empty()) else {
            return Err(ServerError::protocol(format!(
                "message must be a non-empty list, got {}",
                value.type_name()
            )));
        };
        let Some(kind) = items[0].as_symbol() else {
            return Err(ServerError::protocol(format!(
                "message kind must be a symbol, got {}",
                items[0]
            )));
        };
        let rest = &items[1..];

        let message = match (kind, rest) {
            ("call", [uid, method, args]) => {
                let method = method
                    .as_symbol()
                    .or_else(|| method.as_str())
                    .ok_or_else(|| {
                        ServerError::protocol(format!("method name must be a symbol, got {method}"))
                    })?
                    .to_string();
                let args = args
                    .as_list()
                    .ok_or_else(|| {
                        ServerError::protocol(format!("call arguments must be a list, got {args}"))
                    })?
                    .to_vec();
                Message::Call {
                    uid: uid.clone(),
                    method,
                    args,
                }
            }
            ("methods", [uid]) => Message::Methods { uid: uid.clone() },
            ("return", [uid, value]) => Message::Return {
                uid: uid.clone(),
                value: value.clone(),
            },
            ("return-error", [uid, error, ..]) => Message::ReturnError {
                uid: uid.clone(),
                error: error.clone(),
            },
            ("epc-error", [uid, error, ..]) => Message::EpcError {
                uid: uid.clone(),
                error: error.clone(),
            },
            ("call" | "methods" | "return" | "return-error" | "epc-error", _) => {
                return Err(ServerError::protocol(format!(
                    "wrong number of fields in {kind} message: {value}"
                )))
            }
            _ => {
                return Err(ServerError::protocol(format!(
                    "unknown message kind: {kind}"
                )))
            }
        };
        Ok(message)
    }

    pub fn into_value(self) -> Value {
        let kind = Value::symbol(self.kind());
        let items = match self {
            Message::Call { uid, method, args } => {
                vec![kind, uid, Value::symbol(method), Value::list(args)]
            }
            Message::Methods { uid } => vec![kind, uid],
            Message::Return { uid, value } => vec![kind, uid, value],
            Message::ReturnError { uid, error } | Message::EpcError { uid, error } => {
                vec![kind, uid, error]
            }
        };
        Value::List(items)
    }
}

/// Best-effort UID for replying to a message that failed to decode.
pub fn recover_uid(value: &Value) -> Value {
    match value {
        Value::List(items) | Value::DottedList(items, _) if items.len() >= 2 => items[1].clone(),
        _ => Value::Nil,
    }
}
