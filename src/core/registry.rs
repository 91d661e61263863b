use crate::core::message::Message;
use crate::domain::model::Value;
use crate::domain::ports::Procedure;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Procedures reachable over EPC, keyed by method name.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, Arc<dyn Procedure>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `procedure` under `name`, replacing any previous entry.
    pub fn register<P>(&mut self, name: impl Into<String>, procedure: P) -> &mut Self
    where
        P: Procedure + 'static,
    {
        let name = name.into();
        if self.methods.insert(name.clone(), Arc::new(procedure)).is_some() {
            tracing::warn!("Method '{}' registered twice, keeping the latest", name);
        } else {
            tracing::debug!("Registered method '{}'", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Procedure>> {
        self.methods.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// `((NAME ARGSPEC "DOC") ...)`, sorted by name.
    pub fn describe(&self) -> Value {
        Value::list(
            self.methods
                .iter()
                .map(|(name, procedure)| {
                    Value::List(vec![
                        Value::symbol(name.as_str()),
                        procedure.arg_spec(),
                        Value::string(procedure.docstring()),
                    ])
                })
                .collect(),
        )
    }

    /// Answers one incoming message. Replies from the peer yield `None`:
    /// this side never issues calls, so there is nothing waiting on them.
    pub fn dispatch(&self, message: Message) -> Option<Message> {
        match message {
            Message::Call { uid, method, args } => Some(self.call(uid, &method, &args)),
            Message::Methods { uid } => Some(Message::Return {
                uid,
                value: self.describe(),
            }),
            other => {
                tracing::warn!(
                    "Dropping unsolicited '{}' message for uid {}",
                    other.kind(),
                    other.uid()
                );
                None
            }
        }
    }

    fn call(&self, uid: Value, method: &str, args: &[Value]) -> Message {
        let Some(procedure) = self.get(method) else {
            tracing::warn!("Call {} to unknown method '{}'", uid, method);
            return Message::epc_error(uid, format!("No such method : {method}"));
        };

        match procedure.call(args) {
            Ok(value) => {
                tracing::debug!("Call {} to '{}' returned", uid, method);
                Message::Return { uid, value }
            }
            Err(e) => {
                tracing::warn!("Call {} to '{}' failed: {}", uid, method, e);
                Message::ReturnError {
                    uid,
                    error: Value::string(e.to_string()),
                }
            }
        }
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
