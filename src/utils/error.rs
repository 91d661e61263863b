use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Framing error: {message}")]
    FrameError { message: String },

    #[error("S-expression parse error at offset {offset}: {message}")]
    ParseError { offset: usize, message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("{message}")]
    ProcedureError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl ServerError {
    pub fn frame(message: impl Into<String>) -> Self {
        Self::FrameError {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    pub fn procedure(message: impl Into<String>) -> Self {
        Self::ProcedureError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
