use crate::utils::error::Result;
use crate::utils::validation::{validate_host, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "llamacs")]
#[command(about = "EPC server exposing `query`, which appends \"polpetteeee\" to a string")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_HOST, help = "Host or address to bind")]
    pub host: String,

    #[arg(long, default_value = "0", help = "Port to bind, 0 lets the OS choose")]
    pub port: u16,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// `(host, port)` in the form `TcpListener::bind` accepts.
    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            verbose: false,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_host("host", &self.host)
    }
}
