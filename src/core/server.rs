use crate::core::codec::{encode_value, read_frame};
use crate::core::message::{recover_uid, Message};
use crate::core::registry::MethodRegistry;
use crate::core::sexp;
use crate::domain::model::Value;
use crate::utils::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Mutex;

/// Pause after a failed accept, e.g. on fd exhaustion.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct EpcServer {
    listener: TcpListener,
    registry: Arc<Mutex<MethodRegistry>>,
}

impl EpcServer {
    pub async fn bind<A: ToSocketAddrs>(addr: A, registry: MethodRegistry) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::debug!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            registry: Arc::new(Mutex::new(registry)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn port(&self) -> Result<u16> {
        Ok(self.local_addr()?.port())
    }

    /// Writes the bound port as a single line and flushes, so a parent
    /// process reading our stdout can connect right away.
    pub fn print_port<W: std::io::Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.port()?)?;
        out.flush()?;
        Ok(())
    }

    /// Accepts connections until the process is killed. Each connection is
    /// served by its own task, and the registry lock lets only one call run
    /// at a time whatever the runtime flavor.
    pub async fn serve_forever(self) -> Result<()> {
        {
            let registry = self.registry.lock().await;
            if registry.is_empty() {
                tracing::warn!("No methods registered, every call will fail");
            }
            tracing::info!(
                "Serving {} method(s) on {}",
                registry.len(),
                self.local_addr()?
            );
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::info!("Accepted connection from {}", peer);
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        match serve_connection(stream, &registry).await {
                            Ok(()) => tracing::info!("Connection from {} closed", peer),
                            Err(e) => {
                                tracing::warn!("Connection from {} dropped: {}", peer, e)
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Reads frames until the peer disconnects, answering each in order.
/// The registry is held locked while a payload is dispatched, so calls from
/// connections sharing it never overlap. Returns an error only when the
/// stream itself is unusable.
pub async fn serve_connection<S>(stream: S, registry: &Mutex<MethodRegistry>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    while let Some(payload) = read_frame(&mut reader).await? {
        tracing::debug!("<- {}", payload.trim_end());
        let reply = {
            let registry = registry.lock().await;
            handle_payload(&payload, &registry)
        };
        let Some(reply) = reply else {
            continue;
        };

        let uid = reply.uid().clone();
        let frame = match encode_value(&reply.into_value()) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Reply to {} could not be framed: {}", uid, e);
                encode_value(
                    &Message::ReturnError {
                        uid,
                        error: Value::string(e.to_string()),
                    }
                    .into_value(),
                )?
            }
        };
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Decodes one payload and dispatches it. Undecodable payloads are answered
/// with `epc-error` rather than closing the connection.
pub fn handle_payload(payload: &str, registry: &MethodRegistry) -> Option<Message> {
    let value = match sexp::parse(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Unreadable payload: {}", e);
            return Some(Message::epc_error(Value::Nil, e));
        }
    };

    match Message::from_value(&value) {
        Ok(message) => registry.dispatch(message),
        Err(e) => {
            tracing::warn!("Rejected message {}: {}", value, e);
            Some(Message::epc_error(recover_uid(&value), e))
        }
    }
}
