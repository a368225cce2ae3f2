//! Output backends for emitting events.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use icingawatch_types::Event;

/// Request timeout for the Dashing output.
pub const DASHING_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from delivering an event.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dashboard rejected {name} with status {status}")]
    Rejected { name: String, status: u16 },
}

/// Output destination for events.
#[derive(Debug)]
pub enum Output {
    /// Print each event as a JSON line.
    Stdout,

    /// Append each event as a JSON line to a file.
    File(PathBuf),

    /// Send events to a TCP server.
    ///
    /// Each event is sent as a newline-delimited JSON message.
    Tcp(String),

    /// Send events through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(tokio::sync::mpsc::Sender<Event>),

    /// Push events to a Dashing dashboard.
    Dashing {
        client: reqwest::Client,
        url: String,
        auth_token: String,
    },
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use icingawatch::emit::Output;
    ///
    /// let output = Output::file("events.jsonl");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use icingawatch::emit::Output;
    /// use icingawatch::types::{Event, EventGroup, MeterPayload, Payload};
    ///
    /// tokio_test::block_on(async {
    ///     let (output, mut rx) = Output::channel(16);
    ///     let event = Event::new(
    ///         EventGroup::HostMeter,
    ///         Payload::Meter(MeterPayload {
    ///             value: 1,
    ///             max: 4,
    ///             moreinfo: "Total hosts: 4".into(),
    ///             color: "blue".into(),
    ///         }),
    ///     );
    ///
    ///     output.emit(&event).await.unwrap();
    ///     assert_eq!(rx.recv().await.unwrap().name, "icinga-host-meter");
    /// });
    /// ```
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<Event>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Create a Dashing output pushing to `<url>/widgets/<name>`.
    ///
    /// Requests time out after [`DASHING_TIMEOUT`].
    pub fn dashing(
        url: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, OutputError> {
        Self::dashing_with_timeout(url, auth_token, DASHING_TIMEOUT)
    }

    /// Create a Dashing output with a custom request timeout.
    pub fn dashing_with_timeout(
        url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OutputError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Output::Dashing {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        })
    }

    /// Emit an event to this output.
    pub async fn emit(&self, event: &Event) -> Result<(), OutputError> {
        match self {
            Output::Stdout => {
                println!("{}", serde_json::to_string(event)?);
            }
            Output::File(path) => {
                let mut line = serde_json::to_vec(event)?;
                line.push(b'\n');
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(&line).await?;
            }
            Output::Tcp(addr) => {
                use tokio::net::TcpStream;

                // Best effort: an absent listener is not an error
                if let Ok(mut stream) = TcpStream::connect(addr).await {
                    let json = serde_json::to_string(event)?;
                    let _ = stream.write_all(json.as_bytes()).await;
                    let _ = stream.write_all(b"\n").await;
                }
            }
            Output::Channel(tx) => {
                // Don't block the poll loop on a slow consumer
                let _ = tx.try_send(event.clone());
            }
            Output::Dashing {
                client,
                url,
                auth_token,
            } => {
                let response = client
                    .post(format!("{}/widgets/{}", url, event.name))
                    .json(&dashing_body(event, auth_token)?)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(OutputError::Rejected {
                        name: event.name.to_string(),
                        status: response.status().as_u16(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The event payload with `auth_token` added at the top level.
fn dashing_body(event: &Event, auth_token: &str) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(&event.payload)?;
    if let Value::Object(map) = &mut body {
        map.insert("auth_token".to_string(), Value::String(auth_token.to_string()));
    }
    Ok(body)
}

/// Where to send events, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
    Tcp(String),
    Dashing,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown output '{0}', expected stdout, file:PATH, tcp:ADDR or dashing")]
pub struct ParseTargetError(String);

impl FromStr for OutputTarget {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "stdout" => Ok(OutputTarget::Stdout),
            None if s == "dashing" => Ok(OutputTarget::Dashing),
            Some(("file", path)) if !path.is_empty() => Ok(OutputTarget::File(path.into())),
            Some(("tcp", addr)) if !addr.is_empty() => Ok(OutputTarget::Tcp(addr.to_string())),
            _ => Err(ParseTargetError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "stdout"),
            OutputTarget::File(path) => write!(f, "file:{}", path.display()),
            OutputTarget::Tcp(addr) => write!(f, "tcp:{}", addr),
            OutputTarget::Dashing => write!(f, "dashing"),
        }
    }
}
