use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serial port: {0}")]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("automation call failed: {0}")]
    Automation(String),

    #[error("could not find {0}")]
    Lookup(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("serial transport closed")]
    TransportClosed,

    #[error("serial transport: {0}")]
    Transport(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
