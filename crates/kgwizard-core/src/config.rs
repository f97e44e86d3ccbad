//! Configuration: graph endpoint and output directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_GRAPH_ADDRESS: &str = "ws://localhost";
pub const DEFAULT_GRAPH_PORT: u16 = 8182;
pub const DEFAULT_GRAPH_NAME: &str = "g";

/// Address value selecting the in-process graph instead of a remote server.
pub const MEMORY_ADDRESS: &str = "memory";

/// Where the property-graph server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Server address, e.g. `ws://localhost` or `http://janus:8182`.
    pub address: String,
    pub port: u16,
    /// Traversal source alias on the server (`g` by default).
    pub graph_name: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_GRAPH_ADDRESS.into(),
            port: DEFAULT_GRAPH_PORT,
            graph_name: DEFAULT_GRAPH_NAME.into(),
        }
    }
}

impl GraphConfig {
    /// True when the in-process graph was requested.
    pub fn is_memory(&self) -> bool {
        self.address.eq_ignore_ascii_case(MEMORY_ADDRESS)
    }

    /// HTTP endpoint of the Gremlin server.
    ///
    /// Websocket schemes are mapped to their HTTP counterparts and a bare
    /// host gets `http://`. An explicit port inside `address` wins over
    /// `port`.
    pub fn endpoint(&self) -> Result<String> {
        if self.is_memory() {
            return Err(Error::Config(
                "the in-process graph has no network endpoint".into(),
            ));
        }
        let address = self.address.trim().trim_end_matches('/');
        if address.is_empty() {
            return Err(Error::Config("graph address is empty".into()));
        }

        let (scheme, rest) = match address.split_once("://") {
            Some(("ws", rest)) | Some(("http", rest)) => ("http", rest),
            Some(("wss", rest)) | Some(("https", rest)) => ("https", rest),
            Some((other, _)) => {
                return Err(Error::Config(format!(
                    "unsupported graph address scheme: {}",
                    other
                )))
            }
            None => ("http", address),
        };
        if let Some((given, _)) = address.split_once("://") {
            if given != scheme {
                debug!("Graph address scheme {} mapped to {}", given, scheme);
            }
        }

        let (host, path) = match rest.split_once('/') {
            Some((host, path)) => (host, format!("/{}", path)),
            None => (rest, String::new()),
        };

        let has_port = host
            .rsplit_once(':')
            .map(|(_, p)| p.parse::<u16>().is_ok())
            .unwrap_or(false);

        Ok(if has_port {
            format!("{}://{}{}", scheme, host, path)
        } else {
            format!("{}://{}:{}{}", scheme, host, self.port, path)
        })
    }
}

/// Output locations for a transform run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Directory receiving `{record}_{run}.json` turn files.
    pub root: PathBuf,
    /// Append-only log of failed files (`errors.log`).
    pub error_log: PathBuf,
}

impl OutputPaths {
    /// Create output paths under `root`. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            error_log: root.join("errors.log"),
            root,
        })
    }

    /// Path of the file holding turn `run` of `record_stem`.
    ///
    /// Path separators in either part become `_`, so the file always lands
    /// directly in `root`.
    pub fn turn_file(&self, record_stem: &str, run: &str) -> PathBuf {
        self.root.join(format!(
            "{}_{}.json",
            file_name_part(record_stem),
            file_name_part(run)
        ))
    }
}

fn file_name_part(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}
