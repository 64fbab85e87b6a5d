//! Compiler configuration.
//!
//! Options are plain serde data so they can come from a JSON file, a CLI
//! flag, or code:
//!
//! ```json
//! { "protocol": "json" }
//! ```

use crate::error::ConfigError;
use crate::protocol::{JsonProtocol, MessagePackProtocol, Protocol};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Reference protocols that can be selected by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    #[default]
    Msgpack,
    Json,
}

impl ProtocolKind {
    pub fn name(self) -> &'static str {
        match self {
            ProtocolKind::Msgpack => "msgpack",
            ProtocolKind::Json => "json",
        }
    }

    /// Instantiate the protocol.
    pub fn build(self) -> Arc<dyn Protocol> {
        match self {
            ProtocolKind::Msgpack => Arc::new(MessagePackProtocol),
            ProtocolKind::Json => Arc::new(JsonProtocol),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msgpack" => Ok(ProtocolKind::Msgpack),
            "json" => Ok(ProtocolKind::Json),
            other => Err(ConfigError::UnknownProtocol(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Protocol bound into every compiled unit
    pub protocol: ProtocolKind,
}

impl CompilerOptions {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::from_json("{}").unwrap();
        assert_eq!(options.protocol, ProtocolKind::Msgpack);
        assert_eq!(options, CompilerOptions::default());
    }

    #[test]
    fn test_protocol_by_name() {
        let options = CompilerOptions::from_json(r#"{"protocol": "json"}"#).unwrap();
        assert_eq!(options.protocol, ProtocolKind::Json);
        assert_eq!(options.protocol.build().name(), "json");

        assert_eq!("msgpack".parse::<ProtocolKind>().unwrap(), ProtocolKind::Msgpack);
        assert!(matches!(
            "thrift".parse::<ProtocolKind>(),
            Err(ConfigError::UnknownProtocol(name)) if name == "thrift"
        ));
    }

    #[test]
    fn test_rejects_unknown_keys_and_protocols() {
        assert!(matches!(
            CompilerOptions::from_json(r#"{"protocl": "json"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CompilerOptions::from_json(r#"{"protocol": "xml"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"protocol": "json"}}"#).unwrap();

        let options = CompilerOptions::load(file.path()).unwrap();
        assert_eq!(options.protocol, ProtocolKind::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        match CompilerOptions::load(&path) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
