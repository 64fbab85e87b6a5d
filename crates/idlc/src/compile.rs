//! The compiler entry point.

use crate::config::CompilerOptions;
use crate::error::Error;
use crate::protocol::{MessagePackProtocol, Protocol};
use crate::unit::{self, CompiledUnit};
use idlc_ast::Document;
use std::sync::Arc;
use tracing::{info, instrument};

/// Compiles documents into [`CompiledUnit`]s bound to one protocol.
///
/// A compiler holds no per-document state. Every call to
/// [`compile`](Self::compile) builds a fresh scope, so one compiler can be
/// shared across threads and the same document compiled any number of
/// times.
#[derive(Debug, Clone)]
pub struct Compiler {
    protocol: Option<Arc<dyn Protocol>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(MessagePackProtocol)
    }
}

impl Compiler {
    pub fn new(protocol: impl Protocol + 'static) -> Self {
        Self {
            protocol: Some(Arc::new(protocol)),
        }
    }

    pub fn from_options(options: &CompilerOptions) -> Self {
        Self {
            protocol: Some(options.protocol.build()),
        }
    }

    /// A compiler with no protocol; every compilation fails with
    /// [`ConfigError::MissingProtocol`](crate::ConfigError::MissingProtocol)
    /// once linking succeeds.
    pub fn without_protocol() -> Self {
        Self { protocol: None }
    }

    /// Generate, link and assemble `document`.
    ///
    /// Fails fast: the first error found in generation or linking order is
    /// returned and no partial unit is produced.
    #[instrument(skip_all, fields(unit = name))]
    pub fn compile(&self, name: &str, document: &Document) -> Result<CompiledUnit, Error> {
        let linked = idlc_link::compile(name, document)?;
        let unit = unit::assemble(linked, self.protocol.clone())?;
        info!(
            entities = unit.scope().len(),
            warnings = unit.warnings().len(),
            protocol = unit.protocol().name(),
            "compiled"
        );
        Ok(unit)
    }
}

/// Compile `document` with the default MessagePack protocol.
pub fn compile(name: &str, document: &Document) -> Result<CompiledUnit, Error> {
    Compiler::default().compile(name, document)
}
