//! idlc - compile an interface definition document
//!
//! Reads a document in the JSON form produced by the IDL parser, compiles
//! it, and prints a summary of the compiled unit.
//!
//! Usage:
//!   idlc service.json
//!   idlc service.json --protocol json --emit scope.json
//!   RUST_LOG=idlc=debug idlc service.json

use anyhow::{Context, Result};
use clap::Parser;
use idlc::ast::Document;
use idlc::{CompiledUnit, Compiler, CompilerOptions, EntityTag, ProtocolKind};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "idlc", version)]
#[command(about = "Compile an interface definition document")]
struct Cli {
    /// Path to the parsed document (JSON)
    document: PathBuf,

    /// Serialization protocol bound into the compiled unit (msgpack, json)
    #[arg(long)]
    protocol: Option<String>,

    /// Compiler options file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved scope as JSON to this path
    #[arg(long)]
    emit: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idlc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => CompilerOptions::load(path)?,
        None => CompilerOptions::default(),
    };
    if let Some(name) = &cli.protocol {
        options.protocol = name.parse::<ProtocolKind>()?;
    }

    let document = read_document(&cli.document)?;
    let name = unit_name(&cli.document);
    info!(document = %cli.document.display(), protocol = %options.protocol, "compiling");

    let unit = Compiler::from_options(&options)
        .compile(&name, &document)
        .with_context(|| format!("failed to compile {}", cli.document.display()))?;

    for warning in unit.warnings() {
        warn!("{warning}");
    }
    print_summary(&unit);

    if let Some(path) = &cli.emit {
        let json = serde_json::to_string_pretty(unit.scope())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "resolved scope written");
    }

    Ok(())
}

fn read_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid document", path.display()))
}

/// Unit name: the file stem of the document.
fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unit".to_string())
}

fn print_summary(unit: &CompiledUnit) {
    println!("{} ({} protocol)", unit.name(), unit.protocol().name());

    for tag in [
        EntityTag::Const,
        EntityTag::TypeAlias,
        EntityTag::Enum,
        EntityTag::Struct,
        EntityTag::Union,
        EntityTag::Exception,
    ] {
        let names: Vec<&str> = unit.scope().all(tag).map(|(_, e)| e.name()).collect();
        if !names.is_empty() {
            println!("  {:<10} {}", tag.describe(), names.join(", "));
        }
    }

    for service in unit.services() {
        let methods: Vec<String> = service
            .methods()
            .iter()
            .map(|m| {
                if m.declared_in() == service.name() {
                    m.name().to_string()
                } else {
                    format!("{}.{}", m.declared_in(), m.name())
                }
            })
            .collect();
        println!("  service    {} [{}]", service.name(), methods.join(", "));
    }

    if !unit.warnings().is_empty() {
        println!("  {} warning(s)", unit.warnings().len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["idlc", "api.json", "--protocol", "json", "--emit", "out.json"]);
        assert_eq!(cli.document, PathBuf::from("api.json"));
        assert_eq!(cli.protocol.as_deref(), Some("json"));
        assert_eq!(cli.emit, Some(PathBuf::from("out.json")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_unit_name_is_file_stem() {
        assert_eq!(unit_name(Path::new("specs/billing.json")), "billing");
        assert_eq!(unit_name(Path::new("/")), "unit");
    }
}
