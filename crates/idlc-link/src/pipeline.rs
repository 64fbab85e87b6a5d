//! Generation and linking of one document.
//!
//! This module runs the stages of the compiler that work on the scope,
//! in their fixed order.
//!
//! # Pipeline Order
//! 1. **Headers** - reject `include`, ignore `namespace`.
//! 2. **Generation** - one unresolved entity per definition.
//! 3. **Constants** - bind and evaluate every constant.
//! 4. **Types** - bind typedefs and fields, check fields and defaults.
//! 5. **Services** - bind signatures, compute effective method sets.
//!
//! Every stage fails fast: the first error aborts the compilation and no
//! partially linked scope is returned.

use crate::error::{Result, Warning};
use crate::generate::Generator;
use crate::link;
use crate::scope::Scope;
use idlc_ast::Document;
use tracing::debug;

/// A fully resolved scope plus the warnings produced while linking it.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked {
    pub scope: Scope,
    pub warnings: Vec<Warning>,
}

/// Generate and link `document` into a fresh scope named `name`.
///
/// Each call owns its scope, so independent calls may run concurrently.
pub fn compile(name: &str, document: &Document) -> Result<Linked> {
    let mut scope = Scope::new(name);

    let mut generator = Generator::new(&mut scope);
    for header in &document.headers {
        generator.process_header(header)?;
    }
    for definition in &document.definitions {
        generator.process(definition)?;
    }
    debug!(unit = name, entities = scope.len(), "generation complete");

    let warnings = link::link_all(&mut scope)?;
    debug!(unit = name, warnings = warnings.len(), "linking complete");

    Ok(Linked { scope, warnings })
}
