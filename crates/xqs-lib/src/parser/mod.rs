//! Error-tolerant recursive-descent parser.
//!
//! Grammar productions live in [`grammar`] as `parse_*` methods on the
//! [`core::Parser`] state machine. The parser never fails on malformed
//! input: unexpected tokens end up inside `Error` nodes, omitted
//! constructs become zero-width missing-markers, and the returned tree
//! always covers the whole input. The only `Err` paths are cooperative
//! cancellation and the recursion limit.

mod core;
mod grammar;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::Error;
use crate::diagnostics::Diagnostics;
use crate::tree::SyntaxTree;

pub(crate) use self::core::Parser;

/// A completed parse: the lossless tree plus everything worth telling
/// the user about it.
#[derive(Debug)]
pub struct Parse {
    pub tree: SyntaxTree,
    pub diagnostics: Diagnostics,
}

/// Knobs for a parse call. `Default` means no cancellation and a
/// generous recursion limit.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Checked cooperatively at a bounded cadence; when it flips, the
    /// parse unwinds with [`Error::Cancelled`] instead of returning a
    /// partial tree.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Maximum grammar recursion depth; `None` uses the default.
    pub recursion_limit: Option<u32>,
}

pub fn parse(source: &str) -> Result<Parse, Error> {
    parse_with(source, &ParseOptions::default())
}

pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Parse, Error> {
    let mut parser = Parser::new(source)
        .with_cancel_flag(options.cancel.clone())
        .with_recursion_limit(
            options
                .recursion_limit
                .unwrap_or(self::core::DEFAULT_RECURSION_LIMIT),
        );
    parser.parse_module();
    let (tree, diagnostics) = parser.finish()?;
    Ok(Parse { tree, diagnostics })
}
