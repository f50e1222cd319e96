use futures::future::join_all;
use tracing::debug;

use crate::error::{CodemateError, Result};
use crate::resolve::{Resolved, Resolver};

/// Most tools a single comparison may name.
pub const MAX_COMPARE: usize = 2;

/// Outcome of resolving several tools at once.
#[derive(Debug)]
pub struct Comparison {
    /// Resolved tools, in the caller's order.
    pub found: Vec<Resolved>,
    /// Identifiers that failed, with why.
    pub missing: Vec<(String, CodemateError)>,
}

/// Resolve 1..=[`MAX_COMPARE`] tools concurrently.
///
/// Each id goes through [`Resolver::resolve`] exactly as a single lookup
/// would. One failure never cancels another. Results keep the order of
/// `tool_ids`; if nothing was found the whole call fails with `NotFound`,
/// whatever the individual failures were.
pub async fn resolve_many(resolver: &Resolver, tool_ids: &[String]) -> Result<Comparison> {
    if tool_ids.is_empty() || tool_ids.len() > MAX_COMPARE {
        return Err(CodemateError::Validation(format!(
            "Provide 1 to {MAX_COMPARE} tool names to compare."
        )));
    }

    // join_all yields outputs in input order regardless of completion order.
    let outcomes = join_all(tool_ids.iter().map(|id| resolver.resolve(id))).await;

    let mut found = Vec::with_capacity(outcomes.len());
    let mut missing = Vec::new();
    for (id, outcome) in tool_ids.iter().zip(outcomes) {
        match outcome {
            Ok(resolved) => found.push(resolved),
            Err(e) => {
                debug!(tool = %id, error = %e, "excluded from comparison");
                missing.push((id.clone(), e));
            }
        }
    }

    if found.is_empty() {
        return Err(CodemateError::NotFound(tool_ids.join(", ")));
    }

    Ok(Comparison { found, missing })
}
