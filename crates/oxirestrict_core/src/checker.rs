use anyhow::Result;
use futures::future::try_join_all;
use log::debug;

use crate::decider::{AsyncDecider, Decider, ResolveContext};
use crate::parser::imports_in;
use crate::types::RestrictedImport;

/// Applies every decider to every import found in `source`.
///
/// Returns one list per decider, in decider order; within each list the
/// imports keep the scanner's document order. An import appears in decider
/// i's list iff decider i restricted it.
pub fn check(
    source: &str,
    deciders: &[Decider],
    file_name: &str,
    record_statements: bool,
) -> Vec<Vec<RestrictedImport>> {
    let found = imports_in(source, file_name, record_statements);
    deciders
        .iter()
        .map(|decider| {
            found
                .iter()
                .filter_map(|import| {
                    let decision = decider.decide(&import.path);
                    decision.restricted.then(|| RestrictedImport::new(import, decision.info))
                })
                .collect()
        })
        .collect()
}

/// Asynchronous twin of [`check`] for deciders that consult the host
/// resolver.
///
/// Every (decider, import) pair is issued as an independent unit of deferred
/// work and joined before a decider's list is produced, so output order is
/// the scanner's order no matter when each unit completes. A failing unit
/// (for instance a rejected resolution) fails the whole call; other imports
/// are never silently dropped.
pub async fn check_async<'a, I>(
    source: &str,
    deciders: I,
    file_name: &str,
    record_statements: bool,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<Vec<RestrictedImport>>>
where
    I: IntoIterator<Item = &'a AsyncDecider>,
{
    let found = imports_in(source, file_name, record_statements);
    let found = &found;
    let per_decider = deciders.into_iter().map(|decider| async move {
        let decisions =
            try_join_all(found.iter().map(|import| decider.decide(&import.path, ctx))).await?;
        Ok::<_, anyhow::Error>(
            found
                .iter()
                .zip(decisions)
                .filter_map(|(import, decision)| {
                    decision.restricted.then(|| RestrictedImport::new(import, decision.info))
                })
                .collect::<Vec<_>>(),
        )
    });
    let matrix = try_join_all(per_decider).await?;
    debug!(
        "Checked {} with {} deciders: {} restricted imports",
        file_name,
        matrix.len(),
        matrix.iter().map(Vec::len).sum::<usize>()
    );
    Ok(matrix)
}
