//! Optimistic read-modify-write over a post snapshot.

use crate::{
    errors::{Resource, SocialError},
    gateway::{Guard, PersistenceGateway, Transaction, WriteOp},
    types::Post,
};

/// Starts a transaction that only commits while the post is still at the
/// version `current` was read at. Orphaned rows found by the read are
/// removed by the same commit.
pub(crate) fn versioned_transaction(label: &'static str, current: &Post) -> Transaction {
    let mut tx = Transaction::begin(label);
    tx.guard(Guard::PostVersion {
        post_id: current.id.clone(),
        expected: current.version,
    });
    if !current.orphaned_rows.is_empty() {
        log::info!(
            "{label} on post {} also removes {} orphaned rows",
            current.id,
            current.orphaned_rows.len()
        );
        tx.push(WriteOp::DeleteHearts {
            comment_ids: current.orphaned_rows.clone(),
        })
        .push(WriteOp::DeleteComments {
            post_id: current.id.clone(),
            comment_ids: current.orphaned_rows.clone(),
        });
    }
    tx
}

/// Loads the post, lets `plan` build a versioned transaction from it and
/// commits. A lost version race re-reads and re-plans, up to `attempts`
/// times; `plan` errors are returned without retrying.
pub(crate) async fn commit_post_change<G, T, F>(
    gateway: &mut G,
    post_id: &str,
    attempts: u32,
    mut plan: F,
) -> Result<T, SocialError>
where
    G: PersistenceGateway,
    F: FnMut(&Post) -> Result<(Transaction, T), SocialError>,
{
    let mut attempt = 1;
    loop {
        let current = gateway
            .post(post_id)
            .await?
            .ok_or_else(|| SocialError::not_found(Resource::Post, post_id))?;
        let (tx, output) = plan(&current)?;
        let label = tx.label();
        match gateway.commit(tx).await {
            Ok(()) => return Ok(output),
            Err(err) if err.is_stale() && attempt < attempts => {
                log::debug!("{label} on post {post_id} lost version {} (attempt {attempt}), retrying", current.version);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
