//! Owner-only removal of comments and replies together with their heart
//! ledgers.

use crate::{
    config::SocialConfig,
    errors::{Resource, SocialError, require_name},
    gateway::{PersistenceGateway, Transaction, WriteOp},
    types::{DeletedType, DeletionReceipt, Post},
    versioned::{commit_post_change, versioned_transaction},
};

#[derive(Debug, Clone)]
pub struct CascadingDeletion {
    write_attempts: u32,
}

impl CascadingDeletion {
    pub fn new(config: &SocialConfig) -> Self {
        Self {
            write_attempts: config.engagement.attempts(),
        }
    }

    /// Deletes a top-level comment and every reply under it.
    pub async fn delete_comment<G>(
        &self,
        gateway: &mut G,
        post_id: &str,
        comment_id: &str,
        actor: &str,
    ) -> Result<DeletionReceipt, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("post_id", post_id)?;
        require_name("comment_id", comment_id)?;
        require_name("username", actor)?;

        let receipt = commit_post_change(gateway, post_id, self.write_attempts, |current| {
            let thread = current
                .thread(comment_id)
                .ok_or_else(|| SocialError::not_found(Resource::Comment, comment_id))?;
            if thread.comment.username != actor {
                return Err(SocialError::forbidden(format!(
                    "{actor} cannot delete comment {comment_id} written by {}",
                    thread.comment.username
                )));
            }

            let mut doomed = vec![comment_id.to_string()];
            doomed.extend(thread.replies.iter().map(|reply| reply.id.clone()));
            let receipt = DeletionReceipt {
                deleted_id: comment_id.to_string(),
                deleted_type: DeletedType::Comment,
                deleted_replies_count: thread.replies.len(),
            };

            let mut next = current.next_revision();
            next.comments.retain(|thread| thread.comment.id != comment_id);
            let tx = removal_transaction("delete_comment", current, next, doomed);
            Ok((tx, receipt))
        })
        .await?;

        log::info!(
            "{actor} deleted comment {comment_id} on post {post_id} with {} replies",
            receipt.deleted_replies_count
        );
        Ok(receipt)
    }

    /// Deletes one reply under `comment_id`.
    pub async fn delete_reply<G>(
        &self,
        gateway: &mut G,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &str,
    ) -> Result<DeletionReceipt, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("post_id", post_id)?;
        require_name("comment_id", comment_id)?;
        require_name("reply_id", reply_id)?;
        require_name("username", actor)?;

        let receipt = commit_post_change(gateway, post_id, self.write_attempts, |current| {
            let reply = current
                .thread(comment_id)
                .ok_or_else(|| SocialError::not_found(Resource::Comment, comment_id))?
                .reply(reply_id)
                .ok_or_else(|| SocialError::not_found(Resource::Reply, reply_id))?;
            if reply.username != actor {
                return Err(SocialError::forbidden(format!(
                    "{actor} cannot delete reply {reply_id} written by {}",
                    reply.username
                )));
            }

            let mut next = current.next_revision();
            if let Some(thread) = next.thread_mut(comment_id) {
                thread.replies.retain(|reply| reply.id != reply_id);
            }
            let tx = removal_transaction("delete_reply", current, next, vec![reply_id.to_string()]);
            Ok((
                tx,
                DeletionReceipt {
                    deleted_id: reply_id.to_string(),
                    deleted_type: DeletedType::Reply,
                    deleted_replies_count: 0,
                },
            ))
        })
        .await?;

        log::info!("{actor} deleted reply {reply_id} under {comment_id} on post {post_id}");
        Ok(receipt)
    }
}

/// Hearts go first, then the rows, then the trimmed post.
fn removal_transaction(label: &'static str, current: &Post, next: Post, doomed: Vec<String>) -> Transaction {
    let mut tx = versioned_transaction(label, current);
    tx.push(WriteOp::DeleteHearts {
        comment_ids: doomed.clone(),
    })
    .push(WriteOp::DeleteComments {
        post_id: current.id.clone(),
        comment_ids: doomed,
    })
    .push(WriteOp::PutPost(next));
    tx
}
