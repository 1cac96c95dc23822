//! Post lifecycle: creation, lookup and author-only removal.

use chrono::Utc;

use crate::{
    config::{EngagementSettings, SocialConfig},
    errors::{Resource, SocialError, require_name},
    gateway::{PersistenceGateway, Transaction, WriteOp},
    id::generate_entity_id,
    types::{EngagementState, Post, PostDeletion},
    versioned::{commit_post_change, versioned_transaction},
};

#[derive(Debug, Clone)]
pub struct PostService {
    settings: EngagementSettings,
}

impl PostService {
    pub fn new(config: &SocialConfig) -> Self {
        Self {
            settings: config.engagement.clone(),
        }
    }

    /// Creates an empty post at version 1.
    pub async fn create_post<G>(&self, gateway: &mut G, username: &str, message: &str) -> Result<Post, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("username", username)?;
        let message = self.settings.checked_text("message", Some(message))?;
        let post = Post {
            id: generate_entity_id(),
            username: username.to_string(),
            message,
            created_at: Utc::now(),
            version: 1,
            engagement: EngagementState::default(),
            comments: Vec::new(),
            orphaned_rows: Vec::new(),
        };

        let mut tx = Transaction::begin("create_post");
        tx.push(WriteOp::PutPost(post.clone()));
        gateway.commit(tx).await?;
        log::info!("{username} created post {}", post.id);
        Ok(post)
    }

    pub async fn get_post<G>(&self, gateway: &mut G, post_id: &str) -> Result<Post, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("post_id", post_id)?;
        gateway
            .post(post_id)
            .await?
            .ok_or_else(|| SocialError::not_found(Resource::Post, post_id))
    }

    /// Removes the post with every comment row, heart ledger and reaction set.
    pub async fn delete_post<G>(&self, gateway: &mut G, post_id: &str, actor: &str) -> Result<PostDeletion, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("post_id", post_id)?;
        require_name("username", actor)?;

        let deletion = commit_post_change(gateway, post_id, self.settings.attempts(), |current| {
            if current.username != actor {
                return Err(SocialError::forbidden(format!(
                    "{actor} cannot delete post {post_id} written by {}",
                    current.username
                )));
            }
            let rows: Vec<String> = current.rows().map(|row| row.id.clone()).collect();
            let deletion = PostDeletion {
                post_id: post_id.to_string(),
                deleted_comment_rows: rows.len() + current.orphaned_rows.len(),
            };

            let mut tx = versioned_transaction("delete_post", current);
            tx.push(WriteOp::DeleteHearts {
                comment_ids: rows.clone(),
            })
            .push(WriteOp::DeleteComments {
                post_id: post_id.to_string(),
                comment_ids: rows,
            })
            .push(WriteOp::DeletePost {
                post_id: post_id.to_string(),
            });
            Ok((tx, deletion))
        })
        .await?;

        log::info!(
            "{actor} deleted post {post_id} and {} comment rows",
            deletion.deleted_comment_rows
        );
        Ok(deletion)
    }
}
