//! Engagement mutations on a post: reactions, hearts, comments and replies.
//!
//! Each action reads the post snapshot, applies [`rules`] to a copy and
//! commits the copy behind a version guard. The stored post is never
//! touched when a rule fails.

mod rules;

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    config::{EngagementSettings, SocialConfig},
    errors::{SocialError, require_name},
    gateway::{Guard, PersistenceGateway, WriteOp},
    types::Post,
    versioned::{commit_post_change, versioned_transaction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementAction {
    Like,
    Dislike,
    HeartComment,
    HeartReply,
    Comment,
    Reply,
}

impl EngagementAction {
    pub const ALL: [EngagementAction; 6] = [
        EngagementAction::Like,
        EngagementAction::Dislike,
        EngagementAction::HeartComment,
        EngagementAction::HeartReply,
        EngagementAction::Comment,
        EngagementAction::Reply,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementAction::Like => "like",
            EngagementAction::Dislike => "dislike",
            EngagementAction::HeartComment => "heart_comment",
            EngagementAction::HeartReply => "heart_reply",
            EngagementAction::Comment => "comment",
            EngagementAction::Reply => "reply",
        }
    }
}

impl FromStr for EngagementAction {
    type Err = SocialError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| SocialError::invalid(format!("unknown engagement action: {value}")))
    }
}

impl std::fmt::Display for EngagementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional inputs; which fields matter depends on the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ActionPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_comment_id(mut self, comment_id: impl Into<String>) -> Self {
        self.comment_id = Some(comment_id.into());
        self
    }

    pub fn with_reply_id(mut self, reply_id: impl Into<String>) -> Self {
        self.reply_id = Some(reply_id.into());
        self
    }
}

/// Outcome of a committed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub action: EngagementAction,
    /// Post as committed, at its new version.
    pub post: Post,
    /// Id of the comment or reply the action created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EngagementEngine {
    settings: EngagementSettings,
}

impl EngagementEngine {
    pub fn new(config: &SocialConfig) -> Self {
        Self {
            settings: config.engagement.clone(),
        }
    }

    /// Applies one engagement action by `actor` to post `post_id`.
    pub async fn apply_action<G>(
        &self,
        gateway: &mut G,
        post_id: &str,
        action: EngagementAction,
        actor: &str,
        payload: &ActionPayload,
    ) -> Result<AppliedAction, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("post_id", post_id)?;
        require_name("username", actor)?;

        let applied = commit_post_change(gateway, post_id, self.settings.attempts(), |current| {
            let mut next = current.next_revision();
            let created_id = rules::apply(&mut next, action, actor, payload, Utc::now(), &self.settings)?;

            let mut tx = versioned_transaction(action.as_str(), current);
            if let Some(id) = &created_id {
                tx.guard(Guard::CommentAbsent { comment_id: id.clone() });
            }
            tx.push(WriteOp::PutPost(next.clone()));
            Ok((
                tx,
                AppliedAction {
                    action,
                    post: next,
                    created_id,
                },
            ))
        })
        .await?;

        log::info!(
            "{actor} applied {action} to post {post_id} (version {})",
            applied.post.version
        );
        Ok(applied)
    }

    /// Same as [`apply_action`](Self::apply_action) with the action given by name.
    pub async fn apply_named<G>(
        &self,
        gateway: &mut G,
        post_id: &str,
        action: &str,
        actor: &str,
        payload: &ActionPayload,
    ) -> Result<AppliedAction, SocialError>
    where
        G: PersistenceGateway,
    {
        let action = action.parse::<EngagementAction>()?;
        self.apply_action(gateway, post_id, action, actor, payload).await
    }
}
