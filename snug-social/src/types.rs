use std::{collections::BTreeSet, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SocialError;

/// Status carried by a directed relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    /// Plain one-directional follow.
    None,
    /// Friend request waiting on the recipient.
    Pending,
    /// One half of a friendship; always mirrored by the reverse edge.
    Accepted,
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::None => "none",
            EdgeStatus::Pending => "pending",
            EdgeStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for EdgeStatus {
    type Err = SocialError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(EdgeStatus::None),
            "pending" => Ok(EdgeStatus::Pending),
            "accepted" => Ok(EdgeStatus::Accepted),
            other => Err(SocialError::storage(format!("unknown edge status '{other}'"))),
        }
    }
}

/// Directed, status-tagged relationship record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub follower: String,
    pub following: String,
    pub status: EdgeStatus,
}

impl Edge {
    pub fn new(follower: impl Into<String>, following: impl Into<String>, status: EdgeStatus) -> Self {
        Self {
            follower: follower.into(),
            following: following.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    None,
    PendingSent,
    PendingReceived,
    Friends,
}

/// Pairwise relationship as seen from the first user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipView {
    pub is_following: bool,
    pub friendship_status: FriendshipStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestOutcome {
    Requested,
    Accepted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCounts {
    pub followers_count: u64,
    pub following_count: u64,
    pub friends_count: u64,
}

/// Post-level reaction counters and the memberships behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementState {
    pub likes: u64,
    pub dislikes: u64,
    pub liked_by: BTreeSet<String>,
    pub disliked_by: BTreeSet<String>,
}

/// Comment or reply row. Replies carry the id of their parent comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub heart_count: u64,
    pub hearted_by: BTreeSet<String>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl CommentThread {
    pub fn reply(&self, reply_id: &str) -> Option<&Comment> {
        self.replies.iter().find(|reply| reply.id == reply_id)
    }

    pub fn reply_mut(&mut self, reply_id: &str) -> Option<&mut Comment> {
        self.replies.iter_mut().find(|reply| reply.id == reply_id)
    }
}

/// Full snapshot of a post: header, engagement and comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub username: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency column, bumped by every committed write.
    pub version: u64,
    pub engagement: EngagementState,
    pub comments: Vec<CommentThread>,
    /// Stored rows of this post that no thread can hold (replies whose
    /// parent is gone). The next versioned commit removes them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_rows: Vec<String>,
}

impl Post {
    pub fn thread(&self, comment_id: &str) -> Option<&CommentThread> {
        self.comments.iter().find(|thread| thread.comment.id == comment_id)
    }

    pub fn thread_mut(&mut self, comment_id: &str) -> Option<&mut CommentThread> {
        self.comments.iter_mut().find(|thread| thread.comment.id == comment_id)
    }

    /// True when any comment or reply of this post already uses `id`.
    pub fn contains_comment_id(&self, id: &str) -> bool {
        self.rows().any(|row| row.id == id)
    }

    /// Comment rows in storage order: each comment followed by its replies.
    pub fn rows(&self) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .flat_map(|thread| std::iter::once(&thread.comment).chain(thread.replies.iter()))
    }

    /// Copy to mutate and commit as the next version.
    pub fn next_revision(&self) -> Post {
        Post {
            version: self.version + 1,
            orphaned_rows: Vec::new(),
            ..self.clone()
        }
    }

    /// Rebuilds the comment tree from flat rows.
    ///
    /// Rows are kept in the given order. A reply whose parent is missing (or
    /// is itself a reply) cannot be addressed; its id is returned with the
    /// orphans instead.
    pub fn assemble_threads(rows: Vec<Comment>) -> (Vec<CommentThread>, Vec<String>) {
        let (top, replies): (Vec<Comment>, Vec<Comment>) = rows.into_iter().partition(|row| !row.is_reply());
        let mut threads: Vec<CommentThread> = top
            .into_iter()
            .map(|comment| CommentThread {
                comment,
                replies: Vec::new(),
            })
            .collect();
        let mut orphans = Vec::new();
        for reply in replies {
            let parent = reply.parent_id.as_deref().unwrap_or_default();
            match threads.iter_mut().find(|thread| thread.comment.id == parent) {
                Some(thread) => thread.replies.push(reply),
                None => {
                    log::warn!("orphaned reply {} (parent {parent} missing) will be removed", reply.id);
                    orphans.push(reply.id);
                }
            }
        }
        (threads, orphans)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedType {
    Comment,
    Reply,
}

/// Result of a cascading comment or reply deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReceipt {
    pub deleted_id: String,
    pub deleted_type: DeletedType,
    pub deleted_replies_count: usize,
}

/// Result of deleting a whole post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeletion {
    pub post_id: String,
    pub deleted_comment_rows: usize,
}
