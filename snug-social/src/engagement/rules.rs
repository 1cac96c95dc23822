//! Pure state transitions for a single engagement action.
//!
//! Nothing here touches storage: the engine hands in a cloned snapshot and
//! persists it only when these rules return `Ok`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{
    config::EngagementSettings,
    engagement::{ActionPayload, EngagementAction},
    errors::{Resource, SocialError},
    id::{comment_id_or_generate, generate_entity_id},
    types::{Comment, CommentThread, EngagementState, Post},
};

/// Applies `action` to `post` in place. Returns the id of a created
/// comment or reply.
pub(crate) fn apply(
    post: &mut Post,
    action: EngagementAction,
    actor: &str,
    payload: &ActionPayload,
    now: DateTime<Utc>,
    settings: &EngagementSettings,
) -> Result<Option<String>, SocialError> {
    match action {
        EngagementAction::Like => {
            toggle_like(&mut post.engagement, actor);
            Ok(None)
        }
        EngagementAction::Dislike => {
            toggle_dislike(&mut post.engagement, actor);
            Ok(None)
        }
        EngagementAction::HeartComment => {
            let comment_id = required(payload.comment_id.as_deref(), "comment_id")?;
            let thread = post
                .thread_mut(comment_id)
                .ok_or_else(|| SocialError::not_found(Resource::Comment, comment_id))?;
            toggle_heart(&mut thread.comment, actor);
            Ok(None)
        }
        EngagementAction::HeartReply => {
            let comment_id = required(payload.comment_id.as_deref(), "comment_id")?;
            let reply_id = required(payload.reply_id.as_deref(), "reply_id")?;
            let thread = post
                .thread_mut(comment_id)
                .ok_or_else(|| SocialError::not_found(Resource::Comment, comment_id))?;
            let reply = thread
                .reply_mut(reply_id)
                .ok_or_else(|| SocialError::not_found(Resource::Reply, reply_id))?;
            toggle_heart(reply, actor);
            Ok(None)
        }
        EngagementAction::Reply => {
            let text = settings.checked_text("reply text", payload.text.as_deref())?;
            let comment_id = required(payload.comment_id.as_deref(), "comment_id")?;
            let reply_id = unused_id(post);
            let post_id = post.id.clone();
            let thread = post
                .thread_mut(comment_id)
                .ok_or_else(|| SocialError::not_found(Resource::Comment, comment_id))?;
            thread.replies.push(Comment {
                id: reply_id.clone(),
                post_id,
                parent_id: Some(comment_id.to_string()),
                username: actor.to_string(),
                text,
                created_at: now,
                heart_count: 0,
                hearted_by: BTreeSet::new(),
            });
            Ok(Some(reply_id))
        }
        EngagementAction::Comment => {
            let text = settings.checked_text("comment text", payload.text.as_deref())?;
            let comment_id = comment_id_or_generate(payload.comment_id.as_deref())?;
            if post.contains_comment_id(&comment_id) {
                return Err(SocialError::conflict(format!(
                    "comment id {comment_id} already exists on post {}",
                    post.id
                )));
            }
            post.comments.push(CommentThread {
                comment: Comment {
                    id: comment_id.clone(),
                    post_id: post.id.clone(),
                    parent_id: None,
                    username: actor.to_string(),
                    text,
                    created_at: now,
                    heart_count: 0,
                    hearted_by: BTreeSet::new(),
                },
                replies: Vec::new(),
            });
            Ok(Some(comment_id))
        }
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, SocialError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SocialError::invalid(format!("{field} is required")))
}

fn unused_id(post: &Post) -> String {
    loop {
        let candidate = generate_entity_id();
        if !post.contains_comment_id(&candidate) {
            return candidate;
        }
    }
}

/// Likes clear a dislike first, then flip the like.
pub(crate) fn toggle_like(state: &mut EngagementState, actor: &str) {
    let EngagementState {
        likes,
        dislikes,
        liked_by,
        disliked_by,
    } = state;
    toggle_exclusive(actor, (liked_by, likes), (disliked_by, dislikes));
}

pub(crate) fn toggle_dislike(state: &mut EngagementState, actor: &str) {
    let EngagementState {
        likes,
        dislikes,
        liked_by,
        disliked_by,
    } = state;
    toggle_exclusive(actor, (disliked_by, dislikes), (liked_by, likes));
}

fn toggle_exclusive(
    actor: &str,
    (own, own_count): (&mut BTreeSet<String>, &mut u64),
    (opposite, opposite_count): (&mut BTreeSet<String>, &mut u64),
) {
    if opposite.remove(actor) {
        *opposite_count = opposite_count.saturating_sub(1);
    }
    if own.remove(actor) {
        *own_count = own_count.saturating_sub(1);
    } else {
        own.insert(actor.to_string());
        *own_count += 1;
    }
}

pub(crate) fn toggle_heart(comment: &mut Comment, actor: &str) {
    if comment.hearted_by.remove(actor) {
        comment.heart_count = comment.heart_count.saturating_sub(1);
    } else {
        comment.hearted_by.insert(actor.to_string());
        comment.heart_count += 1;
    }
}
