use anyhow::Result;
use clap::Subcommand;
use snug_social::{ActionPayload, EngagementAction, SocialAction};

use crate::examples::ExampleGroup;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Posts",
        commands: &[
            "snug-social post create alice \"first post\"    # prints the new post id",
            "snug-social post show <post-id>",
            "snug-social post delete <post-id> --actor alice",
        ],
    },
    ExampleGroup {
        title: "Engagement",
        commands: &[
            "snug-social post engage <post-id> like --actor bob",
            "snug-social post engage <post-id> comment --actor alice --text hi --comment-id c1",
            "snug-social post engage <post-id> reply --actor bob --comment-id c1 --text hey",
            "snug-social post engage <post-id> heart_reply --actor alice --comment-id c1 --reply-id <id>",
        ],
    },
    ExampleGroup {
        title: "Deletion",
        commands: &[
            "snug-social post delete-comment <post-id> c1 --actor alice    # removes its replies too",
            "snug-social post delete-reply <post-id> c1 <reply-id> --actor bob",
        ],
    },
];

#[derive(Subcommand)]
pub enum PostCommands {
    /// Create a post
    Create { username: String, message: String },

    /// Show a post with its comments
    Show { post_id: String },

    /// Delete a post and everything attached to it
    Delete {
        post_id: String,
        #[arg(long)]
        actor: String,
    },

    /// Apply like, dislike, heart_comment, heart_reply, comment or reply
    Engage {
        post_id: String,
        action: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        comment_id: Option<String>,
        #[arg(long)]
        reply_id: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },

    /// Delete a comment and its replies (author only)
    DeleteComment {
        post_id: String,
        comment_id: String,
        #[arg(long)]
        actor: String,
    },

    /// Delete a single reply (author only)
    DeleteReply {
        post_id: String,
        comment_id: String,
        reply_id: String,
        #[arg(long)]
        actor: String,
    },
}

pub fn to_action(command: PostCommands) -> Result<SocialAction> {
    let action = match command {
        PostCommands::Create { username, message } => SocialAction::CreatePost { username, message },
        PostCommands::Show { post_id } => SocialAction::GetPost { post_id },
        PostCommands::Delete { post_id, actor } => SocialAction::DeletePost { post_id, actor },
        PostCommands::Engage {
            post_id,
            action,
            actor,
            comment_id,
            reply_id,
            text,
        } => SocialAction::ApplyAction {
            post_id,
            action: action.parse::<EngagementAction>()?,
            actor,
            payload: ActionPayload {
                comment_id,
                reply_id,
                text,
            },
        },
        PostCommands::DeleteComment {
            post_id,
            comment_id,
            actor,
        } => SocialAction::DeleteComment {
            post_id,
            comment_id,
            actor,
        },
        PostCommands::DeleteReply {
            post_id,
            comment_id,
            reply_id,
            actor,
        } => SocialAction::DeleteReply {
            post_id,
            comment_id,
            reply_id,
            actor,
        },
    };
    Ok(action)
}
