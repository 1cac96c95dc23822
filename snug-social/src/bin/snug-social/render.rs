use comfy_table::{Cell, Table};
use snug_social::{
    AppliedAction, DeletedType, DeletionReceipt, FriendRequestOutcome, FriendshipStatus, Post, RelationshipCounts,
    SocialResponse,
};

use crate::output::{OutputManager, TableDisplay};
use crate::theme::ICONS;

impl TableDisplay for SocialResponse {
    fn to_table(&self, output: &OutputManager) -> Table {
        match self {
            SocialResponse::Edge(edge) => {
                let mut table = output.create_table();
                output.add_table_header(&mut table, &["Follower", "Following", "Status"]);
                table.add_row(vec![edge.follower.as_str(), edge.following.as_str(), edge.status.as_str()]);
                table
            }
            SocialResponse::Unfollowed { removed } => {
                single_row(output, "Removed", if *removed { "yes" } else { "no edge" })
            }
            SocialResponse::Friendship(outcome) => single_row(output, "Friendship", outcome_label(*outcome)),
            SocialResponse::FriendshipRemoved => single_row(output, "Friendship", "removed"),
            SocialResponse::Relationship(view) => {
                let mut table = output.create_table();
                output.add_table_header(&mut table, &["Following", "Friendship"]);
                table.add_row(vec![
                    view.is_following.to_string(),
                    friendship_label(view.friendship_status).to_string(),
                ]);
                table
            }
            SocialResponse::Applied(applied) => applied_table(output, applied),
            SocialResponse::Deleted(receipt) => receipt_table(output, receipt),
            SocialResponse::Counts(counts) => counts_table(output, counts),
            SocialResponse::CachedCounts(Some(counts)) => counts_table(output, counts),
            SocialResponse::CachedCounts(None) => single_row(output, "Cached counts", "none"),
            SocialResponse::Usernames(names) => {
                let mut table = output.create_table();
                output.add_table_header(&mut table, &["#", "Username"]);
                if names.is_empty() {
                    table.add_row(vec![Cell::new("-"), Cell::new("No users found")]);
                }
                for (index, name) in names.iter().enumerate() {
                    table.add_row(vec![Cell::new(index + 1), Cell::new(name)]);
                }
                table
            }
            SocialResponse::Post(post) => post_table(output, post),
            SocialResponse::PostDeleted(deletion) => {
                let mut table = output.create_table();
                output.add_table_header(&mut table, &["Post", "Comment rows removed"]);
                table.add_row(vec![Cell::new(&deletion.post_id), Cell::new(deletion.deleted_comment_rows)]);
                table
            }
        }
    }

    fn to_compact(&self) -> String {
        match self {
            SocialResponse::Edge(edge) => format!(
                "{} {} {} ({})",
                edge.follower,
                ICONS.arrow,
                edge.following,
                edge.status.as_str()
            ),
            SocialResponse::Unfollowed { removed } => format!("removed={removed}"),
            SocialResponse::Friendship(outcome) => outcome_label(*outcome).to_string(),
            SocialResponse::FriendshipRemoved => "removed".to_string(),
            SocialResponse::Relationship(view) => format!(
                "following={} friendship={}",
                view.is_following,
                friendship_label(view.friendship_status)
            ),
            SocialResponse::Applied(applied) => {
                let mut line = format!(
                    "{} post={} v{} likes={} dislikes={}",
                    applied.action,
                    applied.post.id,
                    applied.post.version,
                    applied.post.engagement.likes,
                    applied.post.engagement.dislikes
                );
                if let Some(id) = &applied.created_id {
                    line.push_str(&format!(" created={id}"));
                }
                line
            }
            SocialResponse::Deleted(receipt) => format!(
                "deleted {} {} (+{} replies)",
                deleted_label(receipt),
                receipt.deleted_id,
                receipt.deleted_replies_count
            ),
            SocialResponse::Counts(counts) | SocialResponse::CachedCounts(Some(counts)) => compact_counts(counts),
            SocialResponse::CachedCounts(None) => "no cached counts".to_string(),
            SocialResponse::Usernames(names) => names.join(","),
            SocialResponse::Post(post) => format!(
                "{} by {} v{} likes={} dislikes={} comments={}",
                post.id,
                post.username,
                post.version,
                post.engagement.likes,
                post.engagement.dislikes,
                post.comments.len()
            ),
            SocialResponse::PostDeleted(deletion) => {
                format!("deleted post {} ({} comment rows)", deletion.post_id, deletion.deleted_comment_rows)
            }
        }
    }
}

fn single_row(output: &OutputManager, header: &str, value: &str) -> Table {
    let mut table = output.create_table();
    output.add_table_header(&mut table, &[header]);
    table.add_row(vec![value]);
    table
}

fn counts_table(output: &OutputManager, counts: &RelationshipCounts) -> Table {
    let mut table = output.create_table();
    output.add_table_header(&mut table, &["Followers", "Following", "Friends"]);
    table.add_row(vec![
        Cell::new(counts.followers_count),
        Cell::new(counts.following_count),
        Cell::new(counts.friends_count),
    ]);
    table
}

fn compact_counts(counts: &RelationshipCounts) -> String {
    format!(
        "followers={} following={} friends={}",
        counts.followers_count, counts.following_count, counts.friends_count
    )
}

fn receipt_table(output: &OutputManager, receipt: &DeletionReceipt) -> Table {
    let mut table = output.create_table();
    output.add_table_header(&mut table, &["Deleted", "Type", "Replies removed"]);
    table.add_row(vec![
        Cell::new(&receipt.deleted_id),
        Cell::new(deleted_label(receipt)),
        Cell::new(receipt.deleted_replies_count),
    ]);
    table
}

fn applied_table(output: &OutputManager, applied: &AppliedAction) -> Table {
    let mut table = post_table(output, &applied.post);
    if let Some(id) = &applied.created_id {
        table.add_row(vec![
            Cell::new("created"),
            Cell::new(id),
            Cell::new(applied.action.as_str()),
            Cell::new(""),
        ]);
    }
    table
}

/// Header row for the post, then one row per comment and reply
fn post_table(output: &OutputManager, post: &Post) -> Table {
    let mut table = output.create_table();
    output.add_table_header(&mut table, &["Id", "Author", "Text", ICONS.heart]);
    table.add_row(vec![
        Cell::new(format!("{} (v{})", post.id, post.version)),
        Cell::new(&post.username),
        Cell::new(&post.message),
        Cell::new(format!(
            "+{} / -{}",
            post.engagement.likes, post.engagement.dislikes
        )),
    ]);
    for thread in &post.comments {
        table.add_row(vec![
            Cell::new(format!("{} {}", ICONS.bullet, thread.comment.id)),
            Cell::new(&thread.comment.username),
            Cell::new(&thread.comment.text),
            Cell::new(thread.comment.heart_count),
        ]);
        for reply in &thread.replies {
            table.add_row(vec![
                Cell::new(format!("  {} {}", ICONS.reply, reply.id)),
                Cell::new(&reply.username),
                Cell::new(&reply.text),
                Cell::new(reply.heart_count),
            ]);
        }
    }
    table
}

fn outcome_label(outcome: FriendRequestOutcome) -> &'static str {
    match outcome {
        FriendRequestOutcome::Requested => "request sent",
        FriendRequestOutcome::Accepted => "accepted",
    }
}

fn friendship_label(status: FriendshipStatus) -> &'static str {
    match status {
        FriendshipStatus::None => "none",
        FriendshipStatus::PendingSent => "pending (sent)",
        FriendshipStatus::PendingReceived => "pending (received)",
        FriendshipStatus::Friends => "friends",
    }
}

fn deleted_label(receipt: &DeletionReceipt) -> &'static str {
    match receipt.deleted_type {
        DeletedType::Comment => "comment",
        DeletedType::Reply => "reply",
    }
}
