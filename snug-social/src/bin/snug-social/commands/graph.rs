use clap::{Subcommand, ValueEnum};
use snug_social::{RelationList, SocialAction};

use crate::examples::ExampleGroup;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Follows",
        commands: &[
            "snug-social graph follow alice bob        # alice starts following bob",
            "snug-social graph unfollow alice bob      # remove alice -> bob in any status",
        ],
    },
    ExampleGroup {
        title: "Friendships",
        commands: &[
            "snug-social graph friend alice bob        # request, or accept bob's pending request",
            "snug-social graph unfriend alice bob      # delete both directions",
            "snug-social graph status alice bob        # how alice relates to bob",
        ],
    },
    ExampleGroup {
        title: "Queries",
        commands: &[
            "snug-social graph counts bob --refresh    # recompute and cache counts",
            "snug-social graph list bob followers      # sorted usernames",
        ],
    },
];

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Follow another user
    Follow { follower: String, following: String },

    /// Remove the edge from follower to following, whatever its status
    Unfollow { follower: String, following: String },

    /// Send a friend request, or accept the one already received
    Friend { requester: String, recipient: String },

    /// Remove both directions of a friendship or request
    Unfriend { requester: String, recipient: String },

    /// Show how one user relates to another
    Status { username: String, other: String },

    /// Follower, following and friend counts
    Counts {
        username: String,

        /// Store the recomputed counts as the cached snapshot
        #[arg(long, conflicts_with = "cached")]
        refresh: bool,

        /// Read the cached snapshot instead of recomputing
        #[arg(long)]
        cached: bool,
    },

    /// List usernames related to a user
    List { username: String, relation: RelationArg },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RelationArg {
    Followers,
    Following,
    Friends,
    IncomingRequests,
    OutgoingRequests,
}

impl From<RelationArg> for RelationList {
    fn from(value: RelationArg) -> Self {
        match value {
            RelationArg::Followers => RelationList::Followers,
            RelationArg::Following => RelationList::Following,
            RelationArg::Friends => RelationList::Friends,
            RelationArg::IncomingRequests => RelationList::IncomingRequests,
            RelationArg::OutgoingRequests => RelationList::OutgoingRequests,
        }
    }
}

pub fn to_action(command: GraphCommands) -> SocialAction {
    match command {
        GraphCommands::Follow { follower, following } => SocialAction::Follow { follower, following },
        GraphCommands::Unfollow { follower, following } => SocialAction::Unfollow { follower, following },
        GraphCommands::Friend { requester, recipient } => SocialAction::RequestOrAcceptFriend { requester, recipient },
        GraphCommands::Unfriend { requester, recipient } => SocialAction::RemoveFriendship { requester, recipient },
        GraphCommands::Status { username, other } => SocialAction::RelationshipStatus { username, other },
        GraphCommands::Counts {
            username,
            refresh: true,
            ..
        } => SocialAction::RefreshCounts { username },
        GraphCommands::Counts {
            username, cached: true, ..
        } => SocialAction::CachedCounts { username },
        GraphCommands::Counts { username, .. } => SocialAction::Counts { username },
        GraphCommands::List { username, relation } => SocialAction::List {
            username,
            list: relation.into(),
        },
    }
}
