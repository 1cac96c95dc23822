//! Client facade owning a gateway and the services built from one config.
//!
//! ```ignore
//! let mut client = SocialClient::connect(SocialConfig::default()).await?;
//! client.follow("alice", "bob").await?;
//! let counts = client.counts("bob").await?;
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    config::SocialConfig,
    deletion::CascadingDeletion,
    engagement::{ActionPayload, AppliedAction, EngagementAction, EngagementEngine},
    errors::SocialError,
    gateway::{MemoryGateway, PersistenceGateway, RedisGateway},
    graph::RelationshipGraph,
    posts::PostService,
    queries::{RelationList, RelationshipQueries},
    types::{DeletionReceipt, Edge, FriendRequestOutcome, Post, PostDeletion, RelationshipCounts, RelationshipView},
};

/// One request against the social core, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SocialAction {
    Follow {
        follower: String,
        following: String,
    },
    Unfollow {
        follower: String,
        following: String,
    },
    RequestOrAcceptFriend {
        requester: String,
        recipient: String,
    },
    RemoveFriendship {
        requester: String,
        recipient: String,
    },
    RelationshipStatus {
        username: String,
        other: String,
    },
    ApplyAction {
        post_id: String,
        action: EngagementAction,
        actor: String,
        #[serde(default)]
        payload: ActionPayload,
    },
    DeleteComment {
        post_id: String,
        comment_id: String,
        actor: String,
    },
    DeleteReply {
        post_id: String,
        comment_id: String,
        reply_id: String,
        actor: String,
    },
    Counts {
        username: String,
    },
    RefreshCounts {
        username: String,
    },
    CachedCounts {
        username: String,
    },
    List {
        username: String,
        list: RelationList,
    },
    CreatePost {
        username: String,
        message: String,
    },
    GetPost {
        post_id: String,
    },
    DeletePost {
        post_id: String,
        actor: String,
    },
}

/// Structured result of a [`SocialAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SocialResponse {
    Edge(Edge),
    Unfollowed { removed: bool },
    Friendship(FriendRequestOutcome),
    FriendshipRemoved,
    Relationship(RelationshipView),
    Applied(AppliedAction),
    Deleted(DeletionReceipt),
    Counts(RelationshipCounts),
    CachedCounts(Option<RelationshipCounts>),
    Usernames(Vec<String>),
    Post(Post),
    PostDeleted(PostDeletion),
}

pub struct SocialClient<G> {
    gateway: G,
    config: SocialConfig,
    graph: RelationshipGraph,
    engine: EngagementEngine,
    deletion: CascadingDeletion,
    queries: RelationshipQueries,
    posts: PostService,
}

impl SocialClient<RedisGateway> {
    /// Connects to the Redis server named by `config.redis`.
    pub async fn connect(config: SocialConfig) -> Result<Self, SocialError> {
        let gateway = RedisGateway::connect(&config.redis).await?;
        Ok(Self::new(gateway, config))
    }
}

impl SocialClient<MemoryGateway> {
    pub fn in_memory(config: SocialConfig) -> Self {
        Self::new(MemoryGateway::new(), config)
    }
}

impl<G: PersistenceGateway> SocialClient<G> {
    pub fn new(gateway: G, config: SocialConfig) -> Self {
        Self {
            graph: RelationshipGraph::new(&config),
            engine: EngagementEngine::new(&config),
            deletion: CascadingDeletion::new(&config),
            queries: RelationshipQueries::new(),
            posts: PostService::new(&config),
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &SocialConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub async fn follow(&mut self, follower: &str, following: &str) -> Result<Edge, SocialError> {
        self.graph.follow(&mut self.gateway, follower, following).await
    }

    pub async fn unfollow(&mut self, follower: &str, following: &str) -> Result<bool, SocialError> {
        self.graph.unfollow(&mut self.gateway, follower, following).await
    }

    pub async fn request_or_accept_friend(
        &mut self,
        requester: &str,
        recipient: &str,
    ) -> Result<FriendRequestOutcome, SocialError> {
        self.graph
            .request_or_accept_friend(&mut self.gateway, requester, recipient)
            .await
    }

    pub async fn remove_friendship(&mut self, requester: &str, recipient: &str) -> Result<(), SocialError> {
        self.graph.remove_friendship(&mut self.gateway, requester, recipient).await
    }

    pub async fn relationship_status(&mut self, username: &str, other: &str) -> Result<RelationshipView, SocialError> {
        self.graph.relationship_status(&mut self.gateway, username, other).await
    }

    pub async fn apply_action(
        &mut self,
        post_id: &str,
        action: EngagementAction,
        actor: &str,
        payload: &ActionPayload,
    ) -> Result<AppliedAction, SocialError> {
        self.engine
            .apply_action(&mut self.gateway, post_id, action, actor, payload)
            .await
    }

    pub async fn delete_comment(
        &mut self,
        post_id: &str,
        comment_id: &str,
        actor: &str,
    ) -> Result<DeletionReceipt, SocialError> {
        self.deletion
            .delete_comment(&mut self.gateway, post_id, comment_id, actor)
            .await
    }

    pub async fn delete_reply(
        &mut self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &str,
    ) -> Result<DeletionReceipt, SocialError> {
        self.deletion
            .delete_reply(&mut self.gateway, post_id, comment_id, reply_id, actor)
            .await
    }

    pub async fn counts(&mut self, username: &str) -> Result<RelationshipCounts, SocialError> {
        self.queries.counts(&mut self.gateway, username).await
    }

    pub async fn refresh_counts(&mut self, username: &str) -> Result<RelationshipCounts, SocialError> {
        self.queries.refresh_counts(&mut self.gateway, username).await
    }

    pub async fn cached_counts(&mut self, username: &str) -> Result<Option<RelationshipCounts>, SocialError> {
        self.queries.cached_counts(&mut self.gateway, username).await
    }

    pub async fn followers(&mut self, username: &str) -> Result<Vec<String>, SocialError> {
        self.queries.list(&mut self.gateway, username, RelationList::Followers).await
    }

    pub async fn following(&mut self, username: &str) -> Result<Vec<String>, SocialError> {
        self.queries.list(&mut self.gateway, username, RelationList::Following).await
    }

    pub async fn friends(&mut self, username: &str) -> Result<Vec<String>, SocialError> {
        self.queries.list(&mut self.gateway, username, RelationList::Friends).await
    }

    pub async fn incoming_requests(&mut self, username: &str) -> Result<Vec<String>, SocialError> {
        self.queries
            .list(&mut self.gateway, username, RelationList::IncomingRequests)
            .await
    }

    pub async fn outgoing_requests(&mut self, username: &str) -> Result<Vec<String>, SocialError> {
        self.queries
            .list(&mut self.gateway, username, RelationList::OutgoingRequests)
            .await
    }

    pub async fn create_post(&mut self, username: &str, message: &str) -> Result<Post, SocialError> {
        self.posts.create_post(&mut self.gateway, username, message).await
    }

    pub async fn get_post(&mut self, post_id: &str) -> Result<Post, SocialError> {
        self.posts.get_post(&mut self.gateway, post_id).await
    }

    pub async fn delete_post(&mut self, post_id: &str, actor: &str) -> Result<PostDeletion, SocialError> {
        self.posts.delete_post(&mut self.gateway, post_id, actor).await
    }

    /// Runs one tagged request and wraps its result.
    pub async fn dispatch(&mut self, action: SocialAction) -> Result<SocialResponse, SocialError> {
        let response = match action {
            SocialAction::Follow { follower, following } => SocialResponse::Edge(self.follow(&follower, &following).await?),
            SocialAction::Unfollow { follower, following } => SocialResponse::Unfollowed {
                removed: self.unfollow(&follower, &following).await?,
            },
            SocialAction::RequestOrAcceptFriend { requester, recipient } => {
                SocialResponse::Friendship(self.request_or_accept_friend(&requester, &recipient).await?)
            }
            SocialAction::RemoveFriendship { requester, recipient } => {
                self.remove_friendship(&requester, &recipient).await?;
                SocialResponse::FriendshipRemoved
            }
            SocialAction::RelationshipStatus { username, other } => {
                SocialResponse::Relationship(self.relationship_status(&username, &other).await?)
            }
            SocialAction::ApplyAction {
                post_id,
                action,
                actor,
                payload,
            } => SocialResponse::Applied(self.apply_action(&post_id, action, &actor, &payload).await?),
            SocialAction::DeleteComment {
                post_id,
                comment_id,
                actor,
            } => SocialResponse::Deleted(self.delete_comment(&post_id, &comment_id, &actor).await?),
            SocialAction::DeleteReply {
                post_id,
                comment_id,
                reply_id,
                actor,
            } => SocialResponse::Deleted(self.delete_reply(&post_id, &comment_id, &reply_id, &actor).await?),
            SocialAction::Counts { username } => SocialResponse::Counts(self.counts(&username).await?),
            SocialAction::RefreshCounts { username } => SocialResponse::Counts(self.refresh_counts(&username).await?),
            SocialAction::CachedCounts { username } => SocialResponse::CachedCounts(self.cached_counts(&username).await?),
            SocialAction::List { username, list } => {
                SocialResponse::Usernames(self.queries.list(&mut self.gateway, &username, list).await?)
            }
            SocialAction::CreatePost { username, message } => {
                SocialResponse::Post(self.create_post(&username, &message).await?)
            }
            SocialAction::GetPost { post_id } => SocialResponse::Post(self.get_post(&post_id).await?),
            SocialAction::DeletePost { post_id, actor } => {
                SocialResponse::PostDeleted(self.delete_post(&post_id, &actor).await?)
            }
        };
        Ok(response)
    }
}
