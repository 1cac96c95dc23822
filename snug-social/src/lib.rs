//! snug-social core library.
//!
//! Follow and friend edges, post engagement (reactions, comments, replies,
//! hearts) and owner-only cascading deletion over a transactional
//! persistence gateway backed by Redis or memory.

pub mod client;
pub mod config;
pub mod deletion;
pub mod engagement;
pub mod errors;
pub mod gateway;
pub mod graph;
pub mod id;
pub mod keys;
pub mod posts;
pub mod queries;
pub mod types;
mod versioned;

pub use client::{SocialAction, SocialClient, SocialResponse};
pub use config::{EngagementSettings, RedisSettings, SocialConfig};
pub use deletion::CascadingDeletion;
pub use engagement::{ActionPayload, AppliedAction, EngagementAction, EngagementEngine};
pub use errors::{ErrorKind, Resource, SocialError};
pub use gateway::{Guard, MemoryGateway, PersistenceGateway, RedisGateway, Transaction, WriteOp};
pub use graph::RelationshipGraph;
pub use posts::PostService;
pub use queries::{RelationList, RelationshipQueries};
pub use types::{
    Comment, CommentThread, DeletedType, DeletionReceipt, Edge, EdgeStatus, EngagementState, FriendRequestOutcome,
    FriendshipStatus, Post, PostDeletion, RelationshipCounts, RelationshipView,
};

pub use redis;
