//! Persistence boundary.
//!
//! Services read through [`PersistenceGateway`] and write by committing a
//! [`Transaction`]: a buffer of [`Guard`]s that must all hold and
//! [`WriteOp`]s that are applied together. Gateways evaluate every guard
//! before the first write, so a failed commit leaves the store untouched.

pub mod memory;
pub mod redis_store;
pub mod scripts;

pub use self::memory::MemoryGateway;
pub use self::redis_store::RedisGateway;

use crate::{
    errors::SocialError,
    types::{Edge, EdgeStatus, Post, RelationshipCounts},
};

#[allow(async_fn_in_trait)]
pub trait PersistenceGateway {
    /// Directed edge `follower -> following`, if any.
    async fn edge(&mut self, follower: &str, following: &str) -> Result<Option<Edge>, SocialError>;

    /// Every edge whose follower is `username`.
    async fn outgoing_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError>;

    /// Every edge whose following side is `username`.
    async fn incoming_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError>;

    /// Full post snapshot including comment rows and heart ledgers.
    async fn post(&mut self, post_id: &str) -> Result<Option<Post>, SocialError>;

    /// Advisory counts snapshot last written by `refresh_counts`.
    async fn cached_counts(&mut self, username: &str) -> Result<Option<RelationshipCounts>, SocialError>;

    /// Atomically checks the guards and applies the writes of `tx`.
    async fn commit(&mut self, tx: Transaction) -> Result<(), SocialError>;
}

/// Precondition evaluated inside the store's atomic section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Fails with `Conflict` when the edge exists in any status.
    EdgeAbsent { follower: String, following: String },
    /// Fails with `StaleWrite` unless the edge exists with exactly `status`.
    EdgeStatus {
        follower: String,
        following: String,
        status: EdgeStatus,
    },
    /// Fails with `StaleWrite` unless the post exists at `expected`.
    PostVersion { post_id: String, expected: u64 },
    /// Fails with `Conflict` when any post already has a row with this id.
    CommentAbsent { comment_id: String },
}

/// Single write applied by a commit, in push order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Inserts or overwrites the edge for its ordered pair.
    PutEdge(Edge),
    DeleteEdge { follower: String, following: String },
    /// Writes the whole engagement snapshot: header, counters, reaction
    /// sets, comment rows and heart ledgers of every row in `post`.
    PutPost(Post),
    DeleteHearts { comment_ids: Vec<String> },
    DeleteComments { post_id: String, comment_ids: Vec<String> },
    /// Removes the post row, its reaction sets and its comment index.
    DeletePost { post_id: String },
    PutCounts { username: String, counts: RelationshipCounts },
}

/// Buffered unit of work between `begin` and `commit`/`rollback`.
///
/// Ending a transaction consumes it. Dropping one that was never committed
/// rolls it back.
#[derive(Debug)]
pub struct Transaction {
    label: &'static str,
    guards: Vec<Guard>,
    ops: Vec<WriteOp>,
    finished: bool,
}

impl Transaction {
    pub fn begin(label: &'static str) -> Self {
        log::debug!("begin transaction {label}");
        Self {
            label,
            guards: Vec::new(),
            ops: Vec::new(),
            finished: false,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn guard(&mut self, guard: Guard) -> &mut Self {
        self.guards.push(guard);
        self
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Discards every buffered write.
    pub fn rollback(mut self) {
        self.finished = true;
        log::debug!("rollback transaction {} ({} ops discarded)", self.label, self.ops.len());
    }

    /// Hands the buffered guards and writes to a gateway for execution.
    pub fn into_parts(mut self) -> (Vec<Guard>, Vec<WriteOp>) {
        self.finished = true;
        (std::mem::take(&mut self.guards), std::mem::take(&mut self.ops))
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!(
                "transaction {} dropped without commit; {} ops rolled back",
                self.label,
                self.ops.len()
            );
        }
    }
}

/// Logs the outcome of a commit; gateways call this once per transaction.
pub(crate) fn log_commit_outcome(label: &str, result: &Result<(), SocialError>) {
    match result {
        Ok(()) => log::debug!("commit transaction {label}"),
        Err(err) if err.is_stale() => log::debug!("transaction {label} lost a version race: {err}"),
        Err(err) => log::debug!("rollback transaction {label}: {err}"),
    }
}
