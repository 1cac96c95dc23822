use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::{
    errors::{Resource, SocialError},
    gateway::{Guard, PersistenceGateway, Transaction, WriteOp, log_commit_outcome},
    types::{Comment, Edge, EdgeStatus, EngagementState, Post, RelationshipCounts},
};

/// In-process store with the same row layout and commit semantics as Redis.
///
/// Clones share one store, so each concurrent task can hold its own handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    shared: Arc<Mutex<MemoryState>>,
    yield_before_commit: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    edges: BTreeMap<(String, String), EdgeStatus>,
    posts: BTreeMap<String, PostRow>,
    comments: BTreeMap<String, CommentRow>,
    post_comments: BTreeMap<String, Vec<String>>,
    hearts: BTreeMap<String, BTreeSet<String>>,
    counts: BTreeMap<String, RelationshipCounts>,
    fail_next_commit: Option<String>,
}

#[derive(Debug, Clone)]
struct PostRow {
    username: String,
    message: String,
    created_at: DateTime<Utc>,
    version: u64,
    likes: u64,
    dislikes: u64,
    liked_by: BTreeSet<String>,
    disliked_by: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    post_id: String,
    parent_id: Option<String>,
    username: String,
    text: String,
    created_at: DateTime<Utc>,
    heart_count: u64,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields to the scheduler between reading and committing, so tasks
    /// joined on one thread interleave the way remote clients would.
    pub fn with_commit_yield(mut self) -> Self {
        self.yield_before_commit = true;
        self
    }

    /// Makes the next commit fail with a storage error before any write.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.lock().fail_next_commit = Some(message.into());
    }

    /// Every stored edge, ordered by `(follower, following)`.
    pub fn edges(&self) -> Vec<Edge> {
        self.lock()
            .edges
            .iter()
            .map(|((follower, following), status)| Edge::new(follower.clone(), following.clone(), *status))
            .collect()
    }

    pub fn comment_row_exists(&self, comment_id: &str) -> bool {
        self.lock().comments.contains_key(comment_id)
    }

    /// Number of heart ledger rows (one per comment and username).
    pub fn heart_rows(&self, comment_id: &str) -> usize {
        self.lock().hearts.get(comment_id).map_or(0, BTreeSet::len)
    }

    pub fn total_comment_rows(&self) -> usize {
        self.lock().comments.len()
    }

    pub fn total_heart_rows(&self) -> usize {
        self.lock().hearts.values().map(BTreeSet::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn edges_where(&self, keep: impl Fn(&str, &str) -> bool) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|((follower, following), _)| keep(follower, following))
            .map(|((follower, following), status)| Edge::new(follower.clone(), following.clone(), *status))
            .collect()
    }

    fn load_post(&self, post_id: &str) -> Option<Post> {
        let row = self.posts.get(post_id)?;
        let rows = self
            .post_comments
            .get(post_id)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                let comment = self.comments.get(id)?;
                Some(Comment {
                    id: id.clone(),
                    post_id: comment.post_id.clone(),
                    parent_id: comment.parent_id.clone(),
                    username: comment.username.clone(),
                    text: comment.text.clone(),
                    created_at: comment.created_at,
                    heart_count: comment.heart_count,
                    hearted_by: self.hearts.get(id).cloned().unwrap_or_default(),
                })
            })
            .collect();
        let (comments, orphaned_rows) = Post::assemble_threads(rows);
        Some(Post {
            id: post_id.to_string(),
            username: row.username.clone(),
            message: row.message.clone(),
            created_at: row.created_at,
            version: row.version,
            engagement: EngagementState {
                likes: row.likes,
                dislikes: row.dislikes,
                liked_by: row.liked_by.clone(),
                disliked_by: row.disliked_by.clone(),
            },
            comments,
            orphaned_rows,
        })
    }

    fn check(&self, guard: &Guard) -> Result<(), SocialError> {
        match guard {
            Guard::EdgeAbsent { follower, following } => {
                if self.edges.contains_key(&(follower.clone(), following.clone())) {
                    return Err(SocialError::conflict(format!("edge {follower} -> {following} already exists")));
                }
            }
            Guard::EdgeStatus {
                follower,
                following,
                status,
            } => {
                let current = self.edges.get(&(follower.clone(), following.clone()));
                if current != Some(status) {
                    return Err(SocialError::StaleWrite {
                        resource: Resource::Edge,
                        id: format!("{follower}->{following}"),
                        expected: None,
                        actual: None,
                    });
                }
            }
            Guard::PostVersion { post_id, expected } => {
                let actual = self.posts.get(post_id).map(|row| row.version);
                if actual != Some(*expected) {
                    return Err(SocialError::StaleWrite {
                        resource: Resource::Post,
                        id: post_id.clone(),
                        expected: Some(*expected),
                        actual,
                    });
                }
            }
            Guard::CommentAbsent { comment_id } => {
                if self.comments.contains_key(comment_id) {
                    return Err(SocialError::conflict(format!("comment id {comment_id} is already taken")));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::PutEdge(edge) => {
                self.edges.insert((edge.follower, edge.following), edge.status);
            }
            WriteOp::DeleteEdge { follower, following } => {
                self.edges.remove(&(follower, following));
            }
            WriteOp::PutPost(post) => self.put_post(post),
            WriteOp::DeleteHearts { comment_ids } => {
                for id in comment_ids {
                    self.hearts.remove(&id);
                }
            }
            WriteOp::DeleteComments { post_id, comment_ids } => {
                if let Some(order) = self.post_comments.get_mut(&post_id) {
                    order.retain(|id| !comment_ids.contains(id));
                }
                for id in comment_ids {
                    self.comments.remove(&id);
                }
            }
            WriteOp::DeletePost { post_id } => {
                self.posts.remove(&post_id);
                self.post_comments.remove(&post_id);
            }
            WriteOp::PutCounts { username, counts } => {
                self.counts.insert(username, counts);
            }
        }
    }

    fn put_post(&mut self, post: Post) {
        let order: Vec<String> = post.rows().map(|row| row.id.clone()).collect();
        for row in post.rows() {
            self.comments.insert(
                row.id.clone(),
                CommentRow {
                    post_id: row.post_id.clone(),
                    parent_id: row.parent_id.clone(),
                    username: row.username.clone(),
                    text: row.text.clone(),
                    created_at: row.created_at,
                    heart_count: row.heart_count,
                },
            );
            if row.hearted_by.is_empty() {
                self.hearts.remove(&row.id);
            } else {
                self.hearts.insert(row.id.clone(), row.hearted_by.clone());
            }
        }
        self.post_comments.insert(post.id.clone(), order);
        self.posts.insert(
            post.id,
            PostRow {
                username: post.username,
                message: post.message,
                created_at: post.created_at,
                version: post.version,
                likes: post.engagement.likes,
                dislikes: post.engagement.dislikes,
                liked_by: post.engagement.liked_by,
                disliked_by: post.engagement.disliked_by,
            },
        );
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn edge(&mut self, follower: &str, following: &str) -> Result<Option<Edge>, SocialError> {
        let state = self.lock();
        Ok(state
            .edges
            .get(&(follower.to_string(), following.to_string()))
            .map(|status| Edge::new(follower, following, *status)))
    }

    async fn outgoing_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError> {
        Ok(self.lock().edges_where(|follower, _| follower == username))
    }

    async fn incoming_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError> {
        Ok(self.lock().edges_where(|_, following| following == username))
    }

    async fn post(&mut self, post_id: &str) -> Result<Option<Post>, SocialError> {
        Ok(self.lock().load_post(post_id))
    }

    async fn cached_counts(&mut self, username: &str) -> Result<Option<RelationshipCounts>, SocialError> {
        Ok(self.lock().counts.get(username).copied())
    }

    async fn commit(&mut self, tx: Transaction) -> Result<(), SocialError> {
        if self.yield_before_commit {
            tokio::task::yield_now().await;
        }
        let label = tx.label();
        let (guards, ops) = tx.into_parts();
        let mut state = self.lock();
        let injected = state.fail_next_commit.take();
        let result = match injected {
            Some(message) => Err(SocialError::storage(message)),
            None => guards.iter().try_for_each(|guard| state.check(guard)),
        };
        if result.is_ok() {
            for op in ops {
                state.apply(op);
            }
        }
        log_commit_outcome(label, &result);
        result
    }
}
