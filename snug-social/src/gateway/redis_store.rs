use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap},
};

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde_json::{Value, json};

use crate::{
    config::RedisSettings,
    errors::{Resource, SocialError},
    gateway::{Guard, PersistenceGateway, Transaction, WriteOp, log_commit_outcome, scripts::COMMIT_SCRIPT},
    keys::KeyContext,
    types::{Comment, Edge, EngagementState, Post, RelationshipCounts},
};

/// Production gateway: Redis hashes and sets, one Lua script per commit.
#[derive(Clone)]
pub struct RedisGateway {
    conn: ConnectionManager,
    keys: KeyContext,
}

impl RedisGateway {
    pub fn new(conn: ConnectionManager, keys: KeyContext) -> Self {
        Self { conn, keys }
    }

    pub async fn connect(settings: &RedisSettings) -> Result<Self, SocialError> {
        let url = settings.resolved_url()?;
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        log::info!("connected to redis for namespace {}:{}", settings.prefix, settings.service);
        Ok(Self::new(conn, KeyContext::new(&settings.prefix, &settings.service)))
    }

    pub fn keys(&self) -> &KeyContext {
        &self.keys
    }

    async fn load_rows(&mut self, post_id: &str, ids: &[String]) -> Result<Vec<Comment>, SocialError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows_pipe = redis::pipe();
        let mut hearts_pipe = redis::pipe();
        for id in ids {
            rows_pipe.hgetall(self.keys.comment(id));
            hearts_pipe.smembers(self.keys.hearts(id));
        }
        let rows: Vec<HashMap<String, String>> = rows_pipe.query_async(&mut self.conn).await?;
        let hearts: Vec<BTreeSet<String>> = hearts_pipe.query_async(&mut self.conn).await?;

        let mut comments = Vec::with_capacity(ids.len());
        for ((id, row), hearted_by) in ids.iter().zip(rows).zip(hearts) {
            if row.is_empty() {
                log::warn!("comment index of post {post_id} lists missing row {id}");
                continue;
            }
            let key = self.keys.comment(id);
            comments.push(Comment {
                id: id.clone(),
                post_id: text_field(&row, "post_id", &key)?.to_string(),
                parent_id: row.get("parent_comment_id").filter(|value| !value.is_empty()).cloned(),
                username: text_field(&row, "username", &key)?.to_string(),
                text: text_field(&row, "text", &key)?.to_string(),
                created_at: timestamp_field(&row, "created_at", &key)?,
                heart_count: number_field(&row, "heart_count", &key)?,
                hearted_by,
            });
        }
        Ok(comments)
    }
}

impl PersistenceGateway for RedisGateway {
    async fn edge(&mut self, follower: &str, following: &str) -> Result<Option<Edge>, SocialError> {
        let status: Option<String> = self.conn.hget(self.keys.edges_out(follower), following).await?;
        match status {
            Some(status) => Ok(Some(Edge::new(follower, following, status.parse()?))),
            None => Ok(None),
        }
    }

    async fn outgoing_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError> {
        let entries: HashMap<String, String> = self.conn.hgetall(self.keys.edges_out(username)).await?;
        entries
            .into_iter()
            .map(|(following, status)| -> Result<Edge, SocialError> {
                Ok(Edge::new(username, following, status.parse()?))
            })
            .collect()
    }

    async fn incoming_edges(&mut self, username: &str) -> Result<Vec<Edge>, SocialError> {
        let entries: HashMap<String, String> = self.conn.hgetall(self.keys.edges_in(username)).await?;
        entries
            .into_iter()
            .map(|(follower, status)| -> Result<Edge, SocialError> {
                Ok(Edge::new(follower, username, status.parse()?))
            })
            .collect()
    }

    async fn post(&mut self, post_id: &str) -> Result<Option<Post>, SocialError> {
        let key = self.keys.post(post_id);
        let (header, liked_by, disliked_by, ids): (
            HashMap<String, String>,
            BTreeSet<String>,
            BTreeSet<String>,
            Vec<String>,
        ) = redis::pipe()
            .atomic()
            .hgetall(&key)
            .smembers(self.keys.post_liked_by(post_id))
            .smembers(self.keys.post_disliked_by(post_id))
            .lrange(self.keys.post_comments(post_id), 0, -1)
            .query_async(&mut self.conn)
            .await?;
        if header.is_empty() {
            return Ok(None);
        }
        let rows = self.load_rows(post_id, &ids).await?;
        let (comments, orphaned_rows) = Post::assemble_threads(rows);
        Ok(Some(Post {
            id: post_id.to_string(),
            username: text_field(&header, "username", &key)?.to_string(),
            message: text_field(&header, "message", &key)?.to_string(),
            created_at: timestamp_field(&header, "created_at", &key)?,
            version: number_field(&header, "version", &key)?,
            engagement: EngagementState {
                likes: number_field(&header, "likes", &key)?,
                dislikes: number_field(&header, "dislikes", &key)?,
                liked_by,
                disliked_by,
            },
            comments,
            orphaned_rows,
        }))
    }

    async fn cached_counts(&mut self, username: &str) -> Result<Option<RelationshipCounts>, SocialError> {
        let key = self.keys.counts(username);
        let row: HashMap<String, String> = self.conn.hgetall(&key).await?;
        if row.is_empty() {
            return Ok(None);
        }
        Ok(Some(RelationshipCounts {
            followers_count: number_field(&row, "followers_count", &key)?,
            following_count: number_field(&row, "following_count", &key)?,
            friends_count: number_field(&row, "friends_count", &key)?,
        }))
    }

    async fn commit(&mut self, tx: Transaction) -> Result<(), SocialError> {
        let label = tx.label();
        let (guards, ops) = tx.into_parts();
        let result = if guards.is_empty() && ops.is_empty() {
            Ok(())
        } else {
            let payload = commit_payload(&self.keys, label, &guards, &ops);
            match serde_json::to_string(&payload) {
                Ok(encoded) => {
                    let mut invocation = COMMIT_SCRIPT.prepare_invoke();
                    invocation.arg(encoded);
                    match invocation.invoke_async::<String>(&mut self.conn).await {
                        Ok(raw) => parse_commit_response(&raw),
                        Err(err) => Err(SocialError::from(err)),
                    }
                }
                Err(err) => Err(SocialError::storage(format!("failed to serialize commit: {err}"))),
            }
        };
        log_commit_outcome(label, &result);
        result
    }
}

/// Translates a transaction into the document consumed by `commit.lua`.
pub(crate) fn commit_payload(keys: &KeyContext, label: &str, guards: &[Guard], ops: &[WriteOp]) -> Value {
    json!({
        "label": label,
        "guards": guards.iter().map(|guard| guard_json(keys, guard)).collect::<Vec<_>>(),
        "ops": ops.iter().map(|op| op_json(keys, op)).collect::<Vec<_>>(),
    })
}

fn guard_json(keys: &KeyContext, guard: &Guard) -> Value {
    match guard {
        Guard::EdgeAbsent { follower, following } => json!({
            "type": "edge_absent",
            "key": keys.edges_out(follower),
            "field": following,
            "follower": follower,
            "following": following,
        }),
        Guard::EdgeStatus {
            follower,
            following,
            status,
        } => json!({
            "type": "edge_status",
            "key": keys.edges_out(follower),
            "field": following,
            "status": status.as_str(),
            "follower": follower,
            "following": following,
        }),
        Guard::PostVersion { post_id, expected } => json!({
            "type": "post_version",
            "key": keys.post(post_id),
            "post_id": post_id,
            "expected": expected,
        }),
        Guard::CommentAbsent { comment_id } => json!({
            "type": "comment_absent",
            "key": keys.comment(comment_id),
            "comment_id": comment_id,
        }),
    }
}

fn op_json(keys: &KeyContext, op: &WriteOp) -> Value {
    match op {
        WriteOp::PutEdge(edge) => json!({
            "type": "put_edge",
            "out_key": keys.edges_out(&edge.follower),
            "in_key": keys.edges_in(&edge.following),
            "follower": edge.follower,
            "following": edge.following,
            "status": edge.status.as_str(),
        }),
        WriteOp::DeleteEdge { follower, following } => json!({
            "type": "delete_edge",
            "out_key": keys.edges_out(follower),
            "in_key": keys.edges_in(following),
            "follower": follower,
            "following": following,
        }),
        WriteOp::PutPost(post) => {
            let rows: Vec<Value> = post
                .rows()
                .map(|row| {
                    let mut fields = vec![
                        "post_id".to_string(),
                        row.post_id.clone(),
                        "username".to_string(),
                        row.username.clone(),
                        "text".to_string(),
                        row.text.clone(),
                        "created_at".to_string(),
                        row.created_at.to_rfc3339(),
                        "heart_count".to_string(),
                        row.heart_count.to_string(),
                    ];
                    if let Some(parent) = &row.parent_id {
                        fields.push("parent_comment_id".to_string());
                        fields.push(parent.clone());
                    }
                    json!({
                        "key": keys.comment(&row.id),
                        "fields": fields,
                        "hearts_key": keys.hearts(&row.id),
                        "hearted_by": chunked(&row.hearted_by),
                    })
                })
                .collect();
            json!({
                "type": "put_post",
                "key": keys.post(&post.id),
                "fields": [
                    "username", post.username,
                    "message", post.message,
                    "created_at", post.created_at.to_rfc3339(),
                    "likes", post.engagement.likes.to_string(),
                    "dislikes", post.engagement.dislikes.to_string(),
                    "version", post.version.to_string(),
                ],
                "liked_key": keys.post_liked_by(&post.id),
                "liked_by": chunked(&post.engagement.liked_by),
                "disliked_key": keys.post_disliked_by(&post.id),
                "disliked_by": chunked(&post.engagement.disliked_by),
                "comments_key": keys.post_comments(&post.id),
                "comment_ids": chunked(post.rows().map(|row| row.id.as_str())),
                "rows": rows,
            })
        }
        WriteOp::DeleteHearts { comment_ids } => json!({
            "type": "delete_keys",
            "keys": chunked(comment_ids.iter().map(|id| keys.hearts(id))),
        }),
        WriteOp::DeleteComments { post_id, comment_ids } => json!({
            "type": "delete_comments",
            "comments_key": keys.post_comments(post_id),
            "comment_ids": comment_ids,
            "keys": chunked(comment_ids.iter().map(|id| keys.comment(id))),
        }),
        WriteOp::DeletePost { post_id } => json!({
            "type": "delete_keys",
            "keys": [[
                keys.post(post_id),
                keys.post_liked_by(post_id),
                keys.post_disliked_by(post_id),
                keys.post_comments(post_id),
            ]],
        }),
        WriteOp::PutCounts { username, counts } => json!({
            "type": "put_counts",
            "key": keys.counts(username),
            "fields": [
                "followers_count", counts.followers_count.to_string(),
                "following_count", counts.following_count.to_string(),
                "friends_count", counts.friends_count.to_string(),
            ],
        }),
    }
}

/// Largest member list handed to one `unpack` call in `commit.lua`. Lua 5.1
/// fails above roughly 8000 results, after earlier writes already landed.
pub(crate) const UNPACK_CHUNK: usize = 1000;

/// Splits a member list into `UNPACK_CHUNK`-sized batches.
fn chunked<I>(items: I) -> Vec<Vec<I::Item>>
where
    I: IntoIterator,
{
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for item in items {
        current.push(item);
        if current.len() == UNPACK_CHUNK {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Maps the script's reply onto the error taxonomy.
pub(crate) fn parse_commit_response(raw: &str) -> Result<(), SocialError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| SocialError::storage(format!("failed to parse lua response: {err}")))?;
    let Some(error) = value.get("error") else {
        return Ok(());
    };
    let text = |name: &str| value.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
    match error.as_str() {
        Some("edge_exists") => Err(SocialError::conflict(format!(
            "edge {} -> {} already exists",
            text("follower"),
            text("following")
        ))),
        Some("edge_changed") => Err(SocialError::StaleWrite {
            resource: Resource::Edge,
            id: format!("{}->{}", text("follower"), text("following")),
            expected: None,
            actual: None,
        }),
        Some("chunk_too_large") => Err(SocialError::storage(format!(
            "commit batch of {} members exceeds the script limit",
            value.get("size").and_then(Value::as_u64).unwrap_or_default()
        ))),
        Some("comment_exists") => Err(SocialError::conflict(format!(
            "comment id {} is already taken",
            text("comment_id")
        ))),
        Some("version_conflict") => Err(SocialError::StaleWrite {
            resource: Resource::Post,
            id: text("post_id"),
            expected: value.get("expected").and_then(Value::as_u64),
            actual: value.get("actual").and_then(Value::as_u64),
        }),
        Some(other) => Err(SocialError::Storage {
            message: Cow::Owned(other.to_string()),
        }),
        None => Err(SocialError::storage("lua_error")),
    }
}

fn text_field<'a>(row: &'a HashMap<String, String>, name: &str, key: &str) -> Result<&'a str, SocialError> {
    row.get(name)
        .map(String::as_str)
        .ok_or_else(|| SocialError::storage(format!("{key} is missing field {name}")))
}

fn number_field(row: &HashMap<String, String>, name: &str, key: &str) -> Result<u64, SocialError> {
    text_field(row, name, key)?
        .parse()
        .map_err(|err| SocialError::storage(format!("{key} field {name} is not a count: {err}")))
}

fn timestamp_field(row: &HashMap<String, String>, name: &str, key: &str) -> Result<DateTime<Utc>, SocialError> {
    DateTime::parse_from_rfc3339(text_field(row, name, key)?)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| SocialError::storage(format!("{key} field {name} is not a timestamp: {err}")))
}
