pub(crate) use chrono::Utc;
pub(crate) use snug_social::{
    ActionPayload, Comment, CommentThread, DeletedType, EdgeStatus, EngagementAction, EngagementSettings, ErrorKind,
    FriendRequestOutcome, FriendshipStatus, MemoryGateway, PersistenceGateway, Post, RedisGateway, RedisSettings,
    RelationshipCounts, Resource, SocialAction, SocialClient, SocialConfig, SocialError, SocialResponse, Transaction,
    WriteOp, id::generate_entity_id,
};
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn config_with_attempts(write_attempts: u32) -> SocialConfig {
    SocialConfig {
        engagement: EngagementSettings {
            write_attempts,
            ..EngagementSettings::default()
        },
        ..SocialConfig::default()
    }
}

pub(crate) fn memory_client() -> SocialClient<MemoryGateway> {
    SocialClient::in_memory(SocialConfig::default())
}

/// Clients sharing one store, each committing after a scheduler yield.
pub(crate) fn racing_clients(count: usize, config: &SocialConfig) -> (MemoryGateway, Vec<SocialClient<MemoryGateway>>) {
    let shared = MemoryGateway::new().with_commit_yield();
    let clients = (0..count)
        .map(|_| SocialClient::new(shared.clone(), config.clone()))
        .collect();
    (shared, clients)
}

/// Writes an empty post with a fixed id at version 1.
pub(crate) async fn seed_post<G: PersistenceGateway>(gateway: &mut G, post_id: &str, author: &str) -> Post {
    let post = Post {
        id: post_id.to_string(),
        username: author.to_string(),
        message: format!("post {post_id}"),
        created_at: Utc::now(),
        version: 1,
        engagement: Default::default(),
        comments: Vec::new(),
        orphaned_rows: Vec::new(),
    };
    let mut tx = Transaction::begin("seed_post");
    tx.push(WriteOp::PutPost(post.clone()));
    gateway.commit(tx).await.expect("seed post");
    post
}

pub(crate) async fn comment<G: PersistenceGateway>(
    client: &mut SocialClient<G>,
    post_id: &str,
    actor: &str,
    comment_id: &str,
    text: &str,
) {
    let applied = client
        .apply_action(
            post_id,
            EngagementAction::Comment,
            actor,
            &ActionPayload::text(text).with_comment_id(comment_id),
        )
        .await
        .expect("comment");
    assert_eq!(applied.created_id.as_deref(), Some(comment_id));
}

/// Posts a reply and returns its generated id.
pub(crate) async fn reply<G: PersistenceGateway>(
    client: &mut SocialClient<G>,
    post_id: &str,
    actor: &str,
    comment_id: &str,
    text: &str,
) -> String {
    client
        .apply_action(
            post_id,
            EngagementAction::Reply,
            actor,
            &ActionPayload::text(text).with_comment_id(comment_id),
        )
        .await
        .expect("reply")
        .created_id
        .expect("reply id")
}

pub(crate) fn heart(comment_id: &str) -> ActionPayload {
    ActionPayload::default().with_comment_id(comment_id)
}

pub(crate) fn heart_on_reply(comment_id: &str, reply_id: &str) -> ActionPayload {
    ActionPayload::default().with_comment_id(comment_id).with_reply_id(reply_id)
}

pub(crate) static TEST_NAMESPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique Redis key space per test so runs never collide.
pub(crate) struct TestNamespace {
    prefix: String,
}

impl TestNamespace {
    pub(crate) fn unique() -> Self {
        let idx = TEST_NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let salt = generate_entity_id();
        Self {
            prefix: format!("snug_social_test_{idx}_{}", &salt[..8]),
        }
    }

    pub(crate) fn config(&self) -> SocialConfig {
        SocialConfig {
            redis: RedisSettings {
                url: "redis://127.0.0.1/".to_string(),
                prefix: self.prefix.clone(),
                service: "social".to_string(),
            },
            ..SocialConfig::default()
        }
    }

    pub(crate) async fn client(&self) -> SocialClient<RedisGateway> {
        SocialClient::connect(self.config()).await.expect("redis client")
    }
}
