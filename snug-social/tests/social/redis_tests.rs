//! Same flows against a live Redis at 127.0.0.1:6379.
//! Run with `cargo test -- --ignored`.

use super::support::*;

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn redis_friendship_and_counts() {
    let ns = TestNamespace::unique();
    let mut client = ns.client().await;

    client.follow("amy", "zed").await.expect("follow");
    let err = client.follow("amy", "zed").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(
        client.request_or_accept_friend("zed", "cat").await.unwrap(),
        FriendRequestOutcome::Requested
    );
    assert_eq!(
        client.request_or_accept_friend("cat", "zed").await.unwrap(),
        FriendRequestOutcome::Accepted
    );

    let counts = client.refresh_counts("zed").await.expect("counts");
    assert_eq!(counts.followers_count, 1);
    assert_eq!(counts.friends_count, 1);
    assert_eq!(client.cached_counts("zed").await.unwrap(), Some(counts));
    assert_eq!(client.friends("cat").await.unwrap(), vec!["zed"]);

    client.remove_friendship("cat", "zed").await.expect("unfriend");
    assert_eq!(
        client.relationship_status("zed", "cat").await.unwrap().friendship_status,
        FriendshipStatus::None
    );
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn redis_thread_deletion_cascades() {
    let ns = TestNamespace::unique();
    let mut client = ns.client().await;
    let post = client.create_post("alice", "hello").await.expect("create");

    let c1 = format!("c1{}", &generate_entity_id()[..6]);
    comment(&mut client, &post.id, "alice", &c1, "hi").await;
    let r1 = reply(&mut client, &post.id, "bob", &c1, "hey").await;
    client
        .apply_action(&post.id, EngagementAction::HeartReply, "alice", &heart_on_reply(&c1, &r1))
        .await
        .expect("heart");

    let stored = client.get_post(&post.id).await.unwrap();
    let thread = stored.thread(&c1).expect("thread");
    assert_eq!(thread.reply(&r1).unwrap().heart_count, 1);
    assert_eq!(stored.version, 4);

    let err = client.delete_comment(&post.id, &c1, "carol").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let receipt = client.delete_comment(&post.id, &c1, "alice").await.expect("delete");
    assert_eq!(receipt.deleted_replies_count, 1);
    let err = client
        .apply_action(&post.id, EngagementAction::HeartReply, "alice", &heart_on_reply(&c1, &r1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    client.delete_post(&post.id, "alice").await.expect("delete post");
    assert_eq!(client.get_post(&post.id).await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn redis_stale_version_guard_blocks_the_whole_commit() {
    let ns = TestNamespace::unique();
    let mut client = ns.client().await;
    let post = client.create_post("alice", "hello").await.expect("create");

    let mut stale = post.clone();
    stale.message = "overwritten".into();
    let mut tx = Transaction::begin("stale_write");
    tx.guard(snug_social::Guard::PostVersion {
        post_id: post.id.clone(),
        expected: post.version + 1,
    })
    .push(WriteOp::PutPost(stale));
    let err = client.gateway_mut().commit(tx).await.unwrap_err();
    assert!(err.is_stale());
    assert_eq!(client.get_post(&post.id).await.unwrap().message, "hello");
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn redis_concurrent_likes_all_land() {
    let ns = TestNamespace::unique();
    let mut setup = ns.client().await;
    let post = setup.create_post("alice", "hello").await.expect("create");

    let mut a = SocialClient::connect(SocialConfig {
        engagement: config_with_attempts(10).engagement,
        ..ns.config()
    })
    .await
    .expect("client a");
    let mut b = SocialClient::new(a.gateway().clone(), a.config().clone());
    let none = ActionPayload::default();
    let (ra, rb) = tokio::join!(
        a.apply_action(&post.id, EngagementAction::Like, "u1", &none),
        b.apply_action(&post.id, EngagementAction::Like, "u2", &none),
    );
    ra.expect("like a");
    rb.expect("like b");
    assert_eq!(setup.get_post(&post.id).await.unwrap().engagement.likes, 2);
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn redis_like_on_a_post_with_ten_thousand_likers() {
    let ns = TestNamespace::unique();
    let mut client = ns.client().await;
    let post = client.create_post("alice", "popular").await.expect("create");

    let mut crowded = post.clone();
    crowded.engagement.liked_by = (0..10_000).map(|n| format!("fan{n:05}")).collect();
    crowded.engagement.likes = 10_000;
    crowded.version = post.version + 1;
    let mut tx = Transaction::begin("seed_likers");
    tx.guard(snug_social::Guard::PostVersion {
        post_id: post.id.clone(),
        expected: post.version,
    })
    .push(WriteOp::PutPost(crowded));
    client.gateway_mut().commit(tx).await.expect("seed likers");

    let applied = client
        .apply_action(&post.id, EngagementAction::Like, "newcomer", &ActionPayload::default())
        .await
        .expect("like lands");
    assert_eq!(applied.post.engagement.likes, 10_001);

    let stored = client.get_post(&post.id).await.unwrap();
    assert_eq!(stored.version, 3);
    assert_eq!(stored.engagement.likes, 10_001);
    assert_eq!(stored.engagement.liked_by.len(), 10_001);
    assert!(stored.engagement.liked_by.contains("fan09999"));

    client
        .apply_action(&post.id, EngagementAction::Dislike, "fan00000", &ActionPayload::default())
        .await
        .expect("dislike lands");
    let stored = client.get_post(&post.id).await.unwrap();
    assert_eq!(stored.engagement.likes, stored.engagement.liked_by.len() as u64);
    assert_eq!(stored.engagement.likes, 10_000);
}
