use super::support::*;

#[tokio::test]
async fn like_twice_restores_counts_and_membership() {
    let mut client = memory_client();
    let seeded = seed_post(client.gateway_mut(), "p1", "alice").await;

    let liked = client
        .apply_action("p1", EngagementAction::Like, "bob", &ActionPayload::default())
        .await
        .expect("like");
    assert_eq!(liked.post.engagement.likes, 1);
    assert!(liked.post.engagement.liked_by.contains("bob"));
    assert_eq!(liked.post.version, 2);

    let unliked = client
        .apply_action("p1", EngagementAction::Like, "bob", &ActionPayload::default())
        .await
        .expect("unlike");
    assert_eq!(unliked.post.engagement, seeded.engagement);
    assert_eq!(client.get_post("p1").await.unwrap().engagement, seeded.engagement);
}

#[tokio::test]
async fn like_after_dislike_migrates_the_actor() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    client
        .apply_action("p1", EngagementAction::Dislike, "bob", &ActionPayload::default())
        .await
        .expect("dislike");
    client
        .apply_action("p1", EngagementAction::Dislike, "carol", &ActionPayload::default())
        .await
        .expect("dislike");
    let applied = client
        .apply_action("p1", EngagementAction::Like, "bob", &ActionPayload::default())
        .await
        .expect("like");

    let engagement = client.get_post("p1").await.unwrap().engagement;
    assert_eq!(engagement, applied.post.engagement);
    assert_eq!((engagement.likes, engagement.dislikes), (1, 1));
    assert!(engagement.liked_by.contains("bob"));
    assert!(engagement.disliked_by.contains("carol"));
    assert!(engagement.liked_by.is_disjoint(&engagement.disliked_by));
}

#[tokio::test]
async fn action_names_are_parsed() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    let response = client
        .dispatch(SocialAction::ApplyAction {
            post_id: "p1".into(),
            action: "dislike".parse().expect("known action"),
            actor: "bob".into(),
            payload: ActionPayload::default(),
        })
        .await
        .expect("dispatch");
    assert!(matches!(response, SocialResponse::Applied(applied) if applied.post.engagement.dislikes == 1));

    let err = "retweet".parse::<EngagementAction>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn missing_post_and_blank_actor_fail_without_writes() {
    let mut client = memory_client();
    let err = client
        .apply_action("nope", EngagementAction::Like, "bob", &ActionPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::NotFound { resource: Resource::Post, .. }));

    seed_post(client.gateway_mut(), "p1", "alice").await;
    let err = client
        .apply_action("p1", EngagementAction::Like, " ", &ActionPayload::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(client.get_post("p1").await.unwrap().version, 1);
}

#[tokio::test]
async fn rejected_text_leaves_post_unchanged() {
    let config = SocialConfig {
        engagement: EngagementSettings {
            max_text_length: 5,
            ..EngagementSettings::default()
        },
        ..SocialConfig::default()
    };
    let mut client = SocialClient::in_memory(config);
    let seeded = seed_post(client.gateway_mut(), "p1", "alice").await;

    for text in ["   ", "far too long"] {
        let err = client
            .apply_action("p1", EngagementAction::Comment, "bob", &ActionPayload::text(text))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert_eq!(client.get_post("p1").await.unwrap(), seeded);
    assert_eq!(client.gateway().total_comment_rows(), 0);
}

#[tokio::test]
async fn comment_text_is_trimmed_and_ids_generated() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    let applied = client
        .apply_action("p1", EngagementAction::Comment, "bob", &ActionPayload::text("  nice  "))
        .await
        .expect("comment");
    let id = applied.created_id.expect("generated id");
    assert_eq!(id.len(), 20);

    let post = client.get_post("p1").await.unwrap();
    let thread = post.thread(&id).expect("stored thread");
    assert_eq!(thread.comment.text, "nice");
    assert_eq!(thread.comment.username, "bob");
    assert_eq!(thread.comment.heart_count, 0);
    assert!(thread.replies.is_empty());
}

#[tokio::test]
async fn supplied_comment_ids_are_unique_across_posts() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    seed_post(client.gateway_mut(), "p2", "alice").await;
    comment(&mut client, "p1", "bob", "c1", "first").await;

    let err = client
        .apply_action(
            "p2",
            EngagementAction::Comment,
            "bob",
            &ActionPayload::text("again").with_comment_id("c1"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(client.get_post("p2").await.unwrap().comments.is_empty());
    assert_eq!(client.get_post("p1").await.unwrap().thread("c1").unwrap().comment.text, "first");
}

#[tokio::test]
async fn hearts_toggle_on_comments_and_replies() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    comment(&mut client, "p1", "alice", "c1", "hi").await;
    let reply_id = reply(&mut client, "p1", "bob", "c1", "hey").await;

    client
        .apply_action("p1", EngagementAction::HeartComment, "bob", &heart("c1"))
        .await
        .expect("heart comment");
    client
        .apply_action("p1", EngagementAction::HeartReply, "alice", &heart_on_reply("c1", &reply_id))
        .await
        .expect("heart reply");
    assert_eq!(client.gateway().heart_rows("c1"), 1);
    assert_eq!(client.gateway().heart_rows(&reply_id), 1);

    client
        .apply_action("p1", EngagementAction::HeartComment, "bob", &heart("c1"))
        .await
        .expect("unheart comment");
    let post = client.get_post("p1").await.unwrap();
    let thread = post.thread("c1").unwrap();
    assert_eq!(thread.comment.heart_count, 0);
    assert_eq!(client.gateway().heart_rows("c1"), 0);
    assert_eq!(thread.reply(&reply_id).unwrap().heart_count, 1);
}

#[tokio::test]
async fn heart_reply_reports_which_target_is_missing() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    comment(&mut client, "p1", "alice", "c1", "hi").await;

    let err = client
        .apply_action("p1", EngagementAction::HeartReply, "bob", &heart_on_reply("c2", "r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::NotFound { resource: Resource::Comment, .. }));

    let err = client
        .apply_action("p1", EngagementAction::HeartReply, "bob", &heart_on_reply("c1", "r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::NotFound { resource: Resource::Reply, .. }));

    let err = client
        .apply_action("p1", EngagementAction::HeartComment, "bob", &ActionPayload::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn concurrent_likes_all_land() {
    let config = config_with_attempts(5);
    let (shared, mut clients) = racing_clients(4, &config);
    seed_post(&mut shared.clone(), "p1", "alice").await;

    let none = ActionPayload::default();
    let [a, b, c, d] = clients.as_mut_slice() else {
        panic!("expected four clients");
    };
    let results = tokio::join!(
        a.apply_action("p1", EngagementAction::Like, "u1", &none),
        b.apply_action("p1", EngagementAction::Like, "u2", &none),
        c.apply_action("p1", EngagementAction::Like, "u3", &none),
        d.apply_action("p1", EngagementAction::Like, "u4", &none),
    );
    for result in [results.0, results.1, results.2, results.3] {
        result.expect("like lands after retry");
    }

    let post = a.get_post("p1").await.unwrap();
    assert_eq!(post.engagement.likes, 4);
    assert_eq!(post.engagement.liked_by.len(), 4);
    assert_eq!(post.version, 5);
}

#[tokio::test]
async fn exhausted_retries_surface_stale_write() {
    let config = config_with_attempts(1);
    let (shared, mut clients) = racing_clients(2, &config);
    seed_post(&mut shared.clone(), "p1", "alice").await;

    let none = ActionPayload::default();
    let (first, rest) = clients.split_at_mut(1);
    let (a, b) = tokio::join!(
        first[0].apply_action("p1", EngagementAction::Like, "u1", &none),
        rest[0].apply_action("p1", EngagementAction::Like, "u2", &none),
    );
    let err = a.err().or(b.err()).expect("one writer loses the race");
    assert!(err.is_stale());
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert_eq!(first[0].get_post("p1").await.unwrap().engagement.likes, 1);
}

#[tokio::test]
async fn concurrent_replies_are_all_appended() {
    let (shared, mut clients) = racing_clients(3, &config_with_attempts(4));
    let mut setup = SocialClient::new(shared.clone(), SocialConfig::default());
    seed_post(setup.gateway_mut(), "p1", "alice").await;
    comment(&mut setup, "p1", "alice", "c1", "hi").await;

    let [a, b, c] = clients.as_mut_slice() else {
        panic!("expected three clients");
    };
    let (ra, rb, rc) = tokio::join!(
        reply(a, "p1", "u1", "c1", "one"),
        reply(b, "p1", "u2", "c1", "two"),
        reply(c, "p1", "u3", "c1", "three"),
    );

    let post = setup.get_post("p1").await.unwrap();
    let replies = &post.thread("c1").unwrap().replies;
    assert_eq!(replies.len(), 3);
    for id in [ra, rb, rc] {
        assert!(replies.iter().any(|reply| reply.id == id));
    }
    assert_eq!(shared.total_comment_rows(), 4);
}

#[tokio::test]
async fn injected_failure_leaves_engagement_unchanged() {
    let mut client = memory_client();
    seed_post(client.gateway_mut(), "p1", "alice").await;
    comment(&mut client, "p1", "alice", "c1", "hi").await;
    let before = client.get_post("p1").await.unwrap();

    client.gateway().fail_next_commit("write timed out");
    let err = client
        .apply_action("p1", EngagementAction::HeartComment, "bob", &heart("c1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::Storage { .. }));
    assert_eq!(client.get_post("p1").await.unwrap(), before);
    assert_eq!(client.gateway().heart_rows("c1"), 0);
}
