use super::support::*;

#[tokio::test]
async fn follow_makes_status_following() {
    let mut client = memory_client();
    let edge = client.follow("alice", "bob").await.expect("follow");
    assert_eq!(edge.status, EdgeStatus::None);

    let view = client.relationship_status("alice", "bob").await.expect("status");
    assert!(view.is_following);
    assert_eq!(view.friendship_status, FriendshipStatus::None);

    let reverse = client.relationship_status("bob", "alice").await.expect("reverse status");
    assert!(!reverse.is_following);
}

#[tokio::test]
async fn duplicate_follow_conflicts() {
    let mut client = memory_client();
    client.follow("alice", "bob").await.expect("first follow");
    let err = client.follow("alice", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(client.gateway().edges().len(), 1);
}

#[tokio::test]
async fn self_follow_and_blank_names_are_invalid() {
    let mut client = memory_client();
    let err = client.follow("eve", "eve").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = client.follow("", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = client.request_or_accept_friend("eve", "eve").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(client.gateway().edges().is_empty());
}

#[tokio::test]
async fn unfollow_is_idempotent() {
    let mut client = memory_client();
    client.follow("alice", "bob").await.expect("follow");
    assert!(client.unfollow("alice", "bob").await.expect("unfollow"));
    assert!(!client.unfollow("alice", "bob").await.expect("second unfollow"));
    assert!(!client.relationship_status("alice", "bob").await.unwrap().is_following);
}

#[tokio::test]
async fn mutual_requests_become_one_friendship() {
    let mut client = memory_client();
    let first = client.request_or_accept_friend("alice", "bob").await.expect("request");
    assert_eq!(first, FriendRequestOutcome::Requested);
    assert_eq!(
        client.relationship_status("alice", "bob").await.unwrap().friendship_status,
        FriendshipStatus::PendingSent
    );
    assert_eq!(
        client.relationship_status("bob", "alice").await.unwrap().friendship_status,
        FriendshipStatus::PendingReceived
    );

    let second = client.request_or_accept_friend("bob", "alice").await.expect("accept");
    assert_eq!(second, FriendRequestOutcome::Accepted);
    for (a, b) in [("alice", "bob"), ("bob", "alice")] {
        assert_eq!(
            client.relationship_status(a, b).await.unwrap().friendship_status,
            FriendshipStatus::Friends
        );
    }

    let accepted = client
        .gateway()
        .edges()
        .into_iter()
        .filter(|edge| edge.status == EdgeStatus::Accepted)
        .count();
    assert_eq!(accepted, 2);
    assert_eq!(client.gateway().edges().len(), 2);
}

#[tokio::test]
async fn repeated_request_conflicts() {
    let mut client = memory_client();
    client.request_or_accept_friend("alice", "bob").await.expect("request");
    let err = client.request_or_accept_friend("alice", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn request_over_existing_follow_conflicts() {
    let mut client = memory_client();
    client.follow("alice", "bob").await.expect("follow");
    let err = client.request_or_accept_friend("alice", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn accepting_upgrades_an_existing_follow() {
    let mut client = memory_client();
    client.request_or_accept_friend("bob", "alice").await.expect("request");
    client.follow("alice", "bob").await.expect("follow");

    let outcome = client.request_or_accept_friend("alice", "bob").await.expect("accept");
    assert_eq!(outcome, FriendRequestOutcome::Accepted);
    let edges = client.gateway().edges();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|edge| edge.status == EdgeStatus::Accepted));
    assert!(!client.relationship_status("alice", "bob").await.unwrap().is_following);
}

#[tokio::test]
async fn remove_friendship_clears_both_directions() {
    let mut client = memory_client();
    client.request_or_accept_friend("alice", "bob").await.unwrap();
    client.request_or_accept_friend("bob", "alice").await.unwrap();
    client.remove_friendship("alice", "bob").await.expect("remove");
    assert!(client.gateway().edges().is_empty());
    assert_eq!(
        client.relationship_status("bob", "alice").await.unwrap().friendship_status,
        FriendshipStatus::None
    );
    client.remove_friendship("alice", "bob").await.expect("removing nothing still succeeds");
}

#[tokio::test]
async fn removing_a_self_friendship_succeeds_without_writes() {
    let mut client = memory_client();
    client.follow("eve", "bob").await.unwrap();
    client.gateway().fail_next_commit("no commit expected");

    client.remove_friendship("eve", "eve").await.expect("self pair is a no-op");
    assert_eq!(client.gateway().edges().len(), 1);
    // the injected failure is still pending, so nothing was committed
    let err = client.unfollow("eve", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);

    let err = client.remove_friendship(" ", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn counts_are_derived_from_edges() {
    let mut client = memory_client();
    client.follow("amy", "zed").await.unwrap();
    client.follow("ben", "zed").await.unwrap();
    client.follow("zed", "amy").await.unwrap();
    client.request_or_accept_friend("zed", "cat").await.unwrap();
    client.request_or_accept_friend("cat", "zed").await.unwrap();
    client.request_or_accept_friend("dan", "zed").await.unwrap();

    let counts = client.counts("zed").await.expect("counts");
    assert_eq!(
        counts,
        RelationshipCounts {
            followers_count: 2,
            following_count: 1,
            friends_count: 1,
        }
    );

    assert_eq!(client.followers("zed").await.unwrap(), vec!["amy", "ben"]);
    assert_eq!(client.following("zed").await.unwrap(), vec!["amy"]);
    assert_eq!(client.friends("zed").await.unwrap(), vec!["cat"]);
    assert_eq!(client.incoming_requests("zed").await.unwrap(), vec!["dan"]);
    assert_eq!(client.outgoing_requests("dan").await.unwrap(), vec!["zed"]);
}

#[tokio::test]
async fn cached_counts_lag_until_refreshed() {
    let mut client = memory_client();
    assert_eq!(client.cached_counts("bob").await.unwrap(), None);

    client.follow("alice", "bob").await.unwrap();
    let refreshed = client.refresh_counts("bob").await.expect("refresh");
    assert_eq!(refreshed.followers_count, 1);
    assert_eq!(client.cached_counts("bob").await.unwrap(), Some(refreshed));

    client.follow("carol", "bob").await.unwrap();
    assert_eq!(client.cached_counts("bob").await.unwrap().unwrap().followers_count, 1);
    assert_eq!(client.counts("bob").await.unwrap().followers_count, 2);
    assert_eq!(client.refresh_counts("bob").await.unwrap().followers_count, 2);
}

#[tokio::test]
async fn racing_follows_create_one_edge() {
    let (shared, mut clients) = racing_clients(2, &SocialConfig::default());
    let (first, rest) = clients.split_at_mut(1);
    let (a, b) = tokio::join!(first[0].follow("alice", "bob"), rest[0].follow("alice", "bob"));

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let err = a.err().or(b.err()).expect("one follow loses");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(shared.edges().len(), 1);
}

#[tokio::test]
async fn failed_commit_leaves_edges_untouched() {
    let mut client = memory_client();
    client.request_or_accept_friend("bob", "alice").await.unwrap();
    client.gateway().fail_next_commit("connection reset");

    let err = client.request_or_accept_friend("alice", "bob").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    let edges = client.gateway().edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].status, EdgeStatus::Pending);
}
