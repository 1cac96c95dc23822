//! Derived views over the edge set: counts, username lists and the
//! advisory counts cache.

use std::collections::BTreeSet;

use crate::{
    errors::{SocialError, require_name},
    gateway::{PersistenceGateway, Transaction, WriteOp},
    types::{Edge, EdgeStatus, RelationshipCounts},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipQueries;

/// Which derived username list to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationList {
    Followers,
    Following,
    Friends,
    IncomingRequests,
    OutgoingRequests,
}

impl RelationshipQueries {
    pub fn new() -> Self {
        Self
    }

    /// Recomputes the counts of `username` from the edge set.
    pub async fn counts<G>(&self, gateway: &mut G, username: &str) -> Result<RelationshipCounts, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("username", username)?;
        let outgoing = gateway.outgoing_edges(username).await?;
        let incoming = gateway.incoming_edges(username).await?;
        Ok(count_edges(username, &outgoing, &incoming))
    }

    /// Recomputes the counts and stores them as the cached snapshot.
    pub async fn refresh_counts<G>(&self, gateway: &mut G, username: &str) -> Result<RelationshipCounts, SocialError>
    where
        G: PersistenceGateway,
    {
        let counts = self.counts(gateway, username).await?;
        let mut tx = Transaction::begin("refresh_counts");
        tx.push(WriteOp::PutCounts {
            username: username.to_string(),
            counts,
        });
        gateway.commit(tx).await?;
        Ok(counts)
    }

    /// Last cached snapshot; may lag behind the edges.
    pub async fn cached_counts<G>(&self, gateway: &mut G, username: &str) -> Result<Option<RelationshipCounts>, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("username", username)?;
        gateway.cached_counts(username).await
    }

    /// Sorted usernames in the requested relation to `username`.
    pub async fn list<G>(&self, gateway: &mut G, username: &str, list: RelationList) -> Result<Vec<String>, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("username", username)?;
        let names: BTreeSet<String> = match list {
            RelationList::Followers => with_status(gateway.incoming_edges(username).await?, EdgeStatus::None)
                .map(|edge| edge.follower)
                .collect(),
            RelationList::Following => with_status(gateway.outgoing_edges(username).await?, EdgeStatus::None)
                .map(|edge| edge.following)
                .collect(),
            RelationList::IncomingRequests => {
                with_status(gateway.incoming_edges(username).await?, EdgeStatus::Pending)
                    .map(|edge| edge.follower)
                    .collect()
            }
            RelationList::OutgoingRequests => {
                with_status(gateway.outgoing_edges(username).await?, EdgeStatus::Pending)
                    .map(|edge| edge.following)
                    .collect()
            }
            RelationList::Friends => {
                let outgoing = gateway.outgoing_edges(username).await?;
                let incoming = gateway.incoming_edges(username).await?;
                friend_names(&outgoing, &incoming)
            }
        };
        Ok(names.into_iter().collect())
    }
}

fn with_status(edges: Vec<Edge>, status: EdgeStatus) -> impl Iterator<Item = Edge> {
    edges.into_iter().filter(move |edge| edge.status == status)
}

fn friend_names(outgoing: &[Edge], incoming: &[Edge]) -> BTreeSet<String> {
    let sent = outgoing
        .iter()
        .filter(|edge| edge.status == EdgeStatus::Accepted)
        .map(|edge| edge.following.clone());
    let received = incoming
        .iter()
        .filter(|edge| edge.status == EdgeStatus::Accepted)
        .map(|edge| edge.follower.clone());
    sent.chain(received).collect()
}

/// Friendships are stored as two accepted rows; each pair counts once.
pub(crate) fn count_edges(username: &str, outgoing: &[Edge], incoming: &[Edge]) -> RelationshipCounts {
    let following_count = outgoing.iter().filter(|edge| edge.status == EdgeStatus::None).count();
    let followers_count = incoming.iter().filter(|edge| edge.status == EdgeStatus::None).count();
    let friends = friend_names(outgoing, incoming);
    let raw_accepted = outgoing
        .iter()
        .chain(incoming.iter())
        .filter(|edge| edge.status == EdgeStatus::Accepted)
        .count();
    if raw_accepted != friends.len() * 2 {
        log::warn!(
            "{username} has {raw_accepted} accepted edges for {} friends; some friendships are one-sided",
            friends.len()
        );
    }
    RelationshipCounts {
        followers_count: followers_count as u64,
        following_count: following_count as u64,
        friends_count: friends.len() as u64,
    }
}
