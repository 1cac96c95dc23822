//! Relationship graph: follow and friend edges with their status transitions.

use crate::{
    config::SocialConfig,
    errors::{SocialError, require_distinct_pair, require_name},
    gateway::{Guard, PersistenceGateway, Transaction, WriteOp},
    types::{Edge, EdgeStatus, FriendRequestOutcome, FriendshipStatus, RelationshipView},
};

/// Owns every mutation of follow/friend edges.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    write_attempts: u32,
}

impl RelationshipGraph {
    pub fn new(config: &SocialConfig) -> Self {
        Self {
            write_attempts: config.engagement.attempts(),
        }
    }

    /// Creates a plain follow edge `follower -> following`.
    pub async fn follow<G>(&self, gateway: &mut G, follower: &str, following: &str) -> Result<Edge, SocialError>
    where
        G: PersistenceGateway,
    {
        require_distinct_pair("follower", follower, "following", following)?;
        if let Some(existing) = gateway.edge(follower, following).await? {
            return Err(SocialError::conflict(format!(
                "{follower} already has a {} edge to {following}",
                existing.status.as_str()
            )));
        }

        let edge = Edge::new(follower, following, EdgeStatus::None);
        let mut tx = Transaction::begin("follow");
        tx.guard(Guard::EdgeAbsent {
            follower: follower.to_string(),
            following: following.to_string(),
        })
        .push(WriteOp::PutEdge(edge.clone()));
        gateway.commit(tx).await?;
        log::info!("{follower} follows {following}");
        Ok(edge)
    }

    /// Removes edge `follower -> following` whatever its status.
    ///
    /// Returns whether an edge existed. Cancelling one direction of a
    /// friendship this way leaves the reverse edge alone.
    pub async fn unfollow<G>(&self, gateway: &mut G, follower: &str, following: &str) -> Result<bool, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("follower", follower)?;
        require_name("following", following)?;
        let Some(existing) = gateway.edge(follower, following).await? else {
            return Ok(false);
        };

        let mut tx = Transaction::begin("unfollow");
        tx.push(WriteOp::DeleteEdge {
            follower: follower.to_string(),
            following: following.to_string(),
        });
        gateway.commit(tx).await?;
        log::info!(
            "{follower} removed {} edge to {following}",
            existing.status.as_str()
        );
        Ok(true)
    }

    /// Sends a friend request, or accepts the one `recipient` already sent.
    pub async fn request_or_accept_friend<G>(
        &self,
        gateway: &mut G,
        requester: &str,
        recipient: &str,
    ) -> Result<FriendRequestOutcome, SocialError>
    where
        G: PersistenceGateway,
    {
        require_distinct_pair("requester", requester, "recipient", recipient)?;

        let mut attempt = 1;
        loop {
            let reverse = gateway.edge(recipient, requester).await?;
            let forward = gateway.edge(requester, recipient).await?;

            let mut tx;
            let outcome;
            if reverse.as_ref().map(|edge| edge.status) == Some(EdgeStatus::Pending) {
                tx = Transaction::begin("accept_friend");
                match forward.as_ref().map(|edge| edge.status) {
                    None => {
                        tx.guard(Guard::EdgeAbsent {
                            follower: requester.to_string(),
                            following: recipient.to_string(),
                        });
                    }
                    Some(EdgeStatus::None) => {
                        log::debug!("{requester}'s follow of {recipient} becomes a friendship");
                        tx.guard(Guard::EdgeStatus {
                            follower: requester.to_string(),
                            following: recipient.to_string(),
                            status: EdgeStatus::None,
                        });
                    }
                    Some(status) => {
                        log::warn!(
                            "inconsistent edges between {requester} and {recipient}: {recipient} -> {requester} \
                             is pending while {requester} -> {recipient} is {}; leaving them untouched",
                            status.as_str()
                        );
                        tx.rollback();
                        return Err(SocialError::conflict(format!(
                            "{requester} -> {recipient} is already {}",
                            status.as_str()
                        )));
                    }
                }
                tx.guard(Guard::EdgeStatus {
                    follower: recipient.to_string(),
                    following: requester.to_string(),
                    status: EdgeStatus::Pending,
                })
                .push(WriteOp::PutEdge(Edge::new(recipient, requester, EdgeStatus::Accepted)))
                .push(WriteOp::PutEdge(Edge::new(requester, recipient, EdgeStatus::Accepted)));
                outcome = FriendRequestOutcome::Accepted;
            } else if let Some(existing) = forward {
                return Err(SocialError::conflict(format!(
                    "{requester} already has a {} edge to {recipient}",
                    existing.status.as_str()
                )));
            } else {
                tx = Transaction::begin("request_friend");
                tx.guard(Guard::EdgeAbsent {
                    follower: requester.to_string(),
                    following: recipient.to_string(),
                })
                .push(WriteOp::PutEdge(Edge::new(requester, recipient, EdgeStatus::Pending)));
                outcome = FriendRequestOutcome::Requested;
            }

            match gateway.commit(tx).await {
                Ok(()) => {
                    log::info!("friendship {requester} -> {recipient}: {outcome:?}");
                    return Ok(outcome);
                }
                Err(err) if err.is_stale() && attempt < self.write_attempts => {
                    log::debug!("retrying friend request {requester} -> {recipient} after {err}");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Deletes both directed edges between the pair, whatever their status.
    ///
    /// A user paired with itself has no edges to remove, so that is a no-op.
    pub async fn remove_friendship<G>(&self, gateway: &mut G, requester: &str, recipient: &str) -> Result<(), SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("requester", requester)?;
        require_name("recipient", recipient)?;
        if requester == recipient {
            log::debug!("{requester} has no friendship with itself; nothing to remove");
            return Ok(());
        }
        let mut tx = Transaction::begin("remove_friendship");
        tx.push(WriteOp::DeleteEdge {
            follower: requester.to_string(),
            following: recipient.to_string(),
        })
        .push(WriteOp::DeleteEdge {
            follower: recipient.to_string(),
            following: requester.to_string(),
        });
        gateway.commit(tx).await?;
        log::info!("removed every edge between {requester} and {recipient}");
        Ok(())
    }

    /// Derives how `a` relates to `b`. Read-only.
    pub async fn relationship_status<G>(&self, gateway: &mut G, a: &str, b: &str) -> Result<RelationshipView, SocialError>
    where
        G: PersistenceGateway,
    {
        require_name("username", a)?;
        require_name("other", b)?;
        let forward = gateway.edge(a, b).await?.map(|edge| edge.status);
        let reverse = gateway.edge(b, a).await?.map(|edge| edge.status);
        if (forward == Some(EdgeStatus::Accepted)) != (reverse == Some(EdgeStatus::Accepted)) {
            log::warn!("half-accepted friendship between {a} and {b} ({forward:?} / {reverse:?})");
        }
        Ok(derive_view(forward, reverse))
    }
}

/// Status derivation shared by every read path. `accepted` wins over any
/// pending row in either direction.
pub fn derive_view(forward: Option<EdgeStatus>, reverse: Option<EdgeStatus>) -> RelationshipView {
    let friendship_status = if forward == Some(EdgeStatus::Accepted) || reverse == Some(EdgeStatus::Accepted) {
        FriendshipStatus::Friends
    } else if forward == Some(EdgeStatus::Pending) {
        FriendshipStatus::PendingSent
    } else if reverse == Some(EdgeStatus::Pending) {
        FriendshipStatus::PendingReceived
    } else {
        FriendshipStatus::None
    };
    RelationshipView {
        is_following: forward == Some(EdgeStatus::None),
        friendship_status,
    }
}
