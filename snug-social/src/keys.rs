/// Builds every Redis key the social store touches.
///
/// All keys share the `prefix:service` namespace so independent deployments
/// (and test runs) can live in one database.
#[derive(Debug, Clone)]
pub struct KeyContext {
    namespace: String,
}

impl KeyContext {
    pub fn new(prefix: &str, service: &str) -> Self {
        Self {
            namespace: format!("{prefix}:{service}"),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Outgoing edges of `follower`: hash following -> status.
    pub fn edges_out(&self, follower: &str) -> String {
        format!("{}:edges:out:{}", self.namespace, follower)
    }

    /// Incoming edges of `following`: hash follower -> status.
    pub fn edges_in(&self, following: &str) -> String {
        format!("{}:edges:in:{}", self.namespace, following)
    }

    pub fn post(&self, post_id: &str) -> String {
        format!("{}:posts:{}", self.namespace, post_id)
    }

    pub fn post_liked_by(&self, post_id: &str) -> String {
        format!("{}:posts:{}:liked_by", self.namespace, post_id)
    }

    pub fn post_disliked_by(&self, post_id: &str) -> String {
        format!("{}:posts:{}:disliked_by", self.namespace, post_id)
    }

    /// Ordered list of every comment and reply id of a post.
    pub fn post_comments(&self, post_id: &str) -> String {
        format!("{}:posts:{}:comments", self.namespace, post_id)
    }

    pub fn comment(&self, comment_id: &str) -> String {
        format!("{}:comments:{}", self.namespace, comment_id)
    }

    /// Heart ledger of a comment or reply: set of usernames.
    pub fn hearts(&self, comment_id: &str) -> String {
        format!("{}:hearts:{}", self.namespace, comment_id)
    }

    pub fn counts(&self, username: &str) -> String {
        format!("{}:counts:{}", self.namespace, username)
    }
}
