//! Fixture builders for feed records

use murmur_core::{ActorId, PostId, PostRecord};

/// Build a post by a generic author at the given timestamp.
pub fn post(id: &str, created_at_ms: u64) -> PostRecord {
    post_by(id, "author", created_at_ms)
}

/// Build a post by a specific author at the given timestamp.
pub fn post_by(id: &str, author: &str, created_at_ms: u64) -> PostRecord {
    PostRecord::new(
        PostId::new(id),
        ActorId::new(author),
        format!("content of {id}"),
        created_at_ms,
    )
}

/// Build a post with an initial set of likers.
pub fn post_liked_by(id: &str, created_at_ms: u64, likers: &[&str]) -> PostRecord {
    let mut record = post(id, created_at_ms);
    for liker in likers {
        record.liked_by.insert(ActorId::new(*liker));
    }
    record
}
