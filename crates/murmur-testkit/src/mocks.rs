//! Mock collaborators
//!
//! Deterministic in-memory stand-ins for the engine's external
//! collaborators. Responses are scripted per call; interactions are
//! recorded for assertions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use murmur_core::{
    ActorId, FeedError, HistoryFetcher, MentionLookup, MutationSubmitter, PageRequest, PostId,
    PostRecord, Result, Username,
};

/// History fetcher that replays a script of page responses.
///
/// Each `fetch_page` call pops the next scripted response; an exhausted
/// script returns empty pages. All requests are recorded.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<PostRecord>>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedFetcher {
    /// Create a fetcher with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page.
    pub fn push_page(&self, page: Vec<PostRecord>) {
        self.script.lock().push_back(Ok(page));
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .push_back(Err(FeedError::transport(message)));
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HistoryFetcher for ScriptedFetcher {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<PostRecord>> {
        self.requests.lock().push(request);
        self.script.lock().pop_front().unwrap_or_else(|| Ok(vec![]))
    }
}

/// One call observed by [`RecordingSubmitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitterCall {
    /// A like submission
    Like(PostId, ActorId),
    /// An unlike submission
    Unlike(PostId, ActorId),
    /// A post creation
    CreatePost(String),
    /// A comment creation
    CreateComment(PostId, String),
}

/// Mutation submitter that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingSubmitter {
    calls: Mutex<Vec<SubmitterCall>>,
    fail_with: Mutex<Option<FeedError>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingSubmitter {
    /// Create a submitter that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error.
    pub fn fail_all(&self, message: &str) {
        *self.fail_with.lock() = Some(FeedError::transport(message));
    }

    /// Accept subsequent calls again.
    pub fn succeed(&self) {
        *self.fail_with.lock() = None;
    }

    /// Delay every response by `delay`, simulating a slow network.
    pub fn respond_after(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<SubmitterCall> {
        self.calls.lock().clone()
    }

    async fn record(&self, call: SubmitterCall) -> Result<()> {
        self.calls.lock().push(call);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MutationSubmitter for RecordingSubmitter {
    async fn like(&self, post_id: &PostId, actor: &ActorId) -> Result<()> {
        self.record(SubmitterCall::Like(post_id.clone(), actor.clone()))
            .await
    }

    async fn unlike(&self, post_id: &PostId, actor: &ActorId) -> Result<()> {
        self.record(SubmitterCall::Unlike(post_id.clone(), actor.clone()))
            .await
    }

    async fn create_post(&self, content: &str) -> Result<()> {
        self.record(SubmitterCall::CreatePost(content.to_string())).await
    }

    async fn create_comment(&self, post_id: &PostId, content: &str) -> Result<()> {
        self.record(SubmitterCall::CreateComment(
            post_id.clone(),
            content.to_string(),
        ))
        .await
    }
}

/// Mention lookup backed by a static table, with optional per-post delay
/// and failure injection.
#[derive(Default)]
pub struct StaticMentions {
    table: Mutex<HashMap<PostId, BTreeSet<Username>>>,
    delays: Mutex<HashMap<PostId, Duration>>,
    failing: Mutex<BTreeSet<PostId>>,
}

impl StaticMentions {
    /// Create an empty lookup; unknown posts resolve to no mentions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register mentions for a post.
    pub fn insert(&self, post_id: PostId, mentions: impl IntoIterator<Item = Username>) {
        self.table
            .lock()
            .insert(post_id, mentions.into_iter().collect());
    }

    /// Delay resolution for a post by `delay`.
    pub fn delay(&self, post_id: PostId, delay: Duration) {
        self.delays.lock().insert(post_id, delay);
    }

    /// Make lookups for a post fail.
    pub fn fail(&self, post_id: PostId) {
        self.failing.lock().insert(post_id);
    }
}

#[async_trait]
impl MentionLookup for StaticMentions {
    async fn fetch_mentions(&self, post_id: &PostId) -> Result<BTreeSet<Username>> {
        let delay = self.delays.lock().get(post_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(post_id) {
            return Err(FeedError::transport("mention lookup unavailable"));
        }
        Ok(self.table.lock().get(post_id).cloned().unwrap_or_default())
    }
}
