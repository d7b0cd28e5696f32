//! Integration tests for the feed reconciliation engine
//!
//! Exercises the engine end to end over mock collaborators:
//! - Seeding, pagination, and end-of-stream detection
//! - Optimistic toggles: echo suppression, rollback exactness, coalescing
//! - The new-items gate and pull-only merges
//! - Mention enrichment under its time budget
//! - Error retention and teardown rollback

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use murmur_core::{
    ActorId, ChannelStatus, EventEnvelope, FeedError, PostId, PostRecord, Username,
};
use murmur_feed::{FeedConfig, FeedEngine, FeedSignal};
use murmur_testkit::{
    post, post_by, post_liked_by, RecordingSubmitter, ScriptedFetcher, StaticMentions,
    SubmitterCall,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    engine: Arc<FeedEngine>,
    fetcher: Arc<ScriptedFetcher>,
    submitter: Arc<RecordingSubmitter>,
    mentions: Arc<StaticMentions>,
}

fn me() -> ActorId {
    ActorId::new("me")
}

fn other() -> ActorId {
    ActorId::new("other")
}

fn harness() -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let submitter = Arc::new(RecordingSubmitter::new());
    let mentions = Arc::new(StaticMentions::new());
    let config = FeedConfig {
        page_size: 3,
        newer_window: 4,
        ..FeedConfig::default()
    };
    let engine = Arc::new(FeedEngine::new(
        config,
        me(),
        fetcher.clone(),
        submitter.clone(),
        mentions.clone(),
    ));
    Harness {
        engine,
        fetcher,
        submitter,
        mentions,
    }
}

/// Seed the engine with the given page.
async fn seeded(page: Vec<PostRecord>) -> Harness {
    let h = harness();
    h.fetcher.push_page(page);
    h.engine.start().await.expect("seed");
    h
}

fn ids(engine: &FeedEngine) -> Vec<String> {
    engine
        .snapshot()
        .iter()
        .map(|p| p.id.as_str().to_string())
        .collect()
}

fn like_state(engine: &FeedEngine, id: &str) -> (bool, usize) {
    let snapshot = engine.snapshot();
    let rec = snapshot
        .iter()
        .find(|p| p.id == PostId::new(id))
        .expect("post loaded");
    (rec.liked_by_actor(&me()), rec.like_count())
}

fn like_envelope(kind: &str, post: &str, actor: &ActorId) -> EventEnvelope {
    EventEnvelope {
        kind: kind.to_string(),
        post_id: Some(PostId::new(post)),
        actor: Some(actor.clone()),
        comment_id: None,
    }
}

fn comment_envelope(post: &str, comment: &str) -> EventEnvelope {
    EventEnvelope {
        kind: "comment-created".to_string(),
        post_id: Some(PostId::new(post)),
        actor: None,
        comment_id: Some(murmur_core::CommentId::new(comment)),
    }
}

// ============================================================================
// Seeding & Pagination
// ============================================================================

#[tokio::test(start_paused = true)]
async fn start_seeds_a_sorted_window() {
    let h = seeded(vec![post("p1", 100), post("p3", 300), post("p2", 200)]).await;
    assert_eq!(ids(&h.engine), vec!["p3", "p2", "p1"]);
    assert_eq!(h.engine.snapshot()[0].id, PostId::new("p3"));
    assert!(h.engine.has_more());

    // A second start is a no-op
    h.engine.start().await.expect("idempotent start");
    assert_eq!(h.fetcher.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn load_older_appends_past_the_tail() {
    let h = seeded(vec![post("p5", 500), post("p4", 400), post("p3", 300)]).await;
    h.fetcher.push_page(vec![post("p2", 200), post("p1", 100)]);

    let appended = h.engine.load_older().await.expect("load older");
    assert_eq!(appended, 2);
    assert_eq!(ids(&h.engine), vec!["p5", "p4", "p3", "p2", "p1"]);

    // Cursor was the previous tail
    let requests = h.fetcher.requests();
    assert_eq!(requests[1].older_than, Some(PostId::new("p3")));

    // The short page flipped end-of-stream; no further fetch is issued
    assert!(!h.engine.has_more());
    assert_eq!(h.engine.load_older().await.expect("noop"), 0);
    assert_eq!(h.fetcher.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_load_mutates_nothing_and_allows_retry() {
    let h = seeded(vec![post("p5", 500), post("p4", 400), post("p3", 300)]).await;
    let before = h.engine.snapshot();

    h.fetcher.push_failure("connection reset");
    let err = h.engine.load_older().await.expect_err("transport failure");
    assert_matches!(err, FeedError::Transport { .. });
    assert_eq!(h.engine.snapshot(), before);
    assert!(h.engine.has_more());
    assert_eq!(h.engine.last_error(), Some(err));

    // Retry from the consistent state succeeds and clears the error
    h.fetcher.push_page(vec![post("p2", 200), post("p1", 100)]);
    h.engine.load_older().await.expect("retry");
    assert_eq!(h.engine.last_error(), None);
}

// ============================================================================
// Realtime Reconciliation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn duplicate_like_delivery_is_idempotent() {
    let h = seeded(vec![post("p1", 100)]).await;
    let envelope = like_envelope("like-created", "p1", &other());
    h.engine.handle_event(&envelope);
    h.engine.handle_event(&envelope);
    assert_eq!(like_state(&h.engine, "p1"), (false, 1));
}

#[tokio::test(start_paused = true)]
async fn own_echo_after_optimistic_toggle_does_not_double_count() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.engine.toggle_like(&PostId::new("p1")).await.expect("like");
    assert_eq!(like_state(&h.engine, "p1"), (true, 1));

    // The server's echo of our own like arrives over the channel
    h.engine
        .handle_event(&like_envelope("like-created", "p1", &me()));
    assert_eq!(like_state(&h.engine, "p1"), (true, 1));
}

#[tokio::test(start_paused = true)]
async fn comment_count_follows_the_event_echo_exactly_once() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.engine
        .create_comment(&PostId::new("p1"), "nice post")
        .await
        .expect("comment");
    assert_eq!(
        h.submitter.calls(),
        vec![SubmitterCall::CreateComment(
            PostId::new("p1"),
            "nice post".to_string()
        )]
    );

    // Count is bumped by the authoritative event, not locally
    assert_eq!(h.engine.snapshot()[0].comment_count, 0);
    h.engine.handle_event(&comment_envelope("p1", "c1"));
    assert_eq!(h.engine.snapshot()[0].comment_count, 1);

    // At-least-once transport redelivers; the count must not move
    h.engine.handle_event(&comment_envelope("p1", "c1"));
    assert_eq!(h.engine.snapshot()[0].comment_count, 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_envelope_is_ignored() {
    let h = seeded(vec![post("p1", 100)]).await;
    let before = h.engine.snapshot();
    h.engine.handle_event(&EventEnvelope {
        kind: "like-created".to_string(),
        post_id: None,
        actor: Some(other()),
        comment_id: None,
    });
    assert_eq!(h.engine.snapshot(), before);
}

// ============================================================================
// Optimistic Toggles
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rejected_toggle_rolls_back_to_exact_previous_state() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.submitter.fail_all("500");

    let err = h
        .engine
        .toggle_like(&PostId::new("p1"))
        .await
        .expect_err("rejected");
    assert_matches!(err, FeedError::Transport { .. });
    assert_eq!(like_state(&h.engine, "p1"), (false, 0));
    assert_eq!(h.engine.last_error(), Some(err));
}

#[tokio::test(start_paused = true)]
async fn rollback_preserves_intervening_remote_like() {
    let h = seeded(vec![post_liked_by(
        "p1",
        100,
        &["f1", "f2", "f3", "f4", "f5"],
    )])
    .await;
    h.submitter.respond_after(Duration::from_secs(1));
    h.submitter.fail_all("500");

    let engine = h.engine.clone();
    let task = tokio::spawn(async move { engine.toggle_like(&PostId::new("p1")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Optimistic flip is already visible while the request is in flight
    assert_eq!(like_state(&h.engine, "p1"), (true, 6));

    // A real like from a different actor lands in between
    h.engine
        .handle_event(&like_envelope("like-created", "p1", &other()));
    assert_eq!(like_state(&h.engine, "p1"), (true, 7));

    tokio::time::sleep(Duration::from_secs(2)).await;
    task.await.expect("join").expect_err("rejected");

    // The rollback restores our flip only; the intervening like is real
    assert_eq!(like_state(&h.engine, "p1"), (false, 6));
}

#[tokio::test(start_paused = true)]
async fn double_toggle_coalesces_into_one_journal_entry() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.submitter.respond_after(Duration::from_secs(1));

    let engine = h.engine.clone();
    let first = tokio::spawn(async move { engine.toggle_like(&PostId::new("p1")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(like_state(&h.engine, "p1"), (true, 1));

    let engine = h.engine.clone();
    let second = tokio::spawn(async move { engine.toggle_like(&PostId::new("p1")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The second click undid the first before the network replied
    assert_eq!(like_state(&h.engine, "p1"), (false, 0));

    tokio::time::sleep(Duration::from_secs(3)).await;
    first.await.expect("join").expect("first resolves");
    second.await.expect("join").expect("second resolves");

    assert_eq!(like_state(&h.engine, "p1"), (false, 0));
    assert_eq!(
        h.submitter.calls(),
        vec![
            SubmitterCall::Like(PostId::new("p1"), me()),
            SubmitterCall::Unlike(PostId::new("p1"), me()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn toggle_on_scrolled_out_post_is_a_silent_noop() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.engine
        .toggle_like(&PostId::new("long-gone"))
        .await
        .expect("noop");
    assert!(h.submitter.calls().is_empty());
    assert_eq!(h.engine.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn stop_rolls_back_unresolved_mutations() {
    let h = seeded(vec![post("p1", 100)]).await;
    h.submitter.respond_after(Duration::from_secs(5));

    let engine = h.engine.clone();
    let task = tokio::spawn(async move { engine.toggle_like(&PostId::new("p1")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(like_state(&h.engine, "p1"), (true, 1));

    h.engine.stop();
    assert_eq!(like_state(&h.engine, "p1"), (false, 0));

    // The straggling resolution finds its journal entry gone and changes
    // nothing
    tokio::time::sleep(Duration::from_secs(10)).await;
    task.await.expect("join").expect("stale resolution");
    assert_eq!(like_state(&h.engine, "p1"), (false, 0));
}

// ============================================================================
// New-Items Gate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn announced_posts_stay_gated_until_merge_is_invoked() {
    let h = seeded(vec![post("p5", 500), post("p4", 400), post("p3", 300)]).await;

    for id in ["p6", "p7", "p8"] {
        h.engine
            .handle_event(&like_envelope("post-created", id, &other()));
    }
    assert_eq!(h.engine.pending_new_count(), 3);
    assert_eq!(ids(&h.engine), vec!["p5", "p4", "p3"]);

    h.fetcher.push_page(vec![
        post("p8", 800),
        post("p7", 700),
        post("p6", 600),
        post("p5", 500),
    ]);
    let merged = h.engine.merge_new_items().await.expect("merge");
    assert_eq!(merged, 3);
    assert_eq!(h.engine.pending_new_count(), 0);
    assert_eq!(ids(&h.engine), vec!["p8", "p7", "p6", "p5", "p4", "p3"]);
}

#[tokio::test(start_paused = true)]
async fn merge_scenario_advances_head_by_genuinely_new_records() {
    let h = seeded(vec![post("p5", 500), post("p4", 400), post("p3", 300)]).await;
    h.engine
        .handle_event(&like_envelope("post-created", "p6", &other()));
    h.engine
        .handle_event(&like_envelope("post-created", "p7", &other()));
    assert_eq!(h.engine.pending_new_count(), 2);

    h.fetcher.push_page(vec![
        post("p7", 700),
        post("p6", 600),
        post("p5", 500),
        post("p4", 400),
    ]);
    let merged = h.engine.merge_new_items().await.expect("merge");
    assert_eq!(merged, 2);
    assert_eq!(ids(&h.engine), vec!["p7", "p6", "p5", "p4", "p3"]);
    assert_eq!(h.engine.snapshot()[0].id, PostId::new("p7"));
    assert_eq!(h.engine.pending_new_count(), 0);

    // The merge asked for the bounded recent window, not a delta
    let request = h.fetcher.requests().last().cloned().expect("request");
    assert_eq!(request.older_than, None);
    assert_eq!(request.limit, 4);
}

#[tokio::test(start_paused = true)]
async fn own_post_creation_surfaces_through_a_bounded_merge() {
    let h = seeded(vec![post("p2", 200), post("p1", 100), post("p0", 50)]).await;
    h.fetcher
        .push_page(vec![post_by("p3", "me", 300), post("p2", 200)]);

    let surfaced = h.engine.create_post("  hello world  ").await.expect("create");
    assert_eq!(surfaced, 1);
    assert_eq!(ids(&h.engine), vec!["p3", "p2", "p1", "p0"]);
    // Content is submitted trimmed
    assert!(h
        .submitter
        .calls()
        .contains(&SubmitterCall::CreatePost("hello world".to_string())));
}

#[tokio::test(start_paused = true)]
async fn empty_content_is_rejected_before_any_submission() {
    let h = seeded(vec![post("p1", 100)]).await;
    let err = h.engine.create_post("   ").await.expect_err("rejected");
    assert_matches!(err, FeedError::Validation { .. });
    assert!(h.submitter.calls().is_empty());
    assert_eq!(h.engine.last_error(), Some(err));

    h.engine.clear_error();
    assert_eq!(h.engine.last_error(), None);
}

// ============================================================================
// Mention Enrichment
// ============================================================================

#[tokio::test(start_paused = true)]
async fn enrichment_attaches_what_resolves_within_the_budget() {
    let h = harness();
    h.mentions
        .insert(PostId::new("p1"), [Username::new("alice")]);
    h.mentions
        .insert(PostId::new("p2"), [Username::new("bob")]);
    // p2 resolves long after the 1.5s budget; p3's lookup fails outright
    h.mentions.delay(PostId::new("p2"), Duration::from_secs(30));
    h.mentions.fail(PostId::new("p3"));

    h.fetcher
        .push_page(vec![post("p3", 300), post("p2", 200), post("p1", 100)]);
    h.engine.start().await.expect("seed");

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot[2].mentions, Some([Username::new("alice")].into()));
    assert_eq!(snapshot[1].mentions, None);
    assert_eq!(snapshot[0].mentions, None);
}

// ============================================================================
// Signals & Connection State
// ============================================================================

#[tokio::test(start_paused = true)]
async fn engine_publishes_typed_signals() {
    let h = seeded(vec![post("p1", 100)]).await;
    let mut signals = h.engine.subscribe();

    h.engine
        .handle_event(&like_envelope("post-created", "p2", &other()));
    assert_eq!(
        signals.try_recv().expect("signal"),
        FeedSignal::NewItemsAvailable { count: 1 }
    );

    h.engine
        .handle_event(&like_envelope("like-created", "p1", &other()));
    assert_eq!(signals.try_recv().expect("signal"), FeedSignal::WindowChanged);

    h.engine.connection_changed(ChannelStatus::Connected);
    assert_eq!(
        signals.try_recv().expect("signal"),
        FeedSignal::ConnectionChanged(ChannelStatus::Connected)
    );
    assert_eq!(h.engine.connection_status(), ChannelStatus::Connected);

    // An unchanged status is not re-announced
    h.engine.connection_changed(ChannelStatus::Connected);
    assert!(signals.try_recv().is_err());
}
