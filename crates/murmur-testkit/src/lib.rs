//! Murmur Testkit - Mock collaborators and fixtures
//!
//! Test utilities shared by the engine's unit and integration tests:
//! scripted history pages, a recording mutation submitter with failure
//! injection, a static mention table with delay injection, and fixture
//! builders for post records.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{post, post_by, post_liked_by};
pub use mocks::{RecordingSubmitter, ScriptedFetcher, StaticMentions, SubmitterCall};
