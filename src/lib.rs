//! A streaming validator for documents against a schema written in the
//! compact declarative "Orderly" language.
//!
//! The schema tree ([`schema`]) is built once and shared read-only; a
//! [`validator::Validator`] drives a cursor through it in lockstep with a
//! stream of document events, either fed incrementally as wire bytes
//! ([`validator::Validator::parse_and_validate`]) or from an
//! already-materialized [`serde_json::Value`]
//! ([`validator::Validator::validate`]).

pub mod cursor;
pub mod de;
pub mod error;
pub mod event;
pub mod schema;
pub mod validator;

pub use error::{ErrorCode, ExtraInfo, ValidationError};
pub use event::{EventSink, NoopSink};
pub use schema::{build, SchemaTree};
pub use validator::{ParserConfig, Status, Validator};
