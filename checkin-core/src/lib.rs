//! # checkin-core
//!
//! Check-in scheduling and partial-update engine for Connectify.
//!
//! This crate holds the decision logic behind the relationship directory and
//! nothing else: no store, no transport, no configuration. It compiles into
//! the `connectify` service as a library dependency.
//!
//! ## Components
//!
//! - [`recurrence`]: frequency labels and their base intervals
//! - [`scheduler`]: jittered next-check-in dates with injected clock and RNG
//! - [`update`]: sparse changes to a minimal list of field assignments
//! - [`validation`]: identity and create-time checks
//! - [`types`]: the `Relationship` entity, request shapes, and `Patch<T>`

pub mod error;
pub mod recurrence;
pub mod scheduler;
pub mod types;
pub mod update;
pub mod validation;

pub use error::{CheckInError, Result};
pub use recurrence::{CheckInFrequency, days_for};
pub use scheduler::{
    Clock, FixedClock, FixedJitter, JitterSource, SeededJitter, SystemClock, ThreadJitter,
    next_check_in,
};
pub use types::{
    CreateRequest, DeleteRequest, GetRequest, KeyRequest, Patch, Relationship,
    RelationshipChanges, RelationshipKey, UpdateRequest,
};
pub use update::{
    Field, FieldAssignment, UpdateSpec, UpdateSummary, UpdatedAttributes, build_update,
};
pub use validation::{ValidCreate, validate_create, validate_identity};
