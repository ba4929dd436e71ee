// crates/wstar-core/src/lib.rs
//
// wstar-core: Core types, events, errors, and traits for the WrappedStar
// treasury.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines account addresses, Azimuth point identifiers, the event log,
// the error taxonomy, and the trait seams between the registry, the
// treasury, and persistence.

pub mod address;
pub mod crypto;
pub mod error;
pub mod events;
pub mod point;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use wstar_core::Point;`

pub use address::Address;
pub use error::WstarError;
pub use events::{Event, EventLog, LogEntry};
pub use point::{Point, PointSize};
pub use traits::{PointReceiver, SnapshotStore, TreasuryAdmin};
