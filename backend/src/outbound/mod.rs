//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed statement executor
//!
//! Adapters are thin translators between domain types and driver types. They
//! contain no bootstrap logic.

pub mod persistence;
