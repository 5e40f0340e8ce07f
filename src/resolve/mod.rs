//! Resolution stage: final profile and sector for one student.

pub mod profile;
pub mod sector;

pub use profile::{base_profile, reconcile, resolve_profile};
pub use sector::resolve_sector;
