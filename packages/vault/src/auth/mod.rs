//! Authorization for engine reads
//!
//! A caller may read an engine when it is a privileged identity or when it
//! appears, exactly, in the engine's allowed subjects.

mod policy;

pub use policy::{AccessPolicy, ROOT_IDENTITY, is_authorized};
