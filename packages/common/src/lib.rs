//! Common infrastructure shared by the jwks vault crates
//!
//! Currently this is the logging bootstrap and the helpers that keep
//! caller identities and storage keys out of log output.

pub mod logging;

pub use logging::{LoggingTransformer, log_security_event};
