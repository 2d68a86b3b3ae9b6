//! Structured logging infrastructure
//!
//! Provides env_logger-based logging with hashed identifiers so that
//! caller identities and storage keys never appear verbatim in logs.

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;
use std::time::{SystemTime, UNIX_EPOCH};

static INIT_LOGGER: Once = Once::new();

/// Logging entry points for the engine crates
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=info` - Enable info and above (recommended for production)
    /// - `RUST_LOG=jwks_vault=debug` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a storage operation against a hashed key
    pub fn log_store_operation(operation: &str, key: &str, success: bool) {
        let key_hash = Self::secure_hash_key(key);
        if success {
            debug!("Store operation succeeded: {operation} (key_hash: {key_hash})");
        } else {
            warn!("Store operation failed: {operation} (key_hash: {key_hash})");
        }
    }

    /// Log the outcome of an engine access check
    ///
    /// The caller identity is hashed; the engine id is not sensitive.
    pub fn log_access_decision(engine_id: &str, caller: &str, granted: bool) {
        let caller_hash = Self::secure_hash_key(caller);
        if granted {
            info!("Engine access granted: {engine_id} (caller_hash: {caller_hash})");
        } else {
            warn!("Engine access denied: {engine_id} (caller_hash: {caller_hash})");
        }
    }

    /// Logs error types without exposing key material
    pub fn log_crypto_error(operation: &str, error: &dyn std::error::Error) {
        error!(
            "Cryptographic operation failed: {} (error_type: {})",
            operation,
            std::any::type_name_of_val(error)
        );
    }

    /// Log performance metrics and timing information
    pub fn log_performance_metric(operation: &str, duration_ms: u64, success: bool) {
        if success {
            debug!("Performance: {operation} completed in {duration_ms}ms");
        } else {
            warn!("Performance: {operation} failed after {duration_ms}ms");
        }
    }

    /// SHA-256 based identifier hashing for logging
    ///
    /// Returns the first 12 hex characters prefixed with `#`.
    pub fn secure_hash_key(key: &str) -> String {
        let hash = Sha256::digest(key.as_bytes());
        let hex_hash = format!("{hash:x}");
        format!("#{}", &hex_hash[..12])
    }
}

/// Logs a security-relevant event with standardized formatting
///
/// # Parameters
/// * `event_type` - Type of security event (e.g., "ENGINE_WRITE", "KEY_ROTATION")
/// * `details` - Additional details about the event
/// * `success` - Whether the operation was successful
pub fn log_security_event(event_type: &str, details: &str, success: bool) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let status = if success { "SUCCESS" } else { "FAILURE" };

    if success {
        info!("[{}] {} - {}: {}", timestamp, status, event_type, details);
    } else {
        warn!("[{}] {} - {}: {}", timestamp, status, event_type, details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_key_hashing() {
        LoggingTransformer::init_test();

        let hash1 = LoggingTransformer::secure_hash_key("private_keyalpha");
        let hash2 = LoggingTransformer::secure_hash_key("private_keybeta");

        assert_ne!(hash1, hash2);
        assert_eq!(hash1.len(), 13);
        assert!(hash1.starts_with('#'));
        assert!(!hash1.contains("alpha"));

        // Same input hashes to the same value
        assert_eq!(hash1, LoggingTransformer::secure_hash_key("private_keyalpha"));
    }

    #[test]
    fn test_logging_helpers_do_not_panic() {
        LoggingTransformer::init_test();

        LoggingTransformer::log_store_operation("put", "config/engine", true);
        LoggingTransformer::log_access_decision("engine", "bob", false);
        LoggingTransformer::log_performance_metric("generate", 12, true);
        log_security_event("ENGINE_DELETE", "engine=engine", false);
    }
}
