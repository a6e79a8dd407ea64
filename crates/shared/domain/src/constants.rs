//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Validation
// =============================================================================

/// Minimum length for display, first and last names
pub const MIN_NAME_LENGTH: usize = 2;

// =============================================================================
// Storage layout
// =============================================================================

/// Key prefix for user records in the key-value backend
pub const USER_KEY_PREFIX: &str = "user/";

/// Key segment between a user id and the lists it owns: `user/<id>/list/<name>`
pub const LIST_KEY_SEGMENT: &str = "/list/";

// =============================================================================
// Password hashing
// =============================================================================

/// Default Argon2 memory cost in KiB
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// Default Argon2 iteration count
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// Default Argon2 degree of parallelism
pub const DEFAULT_HASH_PARALLELISM: u32 = 1;
