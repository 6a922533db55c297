/// Minimum accepted username length at registration.
pub const MIN_USERNAME_LEN: usize = 4;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Forum that admin-console topics fall back to when no forum is given.
/// Seeded by the initial migration, so it always exists.
pub const FALLBACK_FORUM_ID: i32 = 1;

/// Session key holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";
