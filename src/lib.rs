//! # Portero (Session Edge for an Upstream Identity API)
//!
//! `portero` sits between the browser and an upstream identity/API service. The
//! browser only ever sees two `HttpOnly` cookies (access and refresh credential);
//! `portero` attaches the access credential as a bearer token on outbound calls
//! and refreshes it transparently when the upstream answers `401`.
//!
//! ## Refresh Coordination
//!
//! Concurrent requests carrying the same refresh cookie share a single refresh
//! call. The first caller spawns the refresh and registers a shared ticket keyed
//! by a hash of the refresh credential; later callers await the same ticket and
//! observe the same outcome. The ticket is removed as soon as the refresh
//! finishes, so the next expiry starts a fresh call.
//!
//! - **Retry Budget:** an authenticated call is retried at most once, with the
//!   token produced by the refresh it triggered or joined.
//! - **Failure:** a rejected refresh clears both cookies and surfaces
//!   `401 Session expired`.
//!
//! > **Note:** the ticket table lives in process memory. Several `portero`
//! > instances behind a load balancer do not deduplicate refreshes between them.

pub mod api;
pub mod cli;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
