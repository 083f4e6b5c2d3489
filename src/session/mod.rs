//! Credential handling between the browser cookies and the upstream API.
//!
//! - [`CookieStore`] reads and writes the two credential cookies for one exchange.
//! - [`RefreshCoordinator`] deduplicates concurrent refreshes per session.
//! - [`UpstreamClient`] talks to the upstream refresh, registration and API endpoints.
//! - [`Gateway`] ties them together: authenticated calls with one retry after refresh.

mod cookies;
mod coordinator;
mod credentials;
mod error;
mod gateway;
pub mod register;
mod upstream;

pub use cookies::{CookieConfig, CookieStore};
pub use coordinator::{RefreshCoordinator, RefreshOutcome, RefreshTicket, TokenRefresher};
pub use credentials::{CredentialPair, SessionKey};
pub use error::AuthError;
pub use gateway::Gateway;
pub use register::{RegisterForm, RegisterRequest};
pub use upstream::{UpstreamClient, UpstreamRequest};
