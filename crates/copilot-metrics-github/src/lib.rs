//! GitHub access for copilot-metrics
//!
//! - [`client`]: REST client for Copilot usage, teams and memberships
//! - [`source`]: live and mock [`UsageSource`] implementations
//! - [`oauth`]: OAuth web flow endpoints
//! - [`session`]: in-memory session gateway driving the OAuth callback

pub mod client;
pub mod oauth;
pub mod session;
pub mod source;

pub use client::{GithubClient, Organization};
pub use oauth::{OAuthClient, TokenExchange, TokenResponse, TokenSet};
pub use session::{
    CallbackOutcome, CallbackParams, InstallationLister, SessionGateway, SessionId, SessionStore,
    UserInstallations,
};
pub use source::{LiveSource, MockSource, UsageSource, source_from_config};
