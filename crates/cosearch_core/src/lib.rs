//! Core domain logic for the cosearch contribution catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod seed;
pub mod service;
pub mod view;

pub use config::{ConfigError, Environment, Settings};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::contribution::{
    Contribution, ContributionId, ContributionLink, ContributionUpsert,
};
pub use model::contributor::{Contributor, ContributorId, ContributorUpsert};
pub use model::review::{Review, ReviewId, ReviewUpsert};
pub use model::tag::{Tag, TagId, TagUpsert};
pub use notify::{Notifier, NotifyError};
pub use repo::{Page, RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
