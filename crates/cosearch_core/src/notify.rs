//! Chat webhook notifications for catalog events.
//!
//! # Invariants
//! - Notifications are best effort: callers log failures and never surface
//!   them to API clients.
//! - A disabled notifier performs no I/O.

use crate::config::Settings;
use crate::model::contribution::Contribution;
use reqwest::Client;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum NotifyError {
    Client(reqwest::Error),
    Request(reqwest::Error),
    Status(u16),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(err) => write!(f, "cannot build webhook client: {err}"),
            Self::Request(err) => write!(f, "webhook request failed: {err}"),
            Self::Status(status) => write!(f, "webhook answered with status {status}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Client(err) | Self::Request(err) => Some(err),
            Self::Status(_) => None,
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Outbound notifier selected from settings at startup.
#[derive(Debug, Clone)]
pub enum Notifier {
    Disabled,
    DiscordWebhook {
        client: Client,
        webhook_url: Url,
        public_url: String,
    },
}

impl Notifier {
    /// Enabled only with a webhook URL outside the `local` environment.
    pub fn from_settings(settings: &Settings) -> Result<Self, NotifyError> {
        let Some(webhook_url) = settings.discord_webhook_url.clone() else {
            return Ok(Self::Disabled);
        };
        if !settings.notifications_enabled() {
            return Ok(Self::Disabled);
        }
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self::DiscordWebhook {
            client,
            webhook_url,
            public_url: settings.public_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::DiscordWebhook { .. })
    }

    /// Announces a new contribution. No-op when disabled.
    pub async fn contribution_created(
        &self,
        contribution: &Contribution,
    ) -> Result<(), NotifyError> {
        match self {
            Self::Disabled => Ok(()),
            Self::DiscordWebhook {
                client,
                webhook_url,
                public_url,
            } => {
                let content = contribution_created_message(public_url, contribution);
                let response = client
                    .post(webhook_url.clone())
                    .json(&WebhookPayload { content: &content })
                    .send()
                    .await
                    .map_err(NotifyError::Request)?;
                if !response.status().is_success() {
                    return Err(NotifyError::Status(response.status().as_u16()));
                }
                Ok(())
            }
        }
    }
}

/// Message posted for a new contribution.
pub fn contribution_created_message(public_url: &str, contribution: &Contribution) -> String {
    format!(
        "New contribution: **{}**\n{}/contributions/{}",
        contribution.title,
        public_url.trim_end_matches('/'),
        contribution.id
    )
}

#[cfg(test)]
mod tests {
    use super::{contribution_created_message, Notifier};
    use crate::config::{Environment, Settings};
    use crate::model::contribution::Contribution;
    use chrono::NaiveDate;
    use url::Url;

    fn contribution() -> Contribution {
        Contribution {
            id: "k3x9a0pq".to_string(),
            title: "Skelet #17".to_string(),
            short_title: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            description: String::new(),
            links: Vec::new(),
            discord_chat_link: None,
            github_link: None,
            forum_link: None,
            wiki_link: None,
            archived_at: None,
            archive_reason: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn with_webhook(environment: Environment) -> Settings {
        Settings {
            environment,
            discord_webhook_url: Some(Url::parse("https://discord.test/api/webhooks/1").unwrap()),
            ..Settings::default()
        }
    }

    #[test]
    fn message_links_public_contribution_page() {
        let message = contribution_created_message("https://bbchallenge.org/", &contribution());
        assert_eq!(
            message,
            "New contribution: **Skelet #17**\nhttps://bbchallenge.org/contributions/k3x9a0pq"
        );
    }

    #[test]
    fn local_environment_disables_webhook() {
        let notifier = Notifier::from_settings(&with_webhook(Environment::Local)).unwrap();
        assert!(!notifier.is_enabled());
        let notifier = Notifier::from_settings(&with_webhook(Environment::Production)).unwrap();
        assert!(notifier.is_enabled());
    }

    #[tokio::test]
    async fn disabled_notifier_is_a_no_op() {
        Notifier::Disabled
            .contribution_created(&contribution())
            .await
            .unwrap();
    }
}
