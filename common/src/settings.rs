use crate::store::{LocalStore, RECIPIENT_EMAIL_KEY, SCHEDULED_TIME_KEY};
use anyhow::{anyhow, Result};
use chrono::NaiveTime;

/// Digest preferences edited through the settings dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub recipient_email: String,
    pub scheduled_time: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recipient_email: String::new(),
            scheduled_time: crate::DEFAULT_SCHEDULED_TIME.to_string(),
        }
    }
}

impl Settings {
    pub fn load(store: &LocalStore) -> Self {
        let defaults = Self::default();
        Self {
            recipient_email: store
                .get_item(RECIPIENT_EMAIL_KEY)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.recipient_email),
            scheduled_time: store
                .get_item(SCHEDULED_TIME_KEY)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.scheduled_time),
        }
    }

    pub fn validate(&self) -> Result<()> {
        NaiveTime::parse_from_str(&self.scheduled_time, "%H:%M")
            .map_err(|_| anyhow!("Invalid time '{}'. Use HH:MM", self.scheduled_time))?;

        if !self.recipient_email.is_empty() {
            let mut parts = self.recipient_email.split('@');
            let valid = matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
            );
            if !valid {
                return Err(anyhow!("Invalid email address: {}", self.recipient_email));
            }
        }
        Ok(())
    }

    pub fn save(&self, store: &mut LocalStore) -> Result<()> {
        self.validate()?;
        store.set_item(RECIPIENT_EMAIL_KEY, self.recipient_email.as_str())?;
        store.set_item(SCHEDULED_TIME_KEY, self.scheduled_time.as_str())?;
        log::info!("Saved settings to {:?}", store.path());
        Ok(())
    }
}
