use tracing::info;

use crate::error::AppError;
use crate::keys::{ANNOUNCEMENT_DATE, ANNOUNCEMENT_TEXT};
use crate::models::Announcement;
use crate::notify::Resource;
use crate::overrides::resolve;
use crate::repository::ContentRepository;
use crate::repository::defaults::{DEFAULT_ANNOUNCEMENT, LOG_LINE_PREFIX, MAX_LOG_LINES};

impl ContentRepository {
    pub async fn get_announcement(&self) -> Result<Announcement, AppError> {
        let text = self
            .read_raw(ANNOUNCEMENT_TEXT)
            .await?
            .filter(|t| !t.trim().is_empty());
        let date = self
            .read_raw(ANNOUNCEMENT_DATE)
            .await?
            .filter(|d| !d.trim().is_empty());

        Ok(Announcement {
            text: resolve(text, None, DEFAULT_ANNOUNCEMENT.to_string()),
            last_updated_date: resolve(date, None, self.today()),
        })
    }

    pub async fn set_announcement(&self, text: &str) -> Result<Announcement, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::validation("announcement text must not be empty"));
        }

        let announcement = Announcement {
            text: text.to_string(),
            last_updated_date: self.today(),
        };
        self.commit(Resource::Announcement, Self::announcement_writes(&announcement))
            .await?;

        info!("announcement updated");
        Ok(announcement)
    }

    /// Writes that append one change-log line to the current announcement.
    /// Only the newest `MAX_LOG_LINES` entries are kept.
    pub(super) async fn announcement_log_writes(&self, entry: &str) -> Result<Vec<(String, String)>, AppError> {
        let current = self.get_announcement().await?;
        let announcement = Announcement {
            text: append_log_line(&current.text, entry),
            last_updated_date: self.today(),
        };
        Ok(Self::announcement_writes(&announcement))
    }

    fn announcement_writes(announcement: &Announcement) -> Vec<(String, String)> {
        vec![
            (ANNOUNCEMENT_TEXT.to_string(), announcement.text.clone()),
            (ANNOUNCEMENT_DATE.to_string(), announcement.last_updated_date.clone()),
        ]
    }
}

fn append_log_line(text: &str, entry: &str) -> String {
    let (log, body): (Vec<&str>, Vec<&str>) = text
        .lines()
        .partition(|line| line.starts_with(LOG_LINE_PREFIX));
    let new_line = format!("{}{}", LOG_LINE_PREFIX, entry);
    let keep_from = (log.len() + 1).saturating_sub(MAX_LOG_LINES);

    body.into_iter()
        .map(str::to_string)
        .chain(log.into_iter().skip(keep_from).map(str::to_string))
        .chain(std::iter::once(new_line))
        .collect::<Vec<_>>()
        .join("\n")
}
