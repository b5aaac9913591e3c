// Notification dispatch. Fire-and-forget: delivery failures are logged and
// never affect the operation that triggered them.

use crate::{
    db::Database,
    repo::{notifications, users},
};

#[derive(Clone)]
pub struct Notifier {
    db: Database,
    http: reqwest::Client,
    telegram_bot_token: Option<String>,
}

impl Notifier {
    pub fn new(db: Database, telegram_bot_token: Option<String>) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            telegram_bot_token,
        }
    }

    /// Record the notification durably, then push it to Telegram when the
    /// user has linked a chat. Returns immediately; the work runs on its own
    /// task.
    pub fn dispatch(&self, user_id: &str, message: &str) {
        let notifier = self.clone();
        let user_id = user_id.to_string();
        let message = message.to_string();

        tokio::spawn(async move {
            if let Err(err) = notifications::store_notification(&notifier.db, &user_id, &message).await
            {
                tracing::warn!(%err, user_id, "failed to store notification");
            }

            let Some(token) = notifier.telegram_bot_token.as_deref() else {
                return;
            };
            let chat_id = match users::find_by_id(&notifier.db, &user_id).await {
                Ok(Some(user)) => user.telegram_chat_id,
                Ok(None) => None,
                Err(err) => {
                    tracing::warn!(%err, user_id, "failed to look up notification target");
                    None
                }
            };
            let Some(chat_id) = chat_id else { return };

            let url = format!("https://api.telegram.org/bot{token}/sendMessage");
            let result = notifier
                .http
                .post(&url)
                .json(&serde_json::json!({
                    "chat_id": chat_id,
                    "text": message,
                }))
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), user_id, "telegram rejected notification");
                }
                Err(err) => {
                    tracing::warn!(%err, user_id, "telegram notification failed");
                }
                _ => {}
            }
        });
    }
}
