pub mod attachments;
pub mod auth;
pub mod comments;
pub mod companies;
pub mod messages;
pub mod notifications;
pub mod reminders;
pub mod tasks;
pub mod users;
