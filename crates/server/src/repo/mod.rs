//! Tenant-scoped data access. Every operation takes the acting [`Actor`] and
//! enforces role policy, tenant scope, and lifecycle rules in the same
//! mutual-exclusion span as the write. Scope filters are part of the SQL
//! itself; nothing is fetched unscoped and filtered afterwards.
//!
//! [`Actor`]: crate::policy::Actor

pub mod attachments;
pub mod comments;
pub mod companies;
pub mod messages;
pub mod notifications;
pub mod reminders;
pub mod tasks;
pub mod users;

use uuid::Uuid;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
