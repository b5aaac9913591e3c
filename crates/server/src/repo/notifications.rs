use chrono::Utc;
use serde::Deserialize;

use crate::{
    db::{
        models::{Notification, PushSubscription},
        Database,
    },
    error::Result,
    policy::Actor,
};

#[derive(Debug, Deserialize)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// Durable record of a dispatched notification. Written by the dispatcher,
/// not by request handlers, so it takes a plain user id rather than an actor.
pub async fn store_notification(db: &Database, user_id: &str, message: &str) -> Result<()> {
    let _guard = db.write_guard().await;

    sqlx::query(
        "INSERT INTO notifications (id, user_id, message, is_read, created_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(super::new_id())
    .bind(user_id)
    .bind(message)
    .bind(Utc::now())
    .execute(&db.pool)
    .await?;
    Ok(())
}

pub async fn list_own_notifications(db: &Database, actor: &Actor) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC LIMIT 50",
    )
    .bind(&actor.id)
    .fetch_all(&db.pool)
    .await?;
    Ok(notifications)
}

/// Register the actor's push endpoint, replacing any previous one. Delivery
/// through the endpoint is handled by an external relay.
pub async fn save_push_subscription(
    db: &Database,
    actor: &Actor,
    subscription: NewPushSubscription,
) -> Result<()> {
    let _guard = db.write_guard().await;

    sqlx::query("DELETE FROM push_subscriptions WHERE user_id = ?")
        .bind(&actor.id)
        .execute(&db.pool)
        .await?;
    sqlx::query(
        "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(super::new_id())
    .bind(&actor.id)
    .bind(&subscription.endpoint)
    .bind(&subscription.p256dh)
    .bind(&subscription.auth)
    .bind(Utc::now())
    .execute(&db.pool)
    .await?;
    Ok(())
}

pub async fn list_own_subscriptions(db: &Database, actor: &Actor) -> Result<Vec<PushSubscription>> {
    let subscriptions = sqlx::query_as::<_, PushSubscription>(
        "SELECT * FROM push_subscriptions WHERE user_id = ?",
    )
    .bind(&actor.id)
    .fetch_all(&db.pool)
    .await?;
    Ok(subscriptions)
}
