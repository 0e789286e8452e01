//! Database operations for users, notification settings and platform settings.

use chrono::Utc;
use sea_orm::*;

use crate::entity::notification_setting::{self, Entity as NotificationSetting};
use crate::entity::platform::{self, Entity as Platform};
use crate::entity::user::{self, Entity as User};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Find an active user by id.
    pub async fn get_user(&self, id: i32) -> AppResult<Option<user::Model>> {
        let result = User::find_by_id(id)
            .filter(user::Column::IsActive.eq(true))
            .one(self.connection())
            .await?;
        Ok(result)
    }

    pub async fn list_users(&self) -> AppResult<Vec<user::Model>> {
        let users = User::find()
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::FirstName)
            .order_by_asc(user::Column::LastName)
            .all(self.connection())
            .await?;
        Ok(users)
    }

    /// Create a user. Used by the management CLI and test fixtures.
    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> AppResult<user::Model> {
        user::ActiveModel {
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            email: Set(email.to_lowercase()),
            is_active: Set(true),
            created: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to create user {}: {}", email, e)))
    }

    /// Whether a user wants notification emails. Users without a settings
    /// row are treated as opted in.
    pub async fn email_notifications_enabled(&self, user_id: i32) -> AppResult<bool> {
        let setting = NotificationSetting::find()
            .filter(notification_setting::Column::UserId.eq(user_id))
            .one(self.connection())
            .await?;
        Ok(setting.is_none_or(|s| s.email_notifications_enabled))
    }

    pub async fn set_email_notifications(&self, user_id: i32, enabled: bool) -> AppResult<()> {
        let existing = NotificationSetting::find()
            .filter(notification_setting::Column::UserId.eq(user_id))
            .one(self.connection())
            .await?;

        match existing {
            Some(setting) => {
                let mut active: notification_setting::ActiveModel = setting.into();
                active.email_notifications_enabled = Set(enabled);
                active.update(self.connection()).await?;
            }
            None => {
                notification_setting::ActiveModel {
                    user_id: Set(user_id),
                    email_notifications_enabled: Set(enabled),
                    ..Default::default()
                }
                .insert(self.connection())
                .await?;
            }
        }
        Ok(())
    }

    /// Create a notification settings row for every user lacking one.
    ///
    /// Returns the number of rows created.
    pub async fn backfill_notification_settings(&self) -> AppResult<usize> {
        let users = User::find().all(self.connection()).await?;
        let existing: Vec<i32> = NotificationSetting::find()
            .all(self.connection())
            .await?
            .into_iter()
            .map(|s| s.user_id)
            .collect();

        let mut created = 0;
        for user in users.iter().filter(|u| !existing.contains(&u.id)) {
            notification_setting::ActiveModel {
                user_id: Set(user.id),
                email_notifications_enabled: Set(true),
                ..Default::default()
            }
            .insert(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add notification settings for user {}: {}",
                    user.id, e
                ))
            })?;
            created += 1;
        }
        Ok(created)
    }

    /// The platform settings singleton, created on first access.
    pub async fn get_platform(&self) -> AppResult<platform::Model> {
        if let Some(existing) = Platform::find()
            .order_by_asc(platform::Column::Id)
            .one(self.connection())
            .await?
        {
            return Ok(existing);
        }

        platform::ActiveModel {
            active_qa_auditor_id: Set(None),
            footer_links: Set(String::new()),
            updated: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to create platform settings: {}", e)))
    }

    pub async fn set_active_qa_auditor(&self, user_id: Option<i32>) -> AppResult<platform::Model> {
        let current = self.get_platform().await?;
        let mut active: platform::ActiveModel = current.into();
        active.active_qa_auditor_id = Set(user_id);
        active.updated = Set(Utc::now());
        Ok(active.update(self.connection()).await?)
    }
}
