//! Reminder and digest emails.
//!
//! Both jobs are safe to re-run: they only read tasks and send mail.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::DbPool;
use crate::entity::{task, user};
use crate::error::AppResult;
use crate::services::mailer::{EmailMessage, Mailer};

const DIGEST_TEMPLATE: &str = "Hi {{ first_name }},

{{ heading }}

{% for task in tasks %}* {{ task.date }} | {{ task.list_description }}
  {{ task.description }}
{% endfor %}
View your tasks on the platform to mark them as read.
";

/// Counts reported by a reminder run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRun {
    pub emails_sent: usize,
    pub tasks_included: usize,
    pub users_opted_out: usize,
}

/// Group tasks by the user they belong to.
pub fn group_by_user(tasks: Vec<task::Model>) -> BTreeMap<i32, Vec<task::Model>> {
    let mut grouped: BTreeMap<i32, Vec<task::Model>> = BTreeMap::new();
    for task in tasks {
        grouped.entry(task.user_id).or_default().push(task);
    }
    grouped
}

/// Render one digest email for a user.
pub fn render_digest(
    user: &user::Model,
    subject: &str,
    heading: &str,
    tasks: &[task::Model],
) -> AppResult<EmailMessage> {
    let mut context = tera::Context::new();
    context.insert("first_name", &user.first_name);
    context.insert("heading", heading);
    context.insert("tasks", tasks);
    let body = tera::Tera::one_off(DIGEST_TEMPLATE, &context, false)?;
    Ok(EmailMessage {
        to: user.email.clone(),
        subject: subject.to_string(),
        body,
    })
}

async fn send_digests(
    pool: &DbPool,
    mailer: &dyn Mailer,
    grouped: BTreeMap<i32, Vec<task::Model>>,
    subject: &str,
    heading: &str,
) -> AppResult<ReminderRun> {
    let mut run = ReminderRun::default();
    for (user_id, tasks) in grouped {
        let Some(user) = pool.get_user(user_id).await? else {
            warn!(user_id, "Skipping reminders for unknown user");
            continue;
        };
        if !user.is_active {
            continue;
        }
        if !pool.email_notifications_enabled(user_id).await? {
            run.users_opted_out += 1;
            continue;
        }
        let message = render_digest(&user, subject, heading, &tasks)?;
        mailer.send(&message).await?;
        run.emails_sent += 1;
        run.tasks_included += tasks.len();
    }
    Ok(run)
}

/// Email every user their reminders due on `today`.
pub async fn send_due_reminders(
    pool: &DbPool,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> AppResult<ReminderRun> {
    let grouped = group_by_user(pool.list_due_reminders(today).await?);
    let run = send_digests(
        pool,
        mailer,
        grouped,
        "You have reminders due today",
        "These reminders are due today:",
    )
    .await?;
    info!(
        date = %today,
        emails = run.emails_sent,
        tasks = run.tasks_included,
        opted_out = run.users_opted_out,
        "Reminder emails sent"
    );
    Ok(run)
}

/// Email each auditor a digest of their outstanding reminders on detailed
/// cases, on the configured day of the week only.
pub async fn send_weekly_digest(
    pool: &DbPool,
    mailer: &dyn Mailer,
    today: NaiveDate,
    weekday: Weekday,
) -> AppResult<Option<ReminderRun>> {
    if today.weekday() != weekday {
        info!(date = %today, weekday = %weekday, "Not the digest day, nothing sent");
        return Ok(None);
    }
    let grouped = group_by_user(pool.list_weekly_digest_reminders(today).await?);
    let run = send_digests(
        pool,
        mailer,
        grouped,
        "Your outstanding reminders",
        "You have these reminders on your detailed cases:",
    )
    .await?;
    info!(date = %today, emails = run.emails_sent, "Weekly task digest sent");
    Ok(Some(run))
}
