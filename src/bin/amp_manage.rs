//! Management commands for the accessibility monitoring platform.
//!
//! Usage:
//!   cargo run --bin amp-manage -- email-reminders
//!   cargo run --bin amp-manage -- send-reminders-email
//!   cargo run --bin amp-manage -- load-report-templates-csv [--initial] [--path <csv>]
//!   cargo run --bin amp-manage -- add-users-to-email-notification-table
//!   cargo run --bin amp-manage -- create-s3-documents
//!   cargo run --bin amp-manage -- list-s3-files [--prefix <prefix>]

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use amp_lib::config::{Config, Environment};
use amp_lib::db::DbPool;
use amp_lib::services::{LogMailer, S3BlobStore, publisher, reminders, templates_loader};

#[derive(Parser)]
#[command(name = "amp-manage")]
#[command(about = "Maintenance commands for the accessibility monitoring platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Email users the reminders due today
    #[command(name = "email_reminders", visible_alias = "email-reminders")]
    EmailReminders,

    /// Email users a digest of unread tasks (only on the configured weekday)
    #[command(name = "send_reminders_email", visible_alias = "send-reminders-email")]
    SendRemindersEmail,

    /// Load report base templates from CSV
    #[command(
        name = "load_report_templates_csv",
        visible_alias = "load-report-templates-csv"
    )]
    LoadReportTemplatesCsv {
        /// Replace the whole catalogue, removing templates not in the file
        #[arg(long)]
        initial: bool,

        /// CSV file (defaults to AMP_REPORT_TEMPLATES_CSV)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Create notification settings for users lacking them
    #[command(
        name = "add_users_to_email_notification_table",
        visible_alias = "add-users-to-email-notification-table"
    )]
    AddUsersToEmailNotificationTable,

    /// Write published reports missing from S3 (development only)
    #[command(name = "create_s3_documents", visible_alias = "create-s3-documents")]
    CreateS3Documents,

    /// List objects in the report bucket (development only)
    #[command(name = "list_s3_files", visible_alias = "list-s3-files")]
    ListS3Files {
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::EmailReminders => email_reminders(&pool).await,
        Command::SendRemindersEmail => {
            if production_only(config.environment, "send_reminders_email") {
                send_reminders_email(&pool, &config).await;
            }
        }
        Command::LoadReportTemplatesCsv { initial, path } => {
            let path = path.unwrap_or_else(|| config.report_templates_csv.clone());
            load_report_templates(&pool, &path, initial).await;
        }
        Command::AddUsersToEmailNotificationTable => add_notification_settings(&pool).await,
        Command::CreateS3Documents => {
            refuse_in_production(&config, "create_s3_documents");
            create_s3_documents(&pool, &config).await;
        }
        Command::ListS3Files { prefix } => {
            refuse_in_production(&config, "list_s3_files");
            list_s3_files(&config, &prefix).await;
        }
    }
}

fn refuse_in_production(config: &Config, command: &str) {
    if config.is_production() {
        eprintln!("{} must not be run in production.", command);
        std::process::exit(1);
    }
}

/// Whether a command that emails real users may run here.
fn production_only(environment: Environment, command: &str) -> bool {
    if !environment.is_production() {
        println!("{} only runs in production; nothing sent.", command);
        return false;
    }
    true
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("Error {}: {}", context, e);
    std::process::exit(1);
}

async fn email_reminders(pool: &DbPool) {
    let today = Utc::now().date_naive();
    match reminders::send_due_reminders(pool, &LogMailer, today).await {
        Ok(run) => println!(
            "Sent {} reminder emails covering {} tasks ({} users opted out).",
            run.emails_sent, run.tasks_included, run.users_opted_out
        ),
        Err(e) => fail("sending reminders", e),
    }
}

async fn send_reminders_email(pool: &DbPool, config: &Config) {
    let today = Utc::now().date_naive();
    match reminders::send_weekly_digest(pool, &LogMailer, today, config.reminder_weekday).await {
        Ok(Some(run)) => println!(
            "Sent {} digest emails covering {} tasks.",
            run.emails_sent, run.tasks_included
        ),
        Ok(None) => println!(
            "Today is not {}; no digest sent.",
            config.reminder_weekday
        ),
        Err(e) => fail("sending task digest", e),
    }
}

async fn load_report_templates(pool: &DbPool, path: &std::path::Path, initial: bool) {
    match templates_loader::load_templates_file(pool, path, initial).await {
        Ok((created, updated)) => println!(
            "Loaded {}: {} created, {} updated.",
            path.display(),
            created,
            updated
        ),
        Err(e) => fail("loading report templates", e),
    }
}

async fn add_notification_settings(pool: &DbPool) {
    match pool.backfill_notification_settings().await {
        Ok(0) => println!("Every user already has notification settings."),
        Ok(created) => println!("Added notification settings for {} users.", created),
        Err(e) => fail("adding notification settings", e),
    }
}

async fn create_s3_documents(pool: &DbPool, config: &Config) {
    let store = match S3BlobStore::new(&config.s3).await {
        Ok(s) => s,
        Err(e) => fail("connecting to S3", e),
    };
    match publisher::create_missing_documents(pool, &store).await {
        Ok(written) => println!("Wrote {} missing documents to S3.", written),
        Err(e) => fail("creating S3 documents", e),
    }
}

async fn list_s3_files(config: &Config, prefix: &str) {
    use amp_lib::services::BlobStore;

    let store = match S3BlobStore::new(&config.s3).await {
        Ok(s) => s,
        Err(e) => fail("connecting to S3", e),
    };
    let keys = match store.list(prefix).await {
        Ok(k) => k,
        Err(e) => fail("listing S3 files", e),
    };

    if keys.is_empty() {
        println!("No files found.");
        return;
    }
    for key in &keys {
        println!("{}", key);
    }
    println!();
    println!("{} files", keys.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_only_sent_from_production() {
        assert!(!production_only(Environment::Development, "send_reminders_email"));
        assert!(production_only(Environment::Production, "send_reminders_email"));
    }
}
