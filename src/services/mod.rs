//! Business logic services.

pub mod audit;
pub mod case_workflow;
pub mod contacts;
pub mod email_templates;
pub mod equality_body_export;
pub mod history;
pub mod identifiers;
pub mod mailer;
pub mod notifications;
pub mod publisher;
pub mod reminders;
pub mod report_generator;
pub mod retests;
pub mod scheduler;
pub mod status;
pub mod status_refresh;
pub mod storage;
pub mod templates_loader;
pub mod url_check;

pub use mailer::{LogMailer, Mailer, MemoryMailer};
pub use status_refresh::{StatusRefreshConfig, start_status_refresh_task};
pub use storage::{BlobStore, MemoryBlobStore, S3BlobStore};
