//! QA discussion notifications, reminders and preferred contacts.

use amp_lib::error::AppError;
use amp_lib::models::contact::{CreateCommentRequest, CreateContactRequest, EditCommentRequest};
use amp_lib::models::task::{ReminderRequest, TaskListQuery};
use amp_lib::db::DbPool;
use amp_lib::models::CreateCaseRequest;
use amp_lib::models::{CaseVariant, ContactPreferred, TaskType};
use amp_lib::services::{MemoryMailer, case_workflow, contacts, notifications, reminders};
use chrono::Datelike;
use serde_json::json;

use crate::test_helpers::*;

fn qa_comments() -> TaskListQuery {
    TaskListQuery {
        task_type: Some(TaskType::QaComment),
        include_read: false,
    }
}

fn contact(name: &str, preferred: ContactPreferred) -> CreateContactRequest {
    CreateContactRequest {
        name: name.to_string(),
        job_title: String::new(),
        contact_details: format!("{}@acme.example", name.to_lowercase()),
        preferred,
    }
}

#[tokio::test]
async fn test_comment_notifies_everyone_but_the_author() {
    let pool = create_test_pool().await;
    let auditor = create_user(&pool, "Alice").await;
    let reviewer = create_user(&pool, "Bob").await;
    let qa_lead = create_user(&pool, "Carol").await;
    let bystander = create_user(&pool, "Dan").await;
    pool.set_active_qa_auditor(Some(qa_lead.id)).await.unwrap();

    let case = create_case(&pool, auditor.id).await;
    case_workflow::update_case(
        &pool,
        auditor.id,
        case.id,
        &patch(1, json!({"auditor_id": auditor.id, "reviewer_id": reviewer.id})),
    )
    .await
    .unwrap();

    contacts::create_comment(
        &pool,
        reviewer.id,
        case.id,
        &CreateCommentRequest {
            body: "Please check the contrast issues".to_string(),
        },
    )
    .await
    .unwrap();

    let auditor_tasks = pool.list_tasks_for_user(auditor.id, &qa_comments()).await.unwrap();
    assert_eq!(auditor_tasks.len(), 1);
    assert!(auditor_tasks[0].description.contains("Please check the contrast issues"));
    assert_eq!(auditor_tasks[0].case_id, case.id);

    assert_eq!(pool.list_tasks_for_user(qa_lead.id, &qa_comments()).await.unwrap().len(), 1);
    assert!(pool.list_tasks_for_user(reviewer.id, &qa_comments()).await.unwrap().is_empty());
    assert!(pool.list_tasks_for_user(bystander.id, &qa_comments()).await.unwrap().is_empty());

    // A reply from the auditor reaches the earlier commenter.
    contacts::create_comment(
        &pool,
        auditor.id,
        case.id,
        &CreateCommentRequest {
            body: "Fixed".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(pool.list_tasks_for_user(reviewer.id, &qa_comments()).await.unwrap().len(), 1);
    assert_eq!(pool.list_tasks_for_user(auditor.id, &qa_comments()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_read_tasks_drop_out_of_the_default_list() {
    let pool = create_test_pool().await;
    let auditor = create_user(&pool, "Alice").await;
    let reviewer = create_user(&pool, "Bob").await;
    let case = create_case(&pool, auditor.id).await;
    case_workflow::update_case(&pool, auditor.id, case.id, &patch(1, json!({"auditor_id": auditor.id})))
        .await
        .unwrap();
    contacts::create_comment(
        &pool,
        reviewer.id,
        case.id,
        &CreateCommentRequest {
            body: "Looks good".to_string(),
        },
    )
    .await
    .unwrap();

    let task = pool.list_tasks_for_user(auditor.id, &qa_comments()).await.unwrap()[0].clone();
    assert!(matches!(
        notifications::mark_task_read(&pool, reviewer.id, task.id).await,
        Err(AppError::PermissionDenied(_))
    ));

    let read = notifications::mark_task_read(&pool, auditor.id, task.id).await.unwrap();
    assert!(read.read);
    assert!(pool.list_tasks_for_user(auditor.id, &qa_comments()).await.unwrap().is_empty());

    let all = TaskListQuery {
        task_type: None,
        include_read: true,
    };
    assert_eq!(pool.list_tasks_for_user(auditor.id, &all).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_the_author_may_edit_a_comment() {
    let pool = create_test_pool().await;
    let author = create_user(&pool, "Alice").await;
    let other = create_user(&pool, "Bob").await;
    let case = create_case(&pool, author.id).await;

    let comment = contacts::create_comment(
        &pool,
        author.id,
        case.id,
        &CreateCommentRequest {
            body: "First draft".to_string(),
        },
    )
    .await
    .unwrap();

    let denied = contacts::edit_comment(
        &pool,
        other.id,
        comment.id,
        &EditCommentRequest {
            version: comment.version,
            body: "Hijacked".to_string(),
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    let edited = contacts::edit_comment(
        &pool,
        author.id,
        comment.id,
        &EditCommentRequest {
            version: comment.version,
            body: "Second draft".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(edited.changed);
    assert_eq!(edited.instance.body, "Second draft");

    assert!(matches!(
        contacts::delete_comment(&pool, other.id, comment.id).await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let result = contacts::create_comment(
        &pool,
        user.id,
        case.id,
        &CreateCommentRequest {
            body: "   ".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_one_preferred_contact_per_case() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let first = contacts::create_contact(&pool, user.id, case.id, contact("Erin", ContactPreferred::Yes))
        .await
        .unwrap();
    contacts::create_contact(&pool, user.id, case.id, contact("Frank", ContactPreferred::Unknown))
        .await
        .unwrap();
    let third = contacts::create_contact(&pool, user.id, case.id, contact("Grace", ContactPreferred::Yes))
        .await
        .unwrap();

    let stored = pool.list_contacts(case.id).await.unwrap();
    assert_eq!(stored.len(), 3);
    let preferred: Vec<i32> = stored
        .iter()
        .filter(|c| c.preferred == ContactPreferred::Yes)
        .map(|c| c.id)
        .collect();
    assert_eq!(preferred, vec![third.id]);

    let demoted = stored.iter().find(|c| c.id == first.id).unwrap();
    assert_eq!(demoted.preferred, ContactPreferred::No);
    assert_eq!(demoted.version, 2);

    // Promoting through an update demotes the current preferred contact.
    contacts::update_contact(
        &pool,
        user.id,
        first.id,
        &patch(demoted.version, json!({"preferred": "yes"})),
    )
    .await
    .unwrap();
    let stored = pool.list_contacts(case.id).await.unwrap();
    assert_eq!(
        stored.iter().find(|c| c.id == third.id).unwrap().preferred,
        ContactPreferred::No
    );
}

#[tokio::test]
async fn test_reminder_is_replaced_not_duplicated() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let first = notifications::set_reminder(
        &pool,
        user.id,
        case.id,
        &ReminderRequest {
            date: date(2024, 7, 1),
            description: "Chase the statement".to_string(),
        },
    )
    .await
    .unwrap();
    let second = notifications::set_reminder(
        &pool,
        user.id,
        case.id,
        &ReminderRequest {
            date: date(2024, 7, 8),
            description: "Chase the statement again".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.date, date(2024, 7, 8));
    assert_eq!(second.task_type, TaskType::Reminder);

    notifications::delete_reminder(&pool, user.id, second.id).await.unwrap();
    let reminders = TaskListQuery {
        task_type: Some(TaskType::Reminder),
        include_read: true,
    };
    assert!(pool.list_tasks_for_user(user.id, &reminders).await.unwrap().is_empty());
}

async fn case_for(pool: &DbPool, auditor_id: i32, variant: CaseVariant, organisation: &str) -> i32 {
    case_workflow::create_case(
        pool,
        auditor_id,
        CreateCaseRequest {
            variant,
            auditor_id: Some(auditor_id),
            ..case_request(organisation, "https://acme.example")
        },
    )
    .await
    .unwrap()
    .id
}

async fn remind(pool: &DbPool, user_id: i32, case_id: i32, description: &str) {
    notifications::set_reminder(
        pool,
        user_id,
        case_id,
        &ReminderRequest {
            date: date(2024, 7, 1),
            description: description.to_string(),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_weekly_digest_covers_auditor_reminders_on_detailed_cases() {
    let pool = create_test_pool().await;
    let auditor = create_user(&pool, "Alice").await;
    let colleague = create_user(&pool, "Bob").await;
    let detailed = case_for(&pool, auditor.id, CaseVariant::Detailed, "Acme Council").await;
    let simplified = case_for(&pool, auditor.id, CaseVariant::Simplified, "Beta Trust").await;

    remind(&pool, auditor.id, detailed, "Chase the detailed statement").await;
    remind(&pool, auditor.id, simplified, "Chase the simplified statement").await;
    // Not the auditor of the case.
    remind(&pool, colleague.id, detailed, "Colleague note").await;
    // A QA comment is a task but not a reminder.
    contacts::create_comment(
        &pool,
        colleague.id,
        detailed,
        &CreateCommentRequest {
            body: "Please look again".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(pool.list_tasks_for_user(auditor.id, &qa_comments()).await.unwrap().len(), 1);

    let mailer = MemoryMailer::new();
    let today = date(2030, 1, 7);
    let run = reminders::send_weekly_digest(&pool, &mailer, today, today.weekday())
        .await
        .unwrap()
        .expect("digest day");
    assert_eq!(run.emails_sent, 1);
    assert_eq!(run.tasks_included, 1);

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].body.contains("Chase the detailed statement"));
    assert!(!sent[0].body.contains("Chase the simplified statement"));
    assert!(!sent[0].body.contains("Please look again"));

    let skipped = reminders::send_weekly_digest(&pool, &mailer, today, today.weekday().succ())
        .await
        .unwrap();
    assert!(skipped.is_none());
    assert_eq!(mailer.sent().await.len(), 1);
}
