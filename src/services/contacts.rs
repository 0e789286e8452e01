//! Contacts, QA discussion comments, Zendesk tickets and equality-body
//! correspondence of a case.

use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::db::cases::find_case;
use crate::db::contacts::{
    find_comment, find_contact, find_correspondence, find_zendesk_ticket, list_contacts,
    next_correspondence_number, next_zendesk_ticket_number,
};
use crate::db::history::record_create;
use crate::db::{self, DbPool, check_version, save_versioned};
use crate::entity::comment::{self, Entity as Comment};
use crate::entity::contact::{self, Entity as Contact};
use crate::entity::equality_body_correspondence::{self, Entity as Correspondence};
use crate::entity::zendesk_ticket::{self, Entity as ZendeskTicket};
use crate::error::{AppError, AppResult};
use crate::models::contact::{
    CreateCommentRequest, CreateContactRequest, CreateCorrespondenceRequest,
    CreateZendeskTicketRequest, EditCommentRequest,
};
use crate::models::{
    ContactPreferred, CorrespondenceStatus, EntityRef, SaveOutcome, VersionedUpdate,
};
use crate::services::history::apply_patch;
use crate::services::notifications::create_qa_comment_tasks;

const CHILD_PROTECTED: &[&str] = &["case_id", "id_within_case", "is_deleted"];

fn outcome<M: Clone>(current: &M, saved: Option<M>) -> SaveOutcome<M> {
    let changed = saved.is_some();
    SaveOutcome {
        instance: saved.unwrap_or_else(|| current.clone()),
        changed,
        messages: Vec::new(),
        next_page_url: None,
    }
}

/// Demote every other preferred contact of the case.
async fn demote_preferred<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
    keep_id: i32,
) -> AppResult<()> {
    for other in list_contacts(conn, case_id)
        .await?
        .into_iter()
        .filter(|c| c.id != keep_id && c.preferred == ContactPreferred::Yes)
    {
        let edited = contact::Model {
            preferred: ContactPreferred::No,
            ..other.clone()
        };
        save_versioned::<Contact, contact::ActiveModel, _>(
            conn,
            EntityRef::Contact(other.id),
            Some(case_id),
            Some(user_id),
            &other,
            edited,
            contact::Column::Id,
            contact::Column::Version,
        )
        .await?;
    }
    Ok(())
}

pub async fn create_contact(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: CreateContactRequest,
) -> AppResult<contact::Model> {
    let txn = pool.begin().await?;
    find_case(&txn, case_id).await?;
    let now = Utc::now();
    let contact = contact::ActiveModel {
        case_id: Set(case_id),
        name: Set(request.name),
        job_title: Set(request.job_title),
        contact_details: Set(request.contact_details),
        preferred: Set(request.preferred),
        version: Set(1),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create contact: {}", e)))?;
    record_create(&txn, EntityRef::Contact(contact.id), Some(case_id), Some(user_id), &contact)
        .await?;

    if contact.preferred == ContactPreferred::Yes {
        demote_preferred(&txn, user_id, case_id, contact.id).await?;
    }
    db::commit(txn).await?;
    Ok(contact)
}

pub async fn update_contact(
    pool: &DbPool,
    user_id: i32,
    contact_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<contact::Model>> {
    let txn = pool.begin().await?;
    let current = find_contact(&txn, contact_id).await?;
    check_version("Contact", contact_id, current.version, update.version)?;
    let edited: contact::Model = apply_patch(&current, &update.fields, CHILD_PROTECTED)?;

    let saved = save_versioned::<Contact, contact::ActiveModel, _>(
        &txn,
        EntityRef::Contact(contact_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        contact::Column::Id,
        contact::Column::Version,
    )
    .await?
    .map(|s| s.model);

    if let Some(saved) = &saved
        && saved.preferred == ContactPreferred::Yes
        && current.preferred != ContactPreferred::Yes
    {
        demote_preferred(&txn, user_id, current.case_id, contact_id).await?;
    }
    db::commit(txn).await?;
    Ok(outcome(&current, saved))
}

pub async fn delete_contact(pool: &DbPool, user_id: i32, contact_id: i32, version: i32) -> AppResult<()> {
    let txn = pool.begin().await?;
    let current = find_contact(&txn, contact_id).await?;
    check_version("Contact", contact_id, current.version, version)?;
    let edited = contact::Model {
        is_deleted: true,
        ..current.clone()
    };
    save_versioned::<Contact, contact::ActiveModel, _>(
        &txn,
        EntityRef::Contact(contact_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        contact::Column::Id,
        contact::Column::Version,
    )
    .await?;
    db::commit(txn).await?;
    Ok(())
}

/// Add a QA discussion comment and notify the other participants.
pub async fn create_comment(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: &CreateCommentRequest,
) -> AppResult<comment::Model> {
    let body = request.body.trim();
    if body.is_empty() {
        return Err(AppError::field("body", "Enter a comment"));
    }
    let platform = pool.get_platform().await?;

    let txn = pool.begin().await?;
    let case = find_case(&txn, case_id).await?;
    let now = Utc::now();
    let comment = comment::ActiveModel {
        case_id: Set(case_id),
        user_id: Set(user_id),
        body: Set(body.to_string()),
        version: Set(1),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create comment: {}", e)))?;
    record_create(&txn, EntityRef::Comment(comment.id), Some(case_id), Some(user_id), &comment)
        .await?;

    create_qa_comment_tasks(&txn, &case, &comment, platform.active_qa_auditor_id).await?;
    db::commit(txn).await?;
    info!(case_id, comment_id = comment.id, user_id, "Comment added");
    Ok(comment)
}

fn ensure_author(comment: &comment::Model, user_id: i32) -> AppResult<()> {
    if comment.user_id != user_id {
        return Err(AppError::PermissionDenied(format!(
            "Comment {} can only be changed by its author",
            comment.id
        )));
    }
    Ok(())
}

/// Edit a comment. Only its author may do so.
pub async fn edit_comment(
    pool: &DbPool,
    user_id: i32,
    comment_id: i32,
    request: &EditCommentRequest,
) -> AppResult<SaveOutcome<comment::Model>> {
    let txn = pool.begin().await?;
    let current = find_comment(&txn, comment_id).await?;
    ensure_author(&current, user_id)?;
    check_version("Comment", comment_id, current.version, request.version)?;
    if request.body.trim().is_empty() {
        return Err(AppError::field("body", "Enter a comment"));
    }
    let edited = comment::Model {
        body: request.body.trim().to_string(),
        ..current.clone()
    };
    let saved = save_versioned::<Comment, comment::ActiveModel, _>(
        &txn,
        EntityRef::Comment(comment_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        comment::Column::Id,
        comment::Column::Version,
    )
    .await?
    .map(|s| s.model);
    db::commit(txn).await?;
    Ok(outcome(&current, saved))
}

pub async fn delete_comment(pool: &DbPool, user_id: i32, comment_id: i32) -> AppResult<()> {
    let txn = pool.begin().await?;
    let current = find_comment(&txn, comment_id).await?;
    ensure_author(&current, user_id)?;
    let edited = comment::Model {
        is_deleted: true,
        ..current.clone()
    };
    save_versioned::<Comment, comment::ActiveModel, _>(
        &txn,
        EntityRef::Comment(comment_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        comment::Column::Id,
        comment::Column::Version,
    )
    .await?;
    db::commit(txn).await?;
    Ok(())
}

pub async fn create_zendesk_ticket(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: CreateZendeskTicketRequest,
) -> AppResult<zendesk_ticket::Model> {
    if request.url.trim().is_empty() {
        return Err(AppError::field("url", "Enter the Zendesk ticket URL"));
    }
    let txn = pool.begin().await?;
    find_case(&txn, case_id).await?;
    let now = Utc::now();
    let ticket = zendesk_ticket::ActiveModel {
        case_id: Set(case_id),
        id_within_case: Set(next_zendesk_ticket_number(&txn, case_id).await?),
        url: Set(request.url.trim().to_string()),
        summary: Set(request.summary),
        version: Set(1),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create Zendesk ticket: {}", e)))?;
    record_create(&txn, EntityRef::ZendeskTicket(ticket.id), Some(case_id), Some(user_id), &ticket)
        .await?;
    db::commit(txn).await?;
    Ok(ticket)
}

/// Versioned update of a Zendesk ticket; `is_deleted` may be set here to
/// remove it.
pub async fn update_zendesk_ticket(
    pool: &DbPool,
    user_id: i32,
    ticket_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<zendesk_ticket::Model>> {
    let txn = pool.begin().await?;
    let current = find_zendesk_ticket(&txn, ticket_id).await?;
    check_version("Zendesk ticket", ticket_id, current.version, update.version)?;
    let edited: zendesk_ticket::Model =
        apply_patch(&current, &update.fields, &["case_id", "id_within_case"])?;
    let saved = save_versioned::<ZendeskTicket, zendesk_ticket::ActiveModel, _>(
        &txn,
        EntityRef::ZendeskTicket(ticket_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        zendesk_ticket::Column::Id,
        zendesk_ticket::Column::Version,
    )
    .await?
    .map(|s| s.model);
    db::commit(txn).await?;
    Ok(outcome(&current, saved))
}

pub async fn create_correspondence(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: CreateCorrespondenceRequest,
) -> AppResult<equality_body_correspondence::Model> {
    if request.message.trim().is_empty() {
        return Err(AppError::field("message", "Enter the message"));
    }
    let txn = pool.begin().await?;
    find_case(&txn, case_id).await?;
    let now = Utc::now();
    let correspondence = equality_body_correspondence::ActiveModel {
        case_id: Set(case_id),
        id_within_case: Set(next_correspondence_number(&txn, case_id).await?),
        version: Set(1),
        correspondence_type: Set(request.correspondence_type),
        status: Set(CorrespondenceStatus::Unresolved),
        message: Set(request.message),
        notes: Set(request.notes),
        zendesk_url: Set(request.zendesk_url),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create correspondence: {}", e)))?;
    record_create(
        &txn,
        EntityRef::EqualityBodyCorrespondence(correspondence.id),
        Some(case_id),
        Some(user_id),
        &correspondence,
    )
    .await?;
    db::commit(txn).await?;
    Ok(correspondence)
}

async fn save_correspondence<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    current: &equality_body_correspondence::Model,
    edited: equality_body_correspondence::Model,
) -> AppResult<Option<equality_body_correspondence::Model>> {
    Ok(save_versioned::<Correspondence, equality_body_correspondence::ActiveModel, _>(
        conn,
        EntityRef::EqualityBodyCorrespondence(current.id),
        Some(current.case_id),
        Some(user_id),
        current,
        edited,
        equality_body_correspondence::Column::Id,
        equality_body_correspondence::Column::Version,
    )
    .await?
    .map(|s| s.model))
}

pub async fn update_correspondence(
    pool: &DbPool,
    user_id: i32,
    correspondence_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<equality_body_correspondence::Model>> {
    let txn = pool.begin().await?;
    let current = find_correspondence(&txn, correspondence_id).await?;
    check_version("Equality body correspondence", correspondence_id, current.version, update.version)?;
    let edited: equality_body_correspondence::Model =
        apply_patch(&current, &update.fields, &["case_id", "id_within_case"])?;
    let saved = save_correspondence(&txn, user_id, &current, edited).await?;
    db::commit(txn).await?;
    Ok(outcome(&current, saved))
}

/// Flip a correspondence between resolved and unresolved.
pub async fn toggle_correspondence_status(
    pool: &DbPool,
    user_id: i32,
    correspondence_id: i32,
    version: i32,
) -> AppResult<equality_body_correspondence::Model> {
    let txn = pool.begin().await?;
    let current = find_correspondence(&txn, correspondence_id).await?;
    check_version("Equality body correspondence", correspondence_id, current.version, version)?;
    let status = match current.status {
        CorrespondenceStatus::Unresolved => CorrespondenceStatus::Resolved,
        CorrespondenceStatus::Resolved => CorrespondenceStatus::Unresolved,
    };
    let edited = equality_body_correspondence::Model {
        status,
        ..current.clone()
    };
    let saved = save_correspondence(&txn, user_id, &current, edited).await?;
    db::commit(txn).await?;
    Ok(saved.unwrap_or(current))
}

/// The preferred contact of a case, else its first contact.
pub fn primary_contact(contacts: &[contact::Model]) -> Option<&contact::Model> {
    contacts
        .iter()
        .find(|c| c.preferred == ContactPreferred::Yes)
        .or_else(|| contacts.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_contact_prefers_preferred() {
        let contacts = vec![
            contact::Model {
                id: 1,
                ..Default::default()
            },
            contact::Model {
                id: 2,
                preferred: ContactPreferred::Yes,
                ..Default::default()
            },
        ];
        assert_eq!(primary_contact(&contacts).map(|c| c.id), Some(2));
        assert_eq!(primary_contact(&contacts[..1]).map(|c| c.id), Some(1));
        assert!(primary_contact(&[]).is_none());
    }
}
