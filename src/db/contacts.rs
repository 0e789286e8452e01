//! Database operations for contacts, comments, Zendesk tickets and
//! equality-body correspondence.

use sea_orm::*;

use crate::entity::comment::{self, Entity as Comment};
use crate::entity::contact::{self, Entity as Contact};
use crate::entity::equality_body_correspondence::{self, Entity as Correspondence};
use crate::entity::zendesk_ticket::{self, Entity as ZendeskTicket};
use crate::error::{AppError, AppResult};

use super::DbPool;

pub async fn find_contact<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<contact::Model> {
    Contact::find_by_id(id)
        .filter(contact::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load contact {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Contact {}", id)))
}

/// Live contacts of a case, oldest first.
pub async fn list_contacts<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Vec<contact::Model>> {
    Contact::find()
        .filter(contact::Column::CaseId.eq(case_id))
        .filter(contact::Column::IsDeleted.eq(false))
        .order_by_asc(contact::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list contacts: {}", e)))
}

pub async fn find_comment<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<comment::Model> {
    Comment::find_by_id(id)
        .filter(comment::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load comment {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Comment {}", id)))
}

pub async fn list_comments<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Vec<comment::Model>> {
    Comment::find()
        .filter(comment::Column::CaseId.eq(case_id))
        .filter(comment::Column::IsDeleted.eq(false))
        .order_by_asc(comment::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list comments: {}", e)))
}

pub async fn find_zendesk_ticket<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> AppResult<zendesk_ticket::Model> {
    ZendeskTicket::find_by_id(id)
        .filter(zendesk_ticket::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load Zendesk ticket {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Zendesk ticket {}", id)))
}

/// Next `id_within_case` for Zendesk tickets. Deleted tickets keep their number.
pub async fn next_zendesk_ticket_number<C: ConnectionTrait>(conn: &C, case_id: i32) -> AppResult<i32> {
    let last = ZendeskTicket::find()
        .filter(zendesk_ticket::Column::CaseId.eq(case_id))
        .order_by_desc(zendesk_ticket::Column::IdWithinCase)
        .one(conn)
        .await?;
    Ok(last.map(|t| t.id_within_case + 1).unwrap_or(1))
}

pub async fn find_correspondence<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> AppResult<equality_body_correspondence::Model> {
    Correspondence::find_by_id(id)
        .filter(equality_body_correspondence::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load correspondence {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Equality body correspondence {}", id)))
}

pub async fn next_correspondence_number<C: ConnectionTrait>(conn: &C, case_id: i32) -> AppResult<i32> {
    let last = Correspondence::find()
        .filter(equality_body_correspondence::Column::CaseId.eq(case_id))
        .order_by_desc(equality_body_correspondence::Column::IdWithinCase)
        .one(conn)
        .await?;
    Ok(last.map(|c| c.id_within_case + 1).unwrap_or(1))
}

impl DbPool {
    pub async fn list_contacts(&self, case_id: i32) -> AppResult<Vec<contact::Model>> {
        list_contacts(self.connection(), case_id).await
    }

    pub async fn list_comments(&self, case_id: i32) -> AppResult<Vec<comment::Model>> {
        list_comments(self.connection(), case_id).await
    }

    pub async fn list_zendesk_tickets(&self, case_id: i32) -> AppResult<Vec<zendesk_ticket::Model>> {
        Ok(ZendeskTicket::find()
            .filter(zendesk_ticket::Column::CaseId.eq(case_id))
            .filter(zendesk_ticket::Column::IsDeleted.eq(false))
            .order_by_asc(zendesk_ticket::Column::IdWithinCase)
            .all(self.connection())
            .await?)
    }

    pub async fn list_correspondence(
        &self,
        case_id: i32,
    ) -> AppResult<Vec<equality_body_correspondence::Model>> {
        Ok(Correspondence::find()
            .filter(equality_body_correspondence::Column::CaseId.eq(case_id))
            .filter(equality_body_correspondence::Column::IsDeleted.eq(false))
            .order_by_asc(equality_body_correspondence::Column::IdWithinCase)
            .all(self.connection())
            .await?)
    }
}
