//! Actix-web extractor for the acting user.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use crate::config::USER_ID_HEADER;
use crate::db::DbPool;
use crate::entity::user;
use crate::error::AppError;

/// Parse the user id header value.
pub fn parse_user_id(value: Option<&str>) -> Result<i32, AppError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;
    value
        .parse()
        .map_err(|_| AppError::Unauthorized(format!("Invalid {} header", USER_ID_HEADER)))
}

/// The active user making the request.
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl Responder {
///     // user.id() is the acting user's id
/// }
/// ```
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let user_id = parse_user_id(
            req.headers()
                .get(USER_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );

        Box::pin(async move {
            let pool = pool.ok_or_else(|| {
                AppError::Database("Database pool not configured".to_string())
            })?;
            let user_id = user_id?;
            match pool.get_user(user_id).await? {
                Some(user) if user.is_active => Ok(CurrentUser(user)),
                Some(_) => Err(AppError::Unauthorized(format!("User {} is inactive", user_id))),
                None => Err(AppError::Unauthorized(format!("Unknown user {}", user_id))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(Some("42")).unwrap(), 42);
        assert_eq!(parse_user_id(Some(" 7 ")).unwrap(), 7);
        assert!(matches!(parse_user_id(None), Err(AppError::Unauthorized(_))));
        assert!(matches!(parse_user_id(Some("")), Err(AppError::Unauthorized(_))));
        assert!(matches!(parse_user_id(Some("abc")), Err(AppError::Unauthorized(_))));
    }
}
