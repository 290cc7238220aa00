use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError};

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Core operations subject to the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageCart,
    PlaceOrder,
    ViewOrder,
    CancelOrder,
    MakePayment,
    ProcessRefund,
    AddReview,
    ManageBook,
    AdminArea,
}

/// Single policy decision point: every service entry calls this with the
/// authenticated principal, the operation, and (where relevant) the id of
/// the resource owner. Admins pass everything; owner-scoped operations
/// additionally require the principal to own the resource.
pub fn authorize(user: &AuthUser, op: Operation, owner: Option<Uuid>) -> Result<(), AppError> {
    if user.is_admin() {
        return Ok(());
    }

    let role_ok = match op {
        Operation::ManageCart
        | Operation::PlaceOrder
        | Operation::ViewOrder
        | Operation::CancelOrder
        | Operation::MakePayment
        | Operation::AddReview => user.role == ROLE_CUSTOMER,
        Operation::ManageBook => user.role == ROLE_SELLER,
        Operation::ProcessRefund | Operation::AdminArea => false,
    };
    if !role_ok {
        return Err(AppError::Forbidden);
    }

    match owner {
        Some(owner_id) if owner_id != user.user_id => Err(AppError::Forbidden),
        _ => Ok(()),
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    authorize(user, Operation::AdminArea, None)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role.clone(),
        })
    }
}
