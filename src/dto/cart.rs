use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Book;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub book_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineDto {
    pub id: Uuid,
    pub book: Book,
    pub quantity: i32,
    pub subtotal: i64,
}

/// The buyer's cart as one aggregate: lines plus the derived total,
/// recomputed from current book prices on every read.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartDto {
    pub items: Vec<CartLineDto>,
    pub total_amount: i64,
}
