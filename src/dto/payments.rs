use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, Payment};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MakePaymentRequest {
    pub order_id: Uuid,
    pub payment_method: String,
    /// Gateway confirmation; mandatory for every method except COD.
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDto {
    pub payment: Payment,
    pub order: Order,
}
