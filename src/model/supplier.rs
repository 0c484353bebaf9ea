use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Supplier {
    pub id: u64,
    #[schema(example = "Nile Travel Wholesale")]
    pub name: String,
    pub phone: Option<String>,
}
