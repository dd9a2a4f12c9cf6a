use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Disease {
    pub id: i64,
    pub name: String,
}
