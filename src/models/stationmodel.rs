use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reportmodel::GeoPoint;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PoliceStation {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    #[sqlx(flatten)]
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
}
