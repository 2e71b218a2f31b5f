use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of the last record of a page in a newest-first scan.
///
/// Ordering is `(created_at DESC, id DESC)`, so the id breaks ties between
/// reports filed in the same instant and the scan stays stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCursor {
    #[serde(rename = "t")]
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl ReportCursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        ReportCursor { created_at, id }
    }

    /// Opaque form handed to clients.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// True when a record at `(created_at, id)` comes strictly after this
    /// cursor in the scan.
    pub fn precedes(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        (created_at, id) < (self.created_at, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn encoded_cursor_decodes_to_same_position() {
        let cursor = ReportCursor::new(Utc::now(), Uuid::new_v4());
        let raw = cursor.encode();
        assert!(!raw.contains('='));
        assert_eq!(ReportCursor::decode(&raw), Some(cursor));
    }

    #[test]
    fn garbage_is_not_a_cursor() {
        assert_eq!(ReportCursor::decode("not a cursor"), None);
        assert_eq!(ReportCursor::decode(""), None);
    }

    #[test]
    fn older_records_come_after_the_cursor() {
        let now = Utc::now();
        let cursor = ReportCursor::new(now, Uuid::from_u128(5));

        assert!(cursor.precedes(now - Duration::seconds(1), Uuid::from_u128(9)));
        assert!(cursor.precedes(now, Uuid::from_u128(4)));
        assert!(!cursor.precedes(now, Uuid::from_u128(5)));
        assert!(!cursor.precedes(now + Duration::seconds(1), Uuid::from_u128(1)));
    }
}
