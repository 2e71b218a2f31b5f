// db/reportdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::{
    cursor::ReportCursor,
    reportmodel::{CrimeReport, NewCrimeReport, NewRoadReport, RoadReport},
};

const CRIME_COLUMNS: &str = r#"
    id, user_id, user_name, category, description,
    lat, lng, location_source, street_name, status,
    vehicle_type, plate_number, brand, color, created_at
"#;

const ROAD_COLUMNS: &str = r#"
    id, user_id, user_name, description, severity,
    lat, lng, location_source, street_name, status, created_at
"#;

/// Keyset page over a newest-first report table. `$2`/`$3` are the cursor
/// position; both are NULL for the first page.
fn page_query(table: &str, columns: &str) -> String {
    format!(
        r#"
        SELECT {columns}
        FROM {table}
        WHERE ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#
    )
}

#[async_trait]
pub trait ReportExt: Send + Sync {
    async fn save_crime_report(&self, report: &NewCrimeReport) -> Result<CrimeReport, sqlx::Error>;

    async fn save_road_report(&self, report: &NewRoadReport) -> Result<RoadReport, sqlx::Error>;

    async fn get_crime_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<CrimeReport>, sqlx::Error>;

    async fn get_road_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<RoadReport>, sqlx::Error>;

    async fn get_all_crime_reports(&self) -> Result<Vec<CrimeReport>, sqlx::Error>;

    async fn get_all_road_reports(&self) -> Result<Vec<RoadReport>, sqlx::Error>;
}

#[async_trait]
impl ReportExt for DBClient {
    async fn save_crime_report(&self, report: &NewCrimeReport) -> Result<CrimeReport, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO crime_reports (
                user_id, user_name, category, description,
                lat, lng, location_source, street_name, status,
                vehicle_type, plate_number, brand, color
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            CRIME_COLUMNS
        );

        sqlx::query_as::<_, CrimeReport>(&sql)
            .bind(report.user_id)
            .bind(&report.user_name)
            .bind(report.category)
            .bind(&report.description)
            .bind(report.location.lat)
            .bind(report.location.lng)
            .bind(report.location_source)
            .bind(&report.street_name)
            .bind(report.status)
            .bind(report.vehicle_type)
            .bind(&report.plate_number)
            .bind(&report.brand)
            .bind(&report.color)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_road_report(&self, report: &NewRoadReport) -> Result<RoadReport, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO road_reports (
                user_id, user_name, description, severity,
                lat, lng, location_source, street_name, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ROAD_COLUMNS
        );

        sqlx::query_as::<_, RoadReport>(&sql)
            .bind(report.user_id)
            .bind(&report.user_name)
            .bind(&report.description)
            .bind(report.severity)
            .bind(report.location.lat)
            .bind(report.location.lng)
            .bind(report.location_source)
            .bind(&report.street_name)
            .bind(report.status)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_crime_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<CrimeReport>, sqlx::Error> {
        let sql = page_query("crime_reports", CRIME_COLUMNS);

        sqlx::query_as::<_, CrimeReport>(&sql)
            .bind(limit)
            .bind(after.map(|c| c.created_at))
            .bind(after.map(|c| c.id))
            .fetch_all(&self.pool)
            .await
    }

    async fn get_road_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<RoadReport>, sqlx::Error> {
        let sql = page_query("road_reports", ROAD_COLUMNS);

        sqlx::query_as::<_, RoadReport>(&sql)
            .bind(limit)
            .bind(after.map(|c| c.created_at))
            .bind(after.map(|c| c.id))
            .fetch_all(&self.pool)
            .await
    }

    async fn get_all_crime_reports(&self) -> Result<Vec<CrimeReport>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM crime_reports ORDER BY created_at DESC, id DESC",
            CRIME_COLUMNS
        );

        sqlx::query_as::<_, CrimeReport>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_all_road_reports(&self) -> Result<Vec<RoadReport>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM road_reports ORDER BY created_at DESC, id DESC",
            ROAD_COLUMNS
        );

        sqlx::query_as::<_, RoadReport>(&sql)
            .fetch_all(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_orders_newest_first_with_id_tiebreak() {
        let sql = page_query("road_reports", ROAD_COLUMNS);
        assert!(sql.contains("FROM road_reports"));
        assert!(sql.contains("(created_at, id) < ($2, $3)"));
        assert!(sql.contains("ORDER BY created_at DESC, id DESC"));
        assert!(sql.contains("LIMIT $1"));
    }
}
