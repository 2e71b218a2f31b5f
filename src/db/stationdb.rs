// db/stationdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::{reportmodel::GeoPoint, stationmodel::PoliceStation};

#[async_trait]
pub trait StationExt: Send + Sync {
    async fn save_police_station(
        &self,
        name: &str,
        address: &str,
        location: GeoPoint,
    ) -> Result<PoliceStation, sqlx::Error>;

    async fn get_police_stations(&self) -> Result<Vec<PoliceStation>, sqlx::Error>;
}

#[async_trait]
impl StationExt for DBClient {
    async fn save_police_station(
        &self,
        name: &str,
        address: &str,
        location: GeoPoint,
    ) -> Result<PoliceStation, sqlx::Error> {
        sqlx::query_as::<_, PoliceStation>(
            r#"
            INSERT INTO police_stations (name, address, lat, lng)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, address, lat, lng, created_at
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(location.lat)
        .bind(location.lng)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_police_stations(&self) -> Result<Vec<PoliceStation>, sqlx::Error> {
        sqlx::query_as::<_, PoliceStation>(
            r#"
            SELECT id, name, address, lat, lng, created_at
            FROM police_stations
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
