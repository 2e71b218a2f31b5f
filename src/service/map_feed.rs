use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::db::{
    cache::{map_feed_key, CacheHelper, FeedCache},
    Store,
};
use crate::models::{
    reportmodel::{CrimeReport, GeoPoint, RoadReport},
    stationmodel::PoliceStation,
};
use crate::service::{geocoding::STREET_PLACEHOLDER, pagination::ReportRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Crime,
    Road,
    Station,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub id: Uuid,
    pub kind: MarkerKind,
    pub position: GeoPoint,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

pub trait ToMarker {
    fn to_marker(&self) -> MapMarker;
}

fn street_subtitle(street_name: &Option<String>) -> Option<String> {
    street_name
        .as_deref()
        .filter(|s| *s != STREET_PLACEHOLDER && !s.trim().is_empty())
        .map(String::from)
}

impl ToMarker for CrimeReport {
    fn to_marker(&self) -> MapMarker {
        MapMarker {
            id: self.id,
            kind: MarkerKind::Crime,
            position: self.location,
            title: self.category.label().to_string(),
            subtitle: street_subtitle(&self.street_name),
            timestamp: Some(self.created_at),
        }
    }
}

impl ToMarker for RoadReport {
    fn to_marker(&self) -> MapMarker {
        MapMarker {
            id: self.id,
            kind: MarkerKind::Road,
            position: self.location,
            title: format!("Jalan Rusak ({})", self.severity.label()),
            subtitle: street_subtitle(&self.street_name),
            timestamp: Some(self.created_at),
        }
    }
}

impl ToMarker for PoliceStation {
    fn to_marker(&self) -> MapMarker {
        MapMarker {
            id: self.id,
            kind: MarkerKind::Station,
            position: self.location,
            title: self.name.clone(),
            subtitle: Some(self.address.clone()),
            timestamp: None,
        }
    }
}

/// One marker per record, in input order.
pub fn markers<T: ToMarker>(records: &[T]) -> Vec<MapMarker> {
    records.iter().map(ToMarker::to_marker).collect()
}

/// Whole-collection reads for map rendering.
///
/// Independent of the dashboard lists: it has its own cache key and may lag
/// behind a list that was refreshed more recently.
pub struct MapFeed<'a> {
    store: &'a dyn Store,
    cache: Option<&'a dyn FeedCache>,
    ttl_seconds: usize,
}

impl<'a> MapFeed<'a> {
    pub fn new(
        store: &'a dyn Store,
        cache: Option<&'a dyn FeedCache>,
        ttl_seconds: usize,
    ) -> Self {
        MapFeed {
            store,
            cache,
            ttl_seconds,
        }
    }

    pub async fn fetch_all<R>(&self) -> Result<Vec<R>, sqlx::Error>
    where
        R: ReportRecord + DeserializeOwned,
    {
        let key = map_feed_key(R::COLLECTION);
        if let Some(cached) = self.cached::<Vec<R>>(&key).await {
            return Ok(cached);
        }

        let records = R::fetch_all(self.store).await?;
        self.store_in_cache(&key, &records).await;
        Ok(records)
    }

    pub async fn stations(&self) -> Result<Vec<PoliceStation>, sqlx::Error> {
        let key = map_feed_key("stations");
        if let Some(cached) = self.cached::<Vec<PoliceStation>>(&key).await {
            return Ok(cached);
        }

        let stations = self.store.get_police_stations().await?;
        self.store_in_cache(&key, &stations).await;
        Ok(stations)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache?;
        match CacheHelper::get::<T>(cache, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Map feed cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store_in_cache<T: Serialize>(&self, key: &str, value: &T) {
        if let Some(cache) = self.cache {
            if let Err(e) = CacheHelper::set(cache, key, value, self.ttl_seconds).await {
                tracing::warn!("Map feed cache write failed for {}: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryCache, MemoryStore};
    use std::sync::atomic::Ordering;
    use crate::models::reportmodel::{LocationSource, RoadSeverity};

    #[tokio::test]
    async fn every_report_becomes_exactly_one_marker() {
        let store = MemoryStore::new();
        let seeded = store.seed_crime_reports(7);

        let feed = MapFeed::new(&store, None, 30);
        let reports = feed.fetch_all::<CrimeReport>().await.unwrap();
        let markers = markers(&reports);

        assert_eq!(markers.len(), seeded.len());
        assert_eq!(markers[0].id, seeded[6].id);
        assert!(markers.iter().all(|m| m.kind == MarkerKind::Crime));
    }

    #[test]
    fn placeholder_street_is_not_a_subtitle() {
        let mut road = RoadReport {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "Sari".to_string(),
            description: "Lubang besar".to_string(),
            severity: RoadSeverity::Severe,
            location: GeoPoint { lat: -7.26, lng: 112.75 },
            location_source: LocationSource::Device,
            street_name: Some(STREET_PLACEHOLDER.to_string()),
            status: Default::default(),
            created_at: Utc::now(),
        };
        assert_eq!(road.to_marker().subtitle, None);
        assert_eq!(road.to_marker().title, "Jalan Rusak (Berat)");

        road.street_name = Some("Jalan Ahmad Yani".to_string());
        assert_eq!(road.to_marker().subtitle.as_deref(), Some("Jalan Ahmad Yani"));
    }

    #[tokio::test]
    async fn read_failure_is_returned_to_the_caller() {
        let store = MemoryStore::new();
        store.fail_reports(true);
        let feed = MapFeed::new(&store, None, 30);
        assert!(feed.fetch_all::<RoadReport>().await.is_err());
    }

    #[tokio::test]
    async fn cached_feed_is_served_until_invalidated() {
        let store = MemoryStore::new();
        store.seed_crime_reports(2);
        let cache = MemoryCache::default();
        let feed = MapFeed::new(&store, Some(&cache), 30);

        assert_eq!(feed.fetch_all::<CrimeReport>().await.unwrap().len(), 2);
        assert_eq!(cache.hits.load(Ordering::SeqCst), 0);

        store.seed_crime_reports(1);
        let cached = feed.fetch_all::<CrimeReport>().await.unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cache.hits.load(Ordering::SeqCst), 1);

        CacheHelper::invalidate_map_feeds(&cache).await;
        assert_eq!(feed.fetch_all::<CrimeReport>().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let store = MemoryStore::new();
        let seeded = store.seed_crime_reports(1);
        let cache = MemoryCache::default();
        let feed = MapFeed::new(&store, Some(&cache), 30);

        feed.fetch_all::<CrimeReport>().await.unwrap();
        store.fail_reports(true);

        let cached = feed.fetch_all::<CrimeReport>().await.unwrap();
        assert_eq!(cached, seeded);
    }
}
