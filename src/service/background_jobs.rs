use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::AppState;

/// Drops dashboard lists whose owners stopped using them.
pub async fn start_dashboard_sweep_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(60));

    loop {
        interval.tick().await;

        let dropped =
            app_state.crime_pagers.sweep().await + app_state.road_pagers.sweep().await;

        if dropped > 0 {
            tracing::info!(
                "Dropped {} idle dashboard lists, {} still open",
                dropped,
                app_state.crime_pagers.open_count().await + app_state.road_pagers.open_count().await
            );
        }
    }
}
