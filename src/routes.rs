use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        auth::auth_handler,
        citizen::citizen_handler,
        dashboard::{police_handler, public_works_handler},
        geocode::geocode_handler,
        reports::reports_handler,
        users::users_handler,
    },
    middleware::main_middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(app_state.login_limiter.clone()))
        .merge(users_handler().layer(middleware::from_fn(auth)))
        .nest("/geocode", geocode_handler().layer(middleware::from_fn(auth)))
        .nest("/citizen", citizen_handler().layer(middleware::from_fn(auth)))
        .nest("/police", police_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/public-works",
            public_works_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/reports", reports_handler().layer(middleware::from_fn(auth)))
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        db::memory::MemoryStore,
        models::usermodel::{
            fixtures::{pending_citizen, profile, verified_citizen},
            UserProfile, UserRole, VerificationStatus,
        },
        service::geocoding::stub::FixedGeocoder,
        utils::token,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    fn app(store: Arc<MemoryStore>) -> Router {
        let state = AppState::new(
            Config::for_tests(),
            store,
            None,
            Arc::new(FixedGeocoder::named("Jalan Tunjungan")),
        );
        create_router(Arc::new(state))
    }

    fn bearer(user: &UserProfile) -> String {
        let token = token::create_token(&user.id.to_string(), b"test-secret", 60).unwrap();
        format!("Bearer {}", token)
    }

    fn request(method: Method, uri: &str, user: Option<&UserProfile>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, bearer(user));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signed_out_caller_is_sent_to_login() {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(request(Method::GET, "/api/police/crime-reports", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["redirect"], "/login");
    }

    #[tokio::test]
    async fn wrong_role_is_sent_to_unauthorized() {
        let citizen = verified_citizen();
        let store = Arc::new(MemoryStore::with_users(vec![citizen.clone()]));

        let response = app(store)
            .oneshot(request(Method::GET, "/api/admin/users", Some(&citizen), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["redirect"], "/unauthorized");
    }

    #[tokio::test]
    async fn token_for_deleted_profile_counts_as_signed_out() {
        let ghost = profile(UserRole::Admin);
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(request(Method::GET, "/api/admin/users", Some(&ghost), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_reports_landing_path() {
        let police = profile(UserRole::Police);
        let store = Arc::new(MemoryStore::with_users(vec![police.clone()]));

        let response = app(store)
            .oneshot(request(Method::GET, "/api/session", Some(&police), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["role"], "police");
        assert_eq!(body["landing"], "/police-dashboard");
    }

    #[tokio::test]
    async fn citizen_submits_and_police_sees_it_on_the_dashboard() {
        let citizen = verified_citizen();
        let police = profile(UserRole::Police);
        let store = Arc::new(MemoryStore::with_users(vec![citizen.clone(), police.clone()]));
        let app = app(store.clone());

        let draft = json!({
            "category": "vehicle_theft",
            "vehicleType": "four_wheeler",
            "plateNumber": "L 9999 XY",
            "brand": "Toyota",
            "color": "Putih",
            "location": { "lat": -7.2655, "lng": 112.7522 },
            "locationSource": "map_click"
        });
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/citizen/crime-reports", Some(&citizen), Some(draft)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["data"]["streetName"], "Jalan Tunjungan");
        assert_eq!(created["data"]["userName"], citizen.name.as_str());

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/police/crime-reports", Some(&police), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = json_body(response).await;
        assert_eq!(list["outcome"], "loaded");
        assert_eq!(list["records"].as_array().unwrap().len(), 1);
        assert_eq!(list["records"][0]["plateNumber"], "L 9999 XY");

        let response = app
            .oneshot(request(Method::GET, "/api/police/map", Some(&police), None))
            .await
            .unwrap();
        let map = json_body(response).await;
        assert_eq!(map["markers"].as_array().unwrap().len(), 1);
        assert_eq!(map["center"]["lat"], -7.28916);
    }

    #[tokio::test]
    async fn submit_without_location_is_a_bad_request() {
        let citizen = verified_citizen();
        let store = Arc::new(MemoryStore::with_users(vec![citizen.clone()]));

        let draft = json!({ "description": "Jalan amblas", "severity": "severe" });
        let response = app(store.clone())
            .oneshot(request(Method::POST, "/api/citizen/road-reports", Some(&citizen), Some(draft)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Lokasi belum diambil.");
        assert!(store.road_reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unverified_citizen_cannot_submit() {
        let citizen = pending_citizen();
        let store = Arc::new(MemoryStore::with_users(vec![citizen.clone()]));

        let draft = json!({
            "description": "Jalan amblas",
            "location": { "lat": -7.25, "lng": 112.75 }
        });
        let response = app(store)
            .oneshot(request(Method::POST, "/api/citizen/road-reports", Some(&citizen), Some(draft)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_review_needs_confirmation() {
        let admin = profile(UserRole::Admin);
        let waiting = pending_citizen();
        let store = Arc::new(MemoryStore::with_users(vec![admin.clone(), waiting.clone()]));
        let app = app(store.clone());
        let uri = format!("/api/admin/verifications/{}", waiting.id);

        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, Some(&admin), Some(json!({ "decision": "approve" }))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["applied"], false);
        assert_eq!(
            store.user(waiting.id).unwrap().verification_status,
            VerificationStatus::Pending
        );

        let response = app
            .oneshot(request(
                Method::PUT,
                &uri,
                Some(&admin),
                Some(json!({ "decision": "approve", "confirm": true })),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["applied"], true);
        assert!(store.user(waiting.id).unwrap().verified);
    }

    #[tokio::test]
    async fn admin_accounts_keep_their_role() {
        let admin = profile(UserRole::Admin);
        let other_admin = profile(UserRole::Admin);
        let store = Arc::new(MemoryStore::with_users(vec![admin.clone(), other_admin.clone()]));

        let response = app(store.clone())
            .oneshot(request(
                Method::PUT,
                "/api/admin/users/role",
                Some(&admin),
                Some(json!({ "role": "citizen", "target_user_id": other_admin.id })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(store.user(other_admin.id).unwrap().role, UserRole::Admin);
    }

    #[tokio::test]
    async fn login_is_rate_limited() {
        let app = app(Arc::new(MemoryStore::new()));
        let body = json!({ "email": "budi@example.com", "password": "salah123" });

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request(Method::POST, "/api/auth/login", None, Some(body.clone())))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app
            .oneshot(request(Method::POST, "/api/auth/login", None, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn unverified_email_cannot_sign_in() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone());

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": "Sari",
                    "email": "sari@example.com",
                    "password": "rahasia123",
                    "passwordConfirm": "rahasia123"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "sari@example.com", "password": "rahasia123" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
