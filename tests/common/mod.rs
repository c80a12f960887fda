//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rand::Rng;
use serde_json::{json, Value};
use tower::ServiceExt;

use waypoint::config::{AppConfig, DatabaseConfig};
use waypoint::db::{Database, Location, SqliteLocations, IN_MEMORY};
use waypoint::lifecycle::Application;
use waypoint::observability::Palette;
use waypoint::routes::RouteServices;

static NEXT_GEONAMEID: AtomicU32 = AtomicU32::new(1_000_000);

/// A plausible geonames row with the given name.
pub fn generate_location(name: &str) -> Location {
    let mut rng = rand::thread_rng();
    let location = json!({
        "geonameid": NEXT_GEONAMEID.fetch_add(1, Ordering::Relaxed).to_string(),
        "name": name,
        "asciiname": name,
        "latitude": format!("{:.5}", rng.gen_range(-90.0..90.0f64)),
        "longitude": format!("{:.5}", rng.gen_range(-180.0..180.0f64)),
        "country_code": "GB",
        "population": rng.gen_range(0..1_000_000u32).to_string(),
        "timezone": "Europe/London",
    });
    match location {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// An application backed by a fresh in-memory database holding `locations`.
pub async fn seeded_app(locations: &[Location]) -> Application {
    let palette = Palette::plain();
    let config = AppConfig {
        database: DatabaseConfig {
            path: IN_MEMORY.to_string(),
            ..DatabaseConfig::default()
        },
        ..AppConfig::default()
    };

    let db = Database::connect(&config.database, &palette).await.unwrap();
    let store = SqliteLocations::new(db, config.database.table.clone());
    store.ensure_schema().await.unwrap();
    for location in locations {
        store.insert(location).await.unwrap();
    }

    let services = RouteServices {
        locations: Arc::new(store),
    };
    Application::create(&config, &services, &palette).await.unwrap()
}

/// Send a GET through the router and return status plus raw body.
pub async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Send a GET and parse the body as JSON.
pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

/// Keep only `keys` of `location`.
pub fn pick(location: &Location, keys: &[&str]) -> Value {
    let picked = keys
        .iter()
        .filter_map(|key| location.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();
    Value::Object(picked)
}
