//! Client tests against a local axum server standing in for the real APIs.

use std::{collections::HashMap, time::Duration};

use axum::{
  Json, Router,
  extract::{Path, Query},
  http::StatusCode,
  routing::{get, post},
};
use hangar_core::{
  citizen::Handle,
  provider::{CitizenDirectory, ShipCatalogProvider},
};
use reqwest::Url;
use serde_json::{Value, json};

use crate::{Error, GalaxyClient, RsiDirectoryClient, client, join};

async fn serve(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}/")
}

const TIMEOUT: Duration = Duration::from_secs(5);

// ─── Helpers ─────────────────────────────────────────────────────────────────

#[test]
fn join_escapes_segments_and_keeps_base_path() {
  let base = Url::parse("https://directory.example/api/").unwrap();
  let url = join(&base, &["citizens", "a b/c"]).unwrap();
  assert_eq!(url.as_str(), "https://directory.example/api/citizens/a%20b%2Fc");
}

#[test]
fn rejects_non_base_urls() {
  assert!(matches!(
    client("mailto:someone@example.com", TIMEOUT),
    Err(Error::InvalidBaseUrl(_))
  ));
  assert!(client("not a url", TIMEOUT).is_err());
}

// ─── Directory ───────────────────────────────────────────────────────────────

async fn directory() -> RsiDirectoryClient {
  let router = Router::new().route(
    "/citizens/{handle}",
    get(|Path(handle): Path<String>| async move {
      match handle.as_str() {
        "ioni" => Ok(Json(json!({
          "handle": "Ioni",
          "citizen_number": "123456",
          "bio": null,
          "organizations": [{ "sid": "FLK", "rank": 1 }, { "sid": null, "rank": null }]
        }))),
        "broken" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
      }
    }),
  );
  RsiDirectoryClient::new(&serve(router).await, TIMEOUT).unwrap()
}

#[tokio::test]
async fn directory_returns_record() {
  let record = directory()
    .await
    .lookup(&Handle("ioni".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(record.handle.as_deref(), Some("Ioni"));
  assert_eq!(record.citizen_number.as_deref(), Some("123456"));
  assert_eq!(record.organizations.len(), 2);
  assert_eq!(record.organizations[1].sid, None);
}

#[tokio::test]
async fn directory_404_is_none() {
  let found = directory().await.lookup(&Handle("ghost".into())).await.unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn directory_server_error_is_reported() {
  let err = directory().await.lookup(&Handle("broken".into())).await.unwrap_err();
  assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 500));
}

// ─── Galaxy ──────────────────────────────────────────────────────────────────

fn catalog() -> Vec<Value> {
  vec![
    json!({ "id": "1", "name": "Avenger Titan", "readyStatus": "flight-ready",
            "chassis": { "id": "10", "name": "Avenger" } }),
    json!({ "id": "2", "name": "Gladius", "readyStatus": "flight-ready",
            "chassis": { "id": "20", "name": "Gladius" } }),
  ]
}

async fn galaxy() -> GalaxyClient {
  let router = Router::new()
    .route(
      "/api/ships",
      get(|Query(q): Query<HashMap<String, String>>| async move {
        if q.get("pagination").map(String::as_str) != Some("false") {
          return Err(StatusCode::BAD_REQUEST);
        }
        let ships = catalog()
          .into_iter()
          .filter(|s| q.get("chassis").is_none_or(|c| s["chassis"]["id"] == c.as_str()))
          .collect::<Vec<_>>();
        Ok(Json(ships))
      }),
    )
    .route(
      "/api/ships/bulk",
      post(|Json(body): Json<Value>| async move {
        let ids = body["ids"].as_array().cloned().unwrap_or_default();
        let names = body["names"].as_array().cloned().unwrap_or_default();
        let ships = catalog()
          .into_iter()
          .filter(|s| {
            ids.contains(&s["id"])
              || names
                .iter()
                .any(|n| n.as_str() == s["name"].as_str().map(str::to_lowercase).as_deref())
          })
          .collect::<Vec<_>>();
        Json(ships)
      }),
    );
  GalaxyClient::new(&serve(router).await, TIMEOUT).unwrap()
}

#[tokio::test]
async fn galaxy_lists_all_ships() {
  let ships = galaxy().await.all_ships().await.unwrap();
  assert_eq!(ships.len(), 2);
  assert_eq!(ships[0].chassis_name.as_deref(), Some("Avenger"));
}

#[tokio::test]
async fn galaxy_filters_by_chassis() {
  let ships = galaxy().await.ships_by_chassis("20").await.unwrap();
  assert_eq!(ships.len(), 1);
  assert_eq!(ships[0].name, "Gladius");
}

#[tokio::test]
async fn galaxy_bulk_resolves_ids_and_names() {
  let ships = galaxy()
    .await
    .ships_bulk(&["1".into()], &["gladius".into(), "unknown".into()])
    .await
    .unwrap();
  let mut ids: Vec<_> = ships.iter().map(|s| s.id.as_str()).collect();
  ids.sort();
  assert_eq!(ids, ["1", "2"]);
}
