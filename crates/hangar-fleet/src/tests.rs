//! End-to-end tests for ingestion and the upload pipeline against an
//! in-memory SQLite store.

use std::{
  collections::HashMap,
  io,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use hangar_core::{
  citizen::{
    Citizen, CitizenNumber, Handle, OrganizationMembership, PublicChoice, Visibility,
  },
  fleet::Money,
  provider::{CitizenDirectory, DirectoryOrganization, DirectoryRecord},
  store::HangarStore,
};
use hangar_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Error, FleetUploadHandler, FleetVersioningEngine, InvalidFleetData, UPLOAD_COOLDOWN,
  access::{DenyReason, OrganizationAccessGuard},
  identity::CitizenIdentityResolver,
  latest_fleets_of_organization, save_preferences,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeDirectory {
  records: Mutex<HashMap<String, DirectoryRecord>>,
  down:    bool,
}

impl FakeDirectory {
  fn with(record: DirectoryRecord) -> Self {
    let directory = Self::default();
    directory.put(record);
    directory
  }

  fn put(&self, record: DirectoryRecord) {
    let key = record.handle.clone().unwrap_or_default().to_lowercase();
    self.records.lock().unwrap().insert(key, record);
  }
}

impl CitizenDirectory for FakeDirectory {
  type Error = io::Error;

  async fn lookup(&self, handle: &Handle) -> Result<Option<DirectoryRecord>, io::Error> {
    if self.down {
      return Err(io::Error::other("directory unreachable"));
    }
    Ok(self.records.lock().unwrap().get(&handle.as_str().to_lowercase()).cloned())
  }
}

fn record(handle: &str, number: &str, orgs: &[(&str, i64)]) -> DirectoryRecord {
  DirectoryRecord {
    handle:         Some(handle.into()),
    citizen_number: Some(number.into()),
    bio:            None,
    organizations:  orgs
      .iter()
      .map(|(sid, rank)| DirectoryOrganization { sid: Some((*sid).into()), rank: Some(*rank) })
      .collect(),
  }
}

fn citizen(handle: &str, orgs: &[(&str, u32, Visibility)]) -> Citizen {
  Citizen {
    citizen_id:    Uuid::new_v4(),
    number:        CitizenNumber(format!("n-{handle}")),
    actual_handle: Handle(handle.into()),
    bio:           None,
    organizations: orgs
      .iter()
      .map(|(sid, rank, visibility)| OrganizationMembership {
        organization_sid: (*sid).into(),
        rank:             *rank,
        visibility:       *visibility,
      })
      .collect(),
    public_choice: PublicChoice::Private,
    updated_at:    Utc::now(),
  }
}

fn avenger() -> Value {
  json!({
    "manufacturer": "Aegis",
    "name": "Avenger",
    "lti": true,
    "cost": "$100.00",
    "pledge_date": "January 01, 2021"
  })
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap() }

fn after_cooldown(n: i32) -> DateTime<Utc> {
  t0() + Duration::from_std(UPLOAD_COOLDOWN).unwrap() * n + Duration::seconds(n.into())
}

async fn setup() -> (Arc<SqliteStore>, Arc<FleetVersioningEngine<SqliteStore>>, Citizen) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let engine = Arc::new(FleetVersioningEngine::new(store.clone()));
  let c = citizen("ioni", &[]);
  store.save_citizen(&c).await.unwrap();
  (store, engine, c)
}

fn handler(
  store: &Arc<SqliteStore>,
  engine: &Arc<FleetVersioningEngine<SqliteStore>>,
  directory: &Arc<FakeDirectory>,
) -> FleetUploadHandler<SqliteStore, Arc<FakeDirectory>> {
  FleetUploadHandler::new(
    store.clone(),
    CitizenIdentityResolver::new(directory.clone()),
    engine.clone(),
  )
}

// ─── Versioning ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_upload_of_new_citizen_is_version_one() {
  let (_, engine, c) = setup().await;

  let fleet = engine.ingest_at(c.citizen_id, &[avenger()], t0()).await.unwrap();

  assert_eq!(fleet.version, 1);
  assert_eq!(fleet.ships.len(), 1);
  assert_eq!(fleet.ships[0].cost, Money(10_000));
  assert_eq!(fleet.ships[0].cost.minor_units(), 10_000);
  assert_eq!(fleet.ships[0].raw, avenger());
}

#[tokio::test]
async fn n_uploads_give_version_n() {
  let (_, engine, c) = setup().await;

  for n in 0..4 {
    engine.ingest_at(c.citizen_id, &[avenger()], after_cooldown(n)).await.unwrap();
  }

  let latest = engine.latest_fleet(c.citizen_id).await.unwrap().unwrap();
  assert_eq!(latest.version, 4);
  assert_eq!(latest.uploaded_at, after_cooldown(3));
}

#[tokio::test]
async fn upload_inside_cooldown_is_rejected_then_accepted_after() {
  let (_, engine, c) = setup().await;
  engine.ingest_at(c.citizen_id, &[avenger()], t0()).await.unwrap();

  let err = engine
    .ingest_at(c.citizen_id, &[avenger()], t0() + Duration::seconds(1))
    .await
    .unwrap_err();
  match err {
    Error::FleetUploadedTooClose { last_upload } => assert_eq!(last_upload, t0()),
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(engine.latest_fleet(c.citizen_id).await.unwrap().unwrap().version, 1);

  let fleet = engine.ingest_at(c.citizen_id, &[avenger()], after_cooldown(1)).await.unwrap();
  assert_eq!(fleet.version, 2);
}

#[tokio::test]
async fn configured_cooldown_is_honoured() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let engine =
    FleetVersioningEngine::with_cooldown(store.clone(), std::time::Duration::from_secs(60));
  let c = citizen("ioni", &[]);
  store.save_citizen(&c).await.unwrap();

  engine.ingest_at(c.citizen_id, &[], t0()).await.unwrap();
  assert!(engine.ingest_at(c.citizen_id, &[], t0() + Duration::seconds(59)).await.is_err());
  assert!(engine.ingest_at(c.citizen_id, &[], t0() + Duration::seconds(60)).await.is_ok());
}

#[tokio::test]
async fn malformed_entry_stores_nothing() {
  let (_, engine, c) = setup().await;
  engine.ingest_at(c.citizen_id, &[avenger()], t0()).await.unwrap();

  let mut bad = avenger();
  bad["pledge_date"] = json!("2021-01-01");
  let err = engine
    .ingest_at(c.citizen_id, &[avenger(), bad], after_cooldown(1))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidFleetData(InvalidFleetData::Ship { index: 1, .. })
  ));

  let latest = engine.latest_fleet(c.citizen_id).await.unwrap().unwrap();
  assert_eq!(latest.version, 1);
  assert_eq!(latest.ships.len(), 1);
}

#[tokio::test]
async fn empty_and_identical_uploads_still_create_versions() {
  let (_, engine, c) = setup().await;

  let empty = engine.ingest_at(c.citizen_id, &[], t0()).await.unwrap();
  assert_eq!(empty.version, 1);
  assert!(empty.ships.is_empty());

  engine.ingest_at(c.citizen_id, &[avenger()], after_cooldown(1)).await.unwrap();
  let same = engine.ingest_at(c.citizen_id, &[avenger()], after_cooldown(2)).await.unwrap();
  assert_eq!(same.version, 3);
}

#[tokio::test]
async fn concurrent_uploads_for_one_citizen_do_not_both_succeed() {
  let (_, engine, c) = setup().await;
  let id = c.citizen_id;

  let tasks: Vec<_> = (0..2)
    .map(|_| {
      let engine = engine.clone();
      tokio::spawn(async move { engine.ingest_at(id, &[avenger()], t0()).await })
    })
    .collect();

  let mut ok = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => ok += 1,
      Err(Error::FleetUploadedTooClose { .. }) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(ok, 1);
  assert_eq!(engine.latest_fleet(c.citizen_id).await.unwrap().unwrap().version, 1);
}

#[tokio::test]
async fn different_citizens_are_independent() {
  let (store, engine, a) = setup().await;
  let b = citizen("other", &[]);
  store.save_citizen(&b).await.unwrap();

  engine.ingest_at(a.citizen_id, &[avenger()], t0()).await.unwrap();
  let fleet = engine.ingest_at(b.citizen_id, &[avenger()], t0()).await.unwrap();
  assert_eq!(fleet.version, 1);
}

// ─── Upload pipeline ─────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_refreshes_identity_and_keeps_chosen_visibility() {
  let (store, engine, _) = setup().await;
  let mut uploader = citizen("Ioni", &[("FLK", 2, Visibility::Public), ("OLD", 1, Visibility::Public)]);
  uploader.number = CitizenNumber("42".into());
  store.save_citizen(&uploader).await.unwrap();

  let directory = Arc::new(FakeDirectory::with(DirectoryRecord {
    bio: Some("new bio".into()),
    ..record("IONI", "42", &[("FLK", 1), ("NEW", 3)])
  }));
  let (refreshed, fleet) = handler(&store, &engine, &directory)
    .handle_at(&uploader, &json!([avenger()]), t0())
    .await
    .unwrap();

  assert_eq!(refreshed.citizen_id, uploader.citizen_id);
  assert_eq!(refreshed.actual_handle, Handle("IONI".into()));
  assert_eq!(fleet.owner_id, uploader.citizen_id);

  let stored = store.get_citizen(uploader.citizen_id).await.unwrap().unwrap();
  assert_eq!(stored.bio.as_deref(), Some("new bio"));
  let flk = stored.membership("FLK").unwrap();
  assert_eq!((flk.rank, flk.visibility), (1, Visibility::Public));
  assert_eq!(stored.membership("NEW").unwrap().visibility, Visibility::Private);
  assert!(!stored.is_member_of("OLD"));
}

#[tokio::test]
async fn upload_for_unknown_handle_fails_without_storing() {
  let (store, engine, c) = setup().await;
  let directory = Arc::new(FakeDirectory::default());

  let err = handler(&store, &engine, &directory)
    .handle_at(&c, &json!([avenger()]), t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFoundHandle(_)));
  assert!(engine.latest_fleet(c.citizen_id).await.unwrap().is_none());
}

#[tokio::test]
async fn upload_with_inconsistent_record_is_bad_citizen() {
  let (store, engine, c) = setup().await;
  let directory = Arc::new(FakeDirectory::with(DirectoryRecord {
    citizen_number: None,
    ..record("ioni", "", &[])
  }));

  let err = handler(&store, &engine, &directory)
    .handle_at(&c, &json!([]), t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BadCitizen { .. }));
}

#[tokio::test]
async fn reused_handle_never_writes_into_the_new_owners_history() {
  let (store, engine, _) = setup().await;
  let mut a = citizen("foo", &[]);
  a.number = CitizenNumber("1".into());
  let mut b = citizen("foo-renamed", &[]);
  b.number = CitizenNumber("2".into());
  for c in [&a, &b] {
    store.save_citizen(c).await.unwrap();
  }

  // A's old handle now belongs to B upstream.
  let directory = Arc::new(FakeDirectory::with(record("foo", "2", &[("FLK", 1)])));
  let err = handler(&store, &engine, &directory)
    .handle_at(&a, &json!([avenger()]), t0())
    .await
    .unwrap_err();

  assert!(matches!(err, Error::BadCitizen { .. }));
  assert!(engine.latest_fleet(a.citizen_id).await.unwrap().is_none());
  assert!(engine.latest_fleet(b.citizen_id).await.unwrap().is_none());
  assert_eq!(store.get_citizen(b.citizen_id).await.unwrap().unwrap(), b);
  assert_eq!(store.get_citizen(a.citizen_id).await.unwrap().unwrap(), a);
}

#[tokio::test]
async fn handle_taken_by_an_unknown_citizen_keeps_the_stored_number() {
  let (store, engine, c) = setup().await;
  let directory = Arc::new(FakeDirectory::with(record("ioni", "stranger", &[])));

  let err = handler(&store, &engine, &directory)
    .handle_at(&c, &json!([avenger()]), t0())
    .await
    .unwrap_err();

  assert!(matches!(err, Error::BadCitizen { .. }));
  let stored = store.get_citizen(c.citizen_id).await.unwrap().unwrap();
  assert_eq!(stored.number, c.number);
  assert!(
    store
      .get_citizen_by_number(&CitizenNumber("stranger".into()))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn directory_outage_is_a_transport_error() {
  let (store, engine, c) = setup().await;
  let directory = Arc::new(FakeDirectory { down: true, ..Default::default() });

  let err = handler(&store, &engine, &directory)
    .handle_at(&c, &json!([]), t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Directory(_)));
}

#[tokio::test]
async fn non_array_upload_is_invalid_fleet_data() {
  let (store, engine, c) = setup().await;
  let directory = Arc::new(FakeDirectory::with(record("ioni", "n-ioni", &[])));

  let err = handler(&store, &engine, &directory)
    .handle_at(&c, &json!({ "ships": [] }), t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidFleetData(InvalidFleetData::NotAnArray)));
}

#[tokio::test]
async fn link_creates_then_updates_by_number() {
  let (store, engine, _) = setup().await;
  let directory = Arc::new(FakeDirectory::with(record("Ioni", "777", &[("FLK", 3)])));
  let handler = handler(&store, &engine, &directory);

  let account = Uuid::new_v4();
  let linked = handler.link(&Handle("ioni".into()), Some(account)).await.unwrap();
  assert_eq!(linked.citizen_id, account);
  assert_eq!(linked.number, CitizenNumber("777".into()));

  // Handle renamed upstream, same number.
  directory.put(record("Ionni", "777", &[("FLK", 2)]));
  let relinked = handler.link(&Handle("ionni".into()), None).await.unwrap();
  assert_eq!(relinked.citizen_id, linked.citizen_id);
  assert_eq!(relinked.actual_handle, Handle("Ionni".into()));
  assert_eq!(relinked.membership("FLK").unwrap().rank, 2);
}

#[tokio::test]
async fn linking_another_accounts_citizen_fails_without_saving() {
  let (store, engine, _) = setup().await;
  let directory = Arc::new(FakeDirectory::with(record("Ioni", "777", &[("FLK", 3)])));
  let handler = handler(&store, &engine, &directory);

  let owner = Uuid::new_v4();
  let linked = handler.link(&Handle("ioni".into()), Some(owner)).await.unwrap();

  directory.put(record("Ionni", "777", &[("FLK", 1)]));
  let err = handler
    .link(&Handle("ionni".into()), Some(Uuid::new_v4()))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::AlreadyLinked { .. }));
  assert_eq!(store.get_citizen(owner).await.unwrap().unwrap(), linked);
}

// ─── Preferences & organization reads ────────────────────────────────────────

#[tokio::test]
async fn save_preferences_ignores_unknown_organizations() {
  let (store, _, _) = setup().await;
  let c = citizen("pref", &[("FLK", 2, Visibility::Private)]);
  store.save_citizen(&c).await.unwrap();

  let visibilities = HashMap::from([
    ("FLK".to_owned(), Visibility::Organization),
    ("NOPE".to_owned(), Visibility::Public),
  ]);
  save_preferences(store.as_ref(), c.clone(), PublicChoice::Public, &visibilities)
    .await
    .unwrap();

  let stored = store.get_citizen(c.citizen_id).await.unwrap().unwrap();
  assert_eq!(stored.public_choice, PublicChoice::Public);
  assert_eq!(stored.organizations.len(), 1);
  assert_eq!(stored.membership("FLK").unwrap().visibility, Visibility::Organization);
}

#[tokio::test]
async fn guard_loads_rosters_for_private_fleets() {
  let (store, _, _) = setup().await;
  let boss = citizen("boss", &[("FLK", 1, Visibility::Private)]);
  let grunt = citizen("grunt", &[("FLK", 4, Visibility::Private)]);
  let target = citizen("target", &[("FLK", 2, Visibility::Private)]);
  for c in [&boss, &grunt, &target] {
    store.save_citizen(c).await.unwrap();
  }
  let guard = OrganizationAccessGuard::new(store.clone());

  guard.check_citizen(Some(&boss), &target).await.unwrap();
  assert!(matches!(
    guard.check_citizen(Some(&grunt), &target).await,
    Err(Error::AccessDenied(DenyReason::NotEnoughRightsAdmin))
  ));
  assert!(matches!(
    guard.check_citizen(None, &target).await,
    Err(Error::AccessDenied(DenyReason::NotEnoughRightsPublic))
  ));

  // Everyone else keeps their fleet private, so the outranked member has
  // nothing to see on the organization page.
  assert!(matches!(
    guard.check_organization(Some(&grunt), "FLK").await,
    Err(Error::AccessDenied(DenyReason::NotEnoughRightsAdmin))
  ));
  let visible = guard.check_organization(Some(&boss), "FLK").await.unwrap();
  assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn latest_fleets_skip_members_who_never_uploaded() {
  let (store, engine, uploader) = setup().await;
  let idle = citizen("idle", &[]);
  store.save_citizen(&idle).await.unwrap();
  engine.ingest_at(uploader.citizen_id, &[avenger()], t0()).await.unwrap();

  let fleets = latest_fleets_of_organization(store.as_ref(), &[uploader.clone(), idle])
    .await
    .unwrap();
  assert_eq!(fleets.len(), 1);
  assert_eq!(fleets[0].0.citizen_id, uploader.citizen_id);
  assert_eq!(fleets[0].1.version, 1);
}
