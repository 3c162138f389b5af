//! Integration tests: the core services over an in-memory `SqliteStore`.

use std::sync::Arc;

use chrono::NaiveDate;
use ipdesk_core::{
  Error as CoreError,
  clock::FixedClock,
  filing::FilingRequest,
  observer::ActivityCounters,
  service::{FilingService, TrackerService},
  status::FilingStatus,
  store::StoreError as _,
  tracker::TrackRequest,
};

use crate::{Error, SqliteStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn today() -> NaiveDate { date(2025, 3, 15) }

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

fn filings_on(store: &Arc<SqliteStore>, day: NaiveDate) -> FilingService<SqliteStore> {
  FilingService::new(store.clone()).with_clock(Arc::new(FixedClock::on(day)))
}

fn trackers_on(store: &Arc<SqliteStore>, day: NaiveDate) -> TrackerService<SqliteStore> {
  TrackerService::new(store.clone()).with_clock(Arc::new(FixedClock::on(day)))
}

fn request() -> FilingRequest {
  FilingRequest {
    applicant_name: "Grace Hopper".into(),
    applicant_type: "Individual".into(),
    nationality: "US".into(),
    address_street: "1 Navy Way".into(),
    address_city: "Arlington".into(),
    address_state: "VA".into(),
    address_postal_code: "22201".into(),
    email: "grace@example.com".into(),
    phone: "+1 555 0100".into(),
    filing_role: "Inventor".into(),
    id_type: "Passport".into(),
    id_number: "X900".into(),
    patent_type: "Utility".into(),
    jurisdiction: "US".into(),
    technical_field: "Compilers".into(),
    title: "Source translator".into(),
    abstract_text: "Translates English-like statements into machine code.".into(),
    inventors: vec!["Grace Hopper".into(), "Jean Sammet".into()],
    filing_date: Some(date(2024, 1, 1)),
    ..Default::default()
  }
}

async fn count(store: &SqliteStore, table: &'static str) -> i64 {
  store
    .conn
    .call(move |conn| {
      Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
    })
    .await
    .unwrap()
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_applies_defaults_and_derives_status() {
  let s = store().await;
  let svc = filings_on(&s, today());

  let view = svc.create(7, request()).await.unwrap();
  let f = &view.filing;
  assert_eq!(f.user_id, 7);
  assert!(f.application_number.starts_with("APP-"));
  assert_eq!(f.filing_date, date(2024, 1, 1));
  assert_eq!(f.expiry_date, Some(date(2044, 1, 1)));
  assert_eq!(f.status, FilingStatus::FILED);
  assert!(f.content.correspondence_same);
  assert!(f.content.is_inventor);
  assert!(!f.content.priority_claim);
  assert_eq!(view.mailing_address.city.as_deref(), Some("Arlington"));

  let names: Vec<_> = f.inventors.iter().map(|i| i.name.as_str()).collect();
  assert_eq!(names, ["Grace Hopper", "Jean Sammet"]);

  let fetched = svc.get(f.filing_id, 7).await.unwrap();
  assert_eq!(fetched, view);
}

#[tokio::test]
async fn filing_date_defaults_to_today() {
  let s = store().await;
  let mut req = request();
  req.filing_date = None;
  let view = filings_on(&s, today()).create(1, req).await.unwrap();
  assert_eq!(view.filing.filing_date, today());
  assert_eq!(view.filing.expiry_date, Some(date(2045, 3, 15)));
}

#[tokio::test]
async fn old_filing_is_created_expired() {
  let s = store().await;
  let mut req = request();
  req.filing_date = Some(date(2004, 1, 1));
  let view = filings_on(&s, today()).create(1, req).await.unwrap();
  assert_eq!(view.filing.status, FilingStatus::EXPIRED);
}

#[tokio::test]
async fn expiry_window_boundaries() {
  let s = store().await;
  let svc = filings_on(&s, today());

  let mut soon = request();
  soon.filing_date = Some(date(2005, 8, 15));
  soon.expiry_date = Some(date(2025, 8, 15));
  assert_eq!(
    svc.create(1, soon).await.unwrap().filing.status,
    FilingStatus::EXPIRING_SOON
  );

  let mut later = request();
  later.filing_date = Some(date(2005, 10, 15));
  later.expiry_date = Some(date(2025, 10, 15));
  assert_eq!(svc.create(1, later).await.unwrap().filing.status, FilingStatus::FILED);
}

#[tokio::test]
async fn application_numbers_are_unique_under_a_frozen_clock() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let a = svc.create(1, request()).await.unwrap();
  let b = svc.create(1, request()).await.unwrap();
  assert_ne!(a.filing.application_number, b.filing.application_number);
}

#[tokio::test]
async fn create_rejects_missing_field() {
  let s = store().await;
  let mut req = request();
  req.title.clear();
  let err = filings_on(&s, today()).create(1, req).await.unwrap_err();
  assert!(matches!(err, CoreError::ValidationFailed { field: "title", .. }));
  assert_eq!(count(&s, "filings").await, 0);
}

#[tokio::test]
async fn inventors_are_shared_by_exact_name() {
  let s = store().await;
  let svc = filings_on(&s, today());

  let a = svc.create(1, request()).await.unwrap();
  let mut req = request();
  req.inventors = vec!["Grace Hopper".into(), "grace hopper".into()];
  let b = svc.create(2, req).await.unwrap();

  assert_eq!(a.filing.inventors[0].inventor_id, b.filing.inventors[0].inventor_id);
  assert_ne!(b.filing.inventors[0].inventor_id, b.filing.inventors[1].inventor_id);
  assert_eq!(count(&s, "inventors").await, 3);
}

// ─── Ownership ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn other_users_filings_are_not_found() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;

  assert!(matches!(svc.get(id, 2).await, Err(CoreError::NotFound { .. })));
  assert!(matches!(
    svc.update(id, 2, request()).await,
    Err(CoreError::NotFound { .. })
  ));
  assert!(matches!(svc.delete(id, 2).await, Err(CoreError::NotFound { .. })));
  assert!(matches!(svc.get(999, 1).await, Err(CoreError::NotFound { .. })));

  // Still there for its owner and for admins.
  svc.get(id, 1).await.unwrap();
  svc.get_admin(id).await.unwrap();
}

#[tokio::test]
async fn list_is_scoped_and_newest_first() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let first = svc.create(1, request()).await.unwrap().filing.filing_id;
  svc.create(2, request()).await.unwrap();
  let third = svc.create(1, request()).await.unwrap().filing.filing_id;

  let mine: Vec<_> = svc.list(1).await.unwrap().into_iter().map(|v| v.filing.filing_id).collect();
  assert_eq!(mine, [third, first]);
  assert_eq!(svc.list_admin().await.unwrap().len(), 3);
}

#[tokio::test]
async fn get_records_a_patent_view() {
  let s = store().await;
  let counters = Arc::new(ActivityCounters::default());
  let svc = filings_on(&s, today()).with_observer(counters.clone());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;

  svc.get(id, 1).await.unwrap();
  svc.get_admin(id).await.unwrap();
  let _ = svc.get(id, 2).await;
  assert_eq!(counters.patent_views(), 2);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resubmission_moves_pending_response_to_under_review() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;

  let pending = svc
    .set_feedback(id, Some("Clarify claims".into()), Some(vec!["claims_path".into()]))
    .await
    .unwrap();
  assert_eq!(pending.filing.status, FilingStatus::PENDING_RESPONSE);
  assert_eq!(pending.filing.requested_update_fields, ["claims_path"]);

  let mut req = request();
  req.claims_path = Some("/uploads/claims-v2.pdf".into());
  req.inventors.clear();
  let updated = filings_on(&s, date(2025, 3, 20)).update(id, 1, req).await.unwrap();

  let f = &updated.filing;
  assert_eq!(f.status, FilingStatus::UNDER_REVIEW);
  assert!(f.requested_update_fields.is_empty());
  assert_eq!(f.content.claims_path.as_deref(), Some("/uploads/claims-v2.pdf"));
  assert_eq!(f.admin_feedback.as_deref(), Some("Clarify claims"));
  // Empty inventor list keeps the existing links.
  assert_eq!(f.inventors.len(), 2);
  assert_eq!(f.updated_at.date_naive(), date(2025, 3, 20));
  assert_eq!(count(&s, "filing_requested_updates").await, 0);
}

#[tokio::test]
async fn update_replaces_inventors_and_drawings() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let mut req = request();
  req.drawing_paths = Some(vec!["/d/1.png".into(), "/d/2.png".into()]);
  let id = svc.create(1, req).await.unwrap().filing.filing_id;

  let mut req = request();
  req.inventors = vec!["Jean Sammet".into()];
  req.drawing_paths = Some(vec!["/d/3.png".into()]);
  let f = svc.update(id, 1, req).await.unwrap().filing;

  assert_eq!(f.inventors.len(), 1);
  assert_eq!(f.inventors[0].name, "Jean Sammet");
  assert_eq!(f.content.drawing_paths, ["/d/3.png"]);

  // Omitted drawings are left alone.
  let f = svc.update(id, 1, request()).await.unwrap().filing;
  assert_eq!(f.content.drawing_paths, ["/d/3.png"]);
}

#[tokio::test]
async fn under_review_stays_sticky_past_expiry() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;
  svc.set_status(id, "under review").await.unwrap();

  let later = filings_on(&s, date(2045, 1, 1));
  let view = later.get(id, 1).await.unwrap();
  assert_eq!(view.filing.status, FilingStatus::UNDER_REVIEW);
}

#[tokio::test]
async fn reads_derive_status_past_a_stale_stored_value() {
  let s = store().await;
  let mut req = request();
  req.filing_date = Some(date(2005, 6, 1));
  let created = filings_on(&s, today()).create(1, req).await.unwrap();
  assert_eq!(created.filing.status, FilingStatus::EXPIRING_SOON);
  let id = created.filing.filing_id;

  let later = filings_on(&s, date(2025, 7, 1));
  assert_eq!(later.get(id, 1).await.unwrap().filing.status, FilingStatus::EXPIRED);
  assert_eq!(later.get_admin(id).await.unwrap().filing.status, FilingStatus::EXPIRED);

  let stored: String = s
    .conn
    .call(move |conn| {
      Ok(conn.query_row("SELECT status FROM filings WHERE filing_id = ?1", [id], |r| r.get(0))?)
    })
    .await
    .unwrap();
  assert_eq!(stored, String::from(FilingStatus::EXPIRING_SOON));
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn granting_stamps_grant_date_once() {
  let s = store().await;
  let id = filings_on(&s, today()).create(1, request()).await.unwrap().filing.filing_id;

  let first = filings_on(&s, today()).set_status(id, "granted").await.unwrap();
  assert_eq!(first.filing.status, FilingStatus::GRANTED);
  assert_eq!(first.filing.grant_date, Some(today()));

  let again = filings_on(&s, date(2025, 6, 1)).set_status(id, "GRANTED").await.unwrap();
  assert_eq!(again.filing.grant_date, Some(today()));
}

#[tokio::test]
async fn blank_status_is_rejected() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;
  assert!(matches!(
    svc.set_status(id, "  ").await,
    Err(CoreError::ValidationFailed { field: "status", .. })
  ));
}

#[tokio::test]
async fn feedback_does_not_reopen_settled_filings() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;
  svc.set_status(id, "REJECTED").await.unwrap();

  let view = svc
    .set_feedback(id, Some("Final".into()), Some(vec!["title".into()]))
    .await
    .unwrap();
  assert_eq!(view.filing.status, FilingStatus::REJECTED);
  assert_eq!(view.filing.requested_update_fields, ["title"]);
}

#[tokio::test]
async fn feedback_without_fields_keeps_status() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let id = svc.create(1, request()).await.unwrap().filing.filing_id;
  let view = svc.set_feedback(id, Some("Looks fine".into()), None).await.unwrap();
  assert_eq!(view.filing.status, FilingStatus::FILED);
  assert_eq!(view.filing.admin_feedback.as_deref(), Some("Looks fine"));
}

#[tokio::test]
async fn bulk_grant_skips_missing_ids() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let a = svc.create(1, request()).await.unwrap().filing.filing_id;
  let b = svc.create(2, request()).await.unwrap().filing.filing_id;
  let missing = b + 100;

  let outcome = svc
    .bulk_action(&[a, b, missing], "update_status", Some("GRANTED"))
    .await
    .unwrap();
  assert_eq!(outcome.applied, [a, b]);
  assert_eq!(outcome.skipped, [missing]);
  assert!(outcome.failed.is_empty());

  for id in [a, b] {
    let f = svc.get_admin(id).await.unwrap().filing;
    assert_eq!(f.status, FilingStatus::GRANTED);
    assert_eq!(f.grant_date, Some(today()));
  }
}

#[tokio::test]
async fn bulk_delete_removes_rows() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let a = svc.create(1, request()).await.unwrap().filing.filing_id;
  let b = svc.create(1, request()).await.unwrap().filing.filing_id;

  let outcome = svc.bulk_action(&[a, 42_000], "delete", None).await.unwrap();
  assert_eq!(outcome.applied, [a]);
  assert_eq!(outcome.skipped, [42_000]);
  assert!(svc.get_admin(a).await.is_err());
  svc.get_admin(b).await.unwrap();
}

#[tokio::test]
async fn bulk_rejects_bad_actions() {
  let s = store().await;
  let svc = filings_on(&s, today());
  assert!(matches!(
    svc.bulk_action(&[1], "ARCHIVE", None).await,
    Err(CoreError::ValidationFailed { field: "action", .. })
  ));
  assert!(matches!(
    svc.bulk_action(&[1], "UPDATE_STATUS", None).await,
    Err(CoreError::ValidationFailed { field: "value", .. })
  ));
}

#[tokio::test]
async fn delete_cascades_to_child_rows() {
  let s = store().await;
  let svc = filings_on(&s, today());
  let mut req = request();
  req.drawing_paths = Some(vec!["/d/1.png".into()]);
  let id = svc.create(1, req).await.unwrap().filing.filing_id;
  svc.set_feedback(id, None, Some(vec!["title".into()])).await.unwrap();

  svc.delete(id, 1).await.unwrap();
  assert_eq!(count(&s, "filings").await, 0);
  assert_eq!(count(&s, "filing_inventors").await, 0);
  assert_eq!(count(&s, "filing_drawings").await, 0);
  assert_eq!(count(&s, "filing_requested_updates").await, 0);
  // The inventor directory is shared and survives.
  assert_eq!(count(&s, "inventors").await, 2);
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

fn sighting(number: &str, filing: Option<NaiveDate>) -> TrackRequest {
  TrackRequest {
    title: Some("Rotary widget".into()),
    application_number: Some(number.into()),
    jurisdiction: Some("US".into()),
    ip_type: Some("patent".into()),
    filing_date: filing,
    ..Default::default()
  }
}

#[tokio::test]
async fn tracking_twice_is_idempotent() {
  let s = store().await;
  let first = trackers_on(&s, today())
    .track(sighting("US123", Some(date(2020, 1, 1))), 5)
    .await
    .unwrap();
  let second = trackers_on(&s, date(2025, 4, 1))
    .track(sighting("US123", Some(date(2020, 1, 1))), 5)
    .await
    .unwrap();

  assert_eq!(first, second);
  assert_eq!(second.updated_at, first.tracked_at);
  assert_eq!(count(&s, "filing_trackers").await, 1);
}

#[tokio::test]
async fn tracking_merges_later_grant() {
  let s = store().await;
  let svc = trackers_on(&s, today());
  svc.track(sighting("US9", Some(date(2020, 1, 1))), 5).await.unwrap();

  let mut granted = sighting("US9", Some(date(2020, 1, 1)));
  granted.grant_date = Some(date(2023, 5, 2));
  let view = trackers_on(&s, date(2025, 4, 1)).track(granted, 5).await.unwrap();

  assert_eq!(view.current_status, FilingStatus::GRANTED);
  assert_eq!(view.details.filing_date, Some(date(2020, 1, 1)));
  assert_eq!(view.details.grant_date, Some(date(2023, 5, 2)));
  assert_eq!(view.updated_at.date_naive(), date(2025, 4, 1));

  let stored = svc.get(view.tracker_id, 5).await.unwrap();
  assert_eq!(stored, view);
}

#[tokio::test]
async fn publication_only_sighting_keeps_filing_date() {
  let s = store().await;
  let svc = trackers_on(&s, today());
  svc.track(sighting("US123", Some(date(2020, 1, 1))), 5).await.unwrap();

  let publication = TrackRequest {
    application_number: Some("US123".into()),
    publication_date: Some(date(2021, 7, 1)),
    ..Default::default()
  };
  let view = svc.track(publication, 5).await.unwrap();
  assert_eq!(view.details.filing_date, Some(date(2020, 1, 1)));
  assert_eq!(view.details.publication_date, Some(date(2021, 7, 1)));
  assert_eq!(view.details.title.as_deref(), Some("Rotary widget"));
  assert_eq!(view.expiry_date, Some(date(2040, 1, 1)));
  assert_eq!(view.renewal_date, Some(date(2039, 7, 1)));
}

#[tokio::test]
async fn trackers_are_per_user() {
  let s = store().await;
  let svc = trackers_on(&s, today());
  let mine = svc.track(sighting("US1", None), 5).await.unwrap();
  let theirs = svc.track(sighting("US1", None), 6).await.unwrap();
  assert_ne!(mine.tracker_id, theirs.tracker_id);

  assert!(matches!(
    svc.get(mine.tracker_id, 6).await,
    Err(CoreError::NotFound { entity: "tracked filing", .. })
  ));
  assert_eq!(svc.list_for_user(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_application_number_always_inserts() {
  let s = store().await;
  let svc = trackers_on(&s, today());
  let anonymous = TrackRequest { title: Some("Untitled".into()), ..Default::default() };
  svc.track(anonymous.clone(), 5).await.unwrap();
  svc.track(anonymous, 5).await.unwrap();
  assert_eq!(svc.list_for_user(5).await.unwrap().len(), 2);
}

#[tokio::test]
async fn dashboard_summarises_user_rows() {
  let s = store().await;
  let svc = trackers_on(&s, today());

  let mut granted = sighting("A", Some(date(2015, 1, 1)));
  granted.grant_date = Some(date(2017, 1, 1));
  svc.track(granted, 5).await.unwrap();
  // Renewal 2025-03-20: due.
  svc.track(sighting("B", Some(date(2005, 9, 20))), 5).await.unwrap();
  // Expired 2023.
  svc.track(sighting("C", Some(date(2003, 1, 1))), 5).await.unwrap();
  // Someone else's row is not counted.
  svc.track(sighting("D", Some(date(2003, 1, 1))), 6).await.unwrap();

  let d = svc.dashboard(5).await.unwrap();
  assert_eq!((d.total, d.granted, d.renewal_due, d.expired), (3, 1, 1, 1));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unique_violation_is_a_conflict() {
  let s = store().await;
  let insert = |s: Arc<SqliteStore>| async move {
    s.conn
      .call(|conn| {
        conn.execute(
          "INSERT INTO filing_trackers (user_id, application_number, current_status, source, tracked_at, updated_at)
           VALUES (1, 'US77', 'FILED', 'IP_SEARCH', '2025-03-15T00:00:00.000000Z', '2025-03-15T00:00:00.000000Z')",
          [],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from)
  };

  insert(s.clone()).await.unwrap();
  let err = insert(s.clone()).await.unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "{err:?}");
  assert!(err.is_conflict());
}
