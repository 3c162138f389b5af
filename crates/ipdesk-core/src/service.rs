//! Application services: validation, ownership, clock and observer wiring
//! around a store.
//!
//! Handlers talk to these, never to a store directly, so every front end
//! gets the same error mapping and the same derived views.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
  Error, Result, UserId,
  clock::{Clock, SystemClock},
  filing::{Filing, FilingRequest, FilingView},
  lifecycle::{BulkAction, BulkFailure, BulkOutcome, NewFiling, admin_status},
  observer::{ActivityObserver, NoopObserver},
  store::{FilingStore, StoreError, TrackerStore},
  tracker::{Dashboard, TrackRequest, TrackerView},
};

// ─── Filings ─────────────────────────────────────────────────────────────────

pub struct FilingService<S> {
  store:    Arc<S>,
  clock:    Arc<dyn Clock>,
  observer: Arc<dyn ActivityObserver>,
}

impl<S> Clone for FilingService<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      clock:    self.clock.clone(),
      observer: self.observer.clone(),
    }
  }
}

impl<S: FilingStore> FilingService<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      clock: Arc::new(SystemClock),
      observer: Arc::new(NoopObserver),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_observer(mut self, observer: Arc<dyn ActivityObserver>) -> Self {
    self.observer = observer;
    self
  }

  fn view(&self, filing: Filing) -> FilingView {
    FilingView::from_filing(filing, self.clock.today())
  }

  // ── Applicant operations ──────────────────────────────────────────────

  pub async fn create(&self, user_id: UserId, request: FilingRequest) -> Result<FilingView> {
    request.validate()?;
    let now = self.clock.now();
    let new = NewFiling::prepare(user_id, &request, now.date_naive());
    let filing = self.store.insert_filing(new, now).await.map_err(Error::store)?;
    info!(
      filing_id = filing.filing_id,
      user_id,
      application_number = %filing.application_number,
      status = %filing.status,
      "filing created"
    );
    Ok(self.view(filing))
  }

  pub async fn update(
    &self,
    id: i64,
    user_id: UserId,
    request: FilingRequest,
  ) -> Result<FilingView> {
    request.validate()?;
    let filing = self
      .store
      .update_filing(id, user_id, request, self.clock.now())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::filing_not_found(id))?;
    info!(filing_id = id, user_id, status = %filing.status, "filing updated");
    Ok(self.view(filing))
  }

  pub async fn delete(&self, id: i64, user_id: UserId) -> Result<()> {
    let deleted = self
      .store
      .delete_filing(id, Some(user_id))
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::filing_not_found(id));
    }
    info!(filing_id = id, user_id, "filing deleted");
    Ok(())
  }

  pub async fn get(&self, id: i64, user_id: UserId) -> Result<FilingView> {
    let filing = self
      .store
      .get_filing(id, Some(user_id))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::filing_not_found(id))?;
    self.observer.record_patent_view(Some(user_id), id);
    Ok(self.view(filing))
  }

  pub async fn list(&self, user_id: UserId) -> Result<Vec<FilingView>> {
    let filings = self
      .store
      .list_filings(Some(user_id))
      .await
      .map_err(Error::store)?;
    Ok(filings.into_iter().map(|f| self.view(f)).collect())
  }

  // ── Admin operations ──────────────────────────────────────────────────

  pub async fn get_admin(&self, id: i64) -> Result<FilingView> {
    let filing = self
      .store
      .get_filing(id, None)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::filing_not_found(id))?;
    self.observer.record_patent_view(None, id);
    Ok(self.view(filing))
  }

  pub async fn list_admin(&self) -> Result<Vec<FilingView>> {
    let filings = self.store.list_filings(None).await.map_err(Error::store)?;
    Ok(filings.into_iter().map(|f| self.view(f)).collect())
  }

  pub async fn set_status(&self, id: i64, status: &str) -> Result<FilingView> {
    let status = admin_status(status)?;
    let filing = self
      .store
      .set_filing_status(id, status, self.clock.now())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::filing_not_found(id))?;
    info!(filing_id = id, status = %filing.status, grant_date = ?filing.grant_date, "status set");
    Ok(self.view(filing))
  }

  pub async fn set_feedback(
    &self,
    id: i64,
    feedback: Option<String>,
    requested_fields: Option<Vec<String>>,
  ) -> Result<FilingView> {
    let filing = self
      .store
      .set_filing_feedback(id, feedback, requested_fields, self.clock.now())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::filing_not_found(id))?;
    info!(
      filing_id = id,
      status = %filing.status,
      requested = filing.requested_update_fields.len(),
      "feedback recorded"
    );
    Ok(self.view(filing))
  }

  /// Apply `action` to each id in turn. The action itself is validated up
  /// front; after that, each row succeeds or fails on its own.
  pub async fn bulk_action(
    &self,
    ids: &[i64],
    action: &str,
    value: Option<&str>,
  ) -> Result<BulkOutcome> {
    let action = BulkAction::parse(action, value)?;
    let now = self.clock.now();
    let mut outcome = BulkOutcome::default();

    for &id in ids {
      let result = match &action {
        BulkAction::Delete => self.store.delete_filing(id, None).await,
        BulkAction::UpdateStatus(status) => self
          .store
          .set_filing_status(id, status.clone(), now)
          .await
          .map(|f| f.is_some()),
      };
      match result {
        Ok(true) => outcome.applied.push(id),
        Ok(false) => outcome.skipped.push(id),
        Err(e) => {
          warn!(filing_id = id, error = %e, "bulk action failed for row");
          outcome.failed.push(BulkFailure { filing_id: id, message: e.to_string() });
        }
      }
    }

    info!(
      ?action,
      applied = outcome.applied.len(),
      skipped = outcome.skipped.len(),
      failed = outcome.failed.len(),
      "bulk action finished"
    );
    Ok(outcome)
  }
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

pub struct TrackerService<S> {
  store: Arc<S>,
  clock: Arc<dyn Clock>,
}

impl<S> Clone for TrackerService<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), clock: self.clock.clone() }
  }
}

impl<S: TrackerStore> TrackerService<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, clock: Arc::new(SystemClock) }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Record a sighting of an asset for `user_id`. Calling this again with
  /// the same application number merges into the existing row.
  pub async fn track(&self, request: TrackRequest, user_id: UserId) -> Result<TrackerView> {
    let now = self.clock.now();
    let row = match self.store.track(user_id, request.clone(), now).await {
      Ok(row) => row,
      Err(e) if e.is_conflict() => {
        warn!(
          user_id,
          application_number = ?request.application_number,
          "tracker insert raced; retrying as merge"
        );
        self.store.track(user_id, request, now).await.map_err(|e| {
          if e.is_conflict() { Error::Conflict(e.to_string()) } else { Error::store(e) }
        })?
      }
      Err(e) => return Err(Error::store(e)),
    };
    debug!(
      tracker_id = row.tracker_id,
      user_id,
      status = %row.current_status,
      updated = row.updated_at == now,
      "tracked"
    );
    Ok(row.into())
  }

  pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<TrackerView>> {
    let rows = self.store.list_tracked(user_id).await.map_err(Error::store)?;
    Ok(rows.into_iter().map(TrackerView::from).collect())
  }

  pub async fn get(&self, id: i64, user_id: UserId) -> Result<TrackerView> {
    self
      .store
      .get_tracked(id, user_id)
      .await
      .map_err(Error::store)?
      .map(TrackerView::from)
      .ok_or_else(|| Error::tracker_not_found(id))
  }

  pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard> {
    let rows = self.store.list_tracked(user_id).await.map_err(Error::store)?;
    Ok(Dashboard::aggregate(&rows, self.clock.today()))
  }
}
