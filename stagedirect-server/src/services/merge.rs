//! Merge orchestration for duplicate companies and contacts
//!
//! **Algorithm (company merge):**
//! 1. Validate the id pair (no storage access)
//! 2. Take the process-wide merge lock, open a transaction
//! 3. Load both records; either missing rolls back with no writes
//! 4. Compute the merged field set
//! 5. Update the primary, re-point the secondary's dependants, delete it
//! 6. Commit, release the lock, reload the directory
//!
//! Steps 2-5 run under the configured timeout. Commit happens outside it, so a
//! timeout always means the transaction was dropped (rolled back).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{Sqlite, SqlitePool, Transaction};
use stagedirect_common::config::MergeConfig;
use stagedirect_common::db::{Company, Contact};
use stagedirect_common::{find_matches, merge_companies, ValidatedPolicy};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::db::companies::{self, CompanyFilter};
use crate::db::contacts;

/// Write step that failed after the transaction started mutating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    Update,
    Reassign,
    Delete,
    Commit,
}

impl std::fmt::Display for MergeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MergeStage::Update => "update",
            MergeStage::Reassign => "reassign",
            MergeStage::Delete => "delete",
            MergeStage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Merge failures, each with its own HTTP mapping
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// Rolled back; nothing was persisted
    #[error("merge aborted during {stage}: {source}")]
    Aborted {
        stage: MergeStage,
        #[source]
        source: stagedirect_common::Error,
    },

    /// Committed, but the refreshed list could not be read
    #[error("merge committed but reload failed: {0}")]
    ReloadFailed(stagedirect_common::Error),

    #[error("merge did not finish within {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Read failure before any write
    #[error("storage error: {0}")]
    Storage(stagedirect_common::Error),
}

type Staged = (OwnedMutexGuard<()>, Transaction<'static, Sqlite>);

/// Check an id pair before touching storage
///
/// Both ids must be present, positive and distinct.
pub fn validate_pair(
    first: Option<i64>,
    second: Option<i64>,
    first_name: &str,
    second_name: &str,
) -> Result<(i64, i64), MergeError> {
    let first = first.ok_or_else(|| MergeError::Validation(format!("{} is required", first_name)))?;
    let second =
        second.ok_or_else(|| MergeError::Validation(format!("{} is required", second_name)))?;

    if first <= 0 || second <= 0 {
        return Err(MergeError::Validation(format!(
            "{} and {} must be positive",
            first_name, second_name
        )));
    }
    if first == second {
        return Err(MergeError::Validation(format!(
            "{} and {} must differ",
            first_name, second_name
        )));
    }

    Ok((first, second))
}

/// Company ids linked to either contact, ascending and without duplicates
pub fn union_company_links(first: &[i64], second: &[i64]) -> Vec<i64> {
    first
        .iter()
        .chain(second.iter())
        .copied()
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect()
}

/// Serialised, transactional merge workflow
#[derive(Clone)]
pub struct MergeService {
    pool: SqlitePool,
    lock: Arc<Mutex<()>>,
    policy: ValidatedPolicy,
    timeout: Duration,
}

impl MergeService {
    pub fn new(pool: SqlitePool, config: &MergeConfig) -> Self {
        Self {
            pool,
            lock: Arc::new(Mutex::new(())),
            policy: config.validated_policy,
            timeout: config.timeout(),
        }
    }

    /// Companies whose normalised name equals the normalised search term
    pub async fn find_duplicates(&self, search_term: &str) -> stagedirect_common::Result<Vec<Company>> {
        let all = companies::list_companies(&self.pool, &CompanyFilter::default())
            .await
            .map_err(|e| {
                error!(search_term, "Duplicate lookup failed: {}", e);
                e
            })?;
        let matches = find_matches(all, search_term);
        debug!(search_term, found = matches.len(), "Duplicate lookup");
        Ok(matches)
    }

    /// Merge `secondary_id` into `primary_id`; returns the refreshed directory
    pub async fn merge_companies(
        &self,
        primary_id: i64,
        secondary_id: i64,
    ) -> Result<Vec<Company>, MergeError> {
        validate_pair(Some(primary_id), Some(secondary_id), "primaryId", "secondaryId")?;

        let staged = tokio::time::timeout(self.timeout, async {
            let (guard, mut tx) = self.begin_locked("company", primary_id, secondary_id).await?;

            let primary = companies::load_company(&mut *tx, primary_id)
                .await
                .map_err(|e| read_failed("company", primary_id, secondary_id, "load primary", e))?
                .ok_or(MergeError::NotFound { kind: "company", id: primary_id })?;
            let secondary = companies::load_company(&mut *tx, secondary_id)
                .await
                .map_err(|e| read_failed("company", primary_id, secondary_id, "load secondary", e))?
                .ok_or(MergeError::NotFound { kind: "company", id: secondary_id })?;

            let merged = merge_companies(&primary, &secondary, self.policy);

            let updated = companies::update_company(&mut *tx, primary_id, &merged)
                .await
                .map_err(|e| aborted(MergeStage::Update, "company", primary_id, secondary_id, e))?;
            if !updated {
                return Err(aborted(
                    MergeStage::Update,
                    "company",
                    primary_id,
                    secondary_id,
                    stagedirect_common::Error::NotFound(format!("company {}", primary_id)),
                ));
            }

            let moved = companies::reassign_company_references(&mut tx, secondary_id, primary_id)
                .await
                .map_err(|e| aborted(MergeStage::Reassign, "company", primary_id, secondary_id, e))?;
            debug!(
                primary_id,
                secondary_id,
                contact_links = moved.contact_links,
                internships = moved.internships,
                kanban_cards = moved.kanban_cards,
                "Reassigned company dependants"
            );

            let deleted = companies::delete_company(&mut *tx, secondary_id)
                .await
                .map_err(|e| aborted(MergeStage::Delete, "company", primary_id, secondary_id, e))?;
            if !deleted {
                return Err(aborted(
                    MergeStage::Delete,
                    "company",
                    primary_id,
                    secondary_id,
                    stagedirect_common::Error::NotFound(format!("company {}", secondary_id)),
                ));
            }

            Ok::<Staged, MergeError>((guard, tx))
        })
        .await
        .map_err(|_| self.timed_out("company", primary_id, secondary_id))??;

        self.commit(staged, "company", primary_id, secondary_id).await?;
        info!(primary_id, secondary_id, policy = %self.policy, "Merged companies");

        companies::list_companies(&self.pool, &CompanyFilter::default())
            .await
            .map_err(|e| {
                error!(primary_id, secondary_id, "Reload after company merge failed: {}", e);
                MergeError::ReloadFailed(e)
            })
    }

    /// Merge contact `second_id` into `first_id`; returns the refreshed contact list
    pub async fn merge_contacts(
        &self,
        first_id: i64,
        second_id: i64,
    ) -> Result<Vec<Contact>, MergeError> {
        validate_pair(Some(first_id), Some(second_id), "contactId1", "contactId2")?;

        let staged = tokio::time::timeout(self.timeout, async {
            let (guard, mut tx) = self.begin_locked("contact", first_id, second_id).await?;

            for id in [first_id, second_id] {
                let found = contacts::load_contact(&mut *tx, id)
                    .await
                    .map_err(|e| read_failed("contact", first_id, second_id, "load contact", e))?;
                if found.is_none() {
                    return Err(MergeError::NotFound { kind: "contact", id });
                }
            }

            let first_links = contacts::linked_company_ids(&mut *tx, first_id)
                .await
                .map_err(|e| read_failed("contact", first_id, second_id, "load links", e))?;
            let second_links = contacts::linked_company_ids(&mut *tx, second_id)
                .await
                .map_err(|e| read_failed("contact", first_id, second_id, "load links", e))?;
            let links = union_company_links(&first_links, &second_links);

            contacts::set_linked_companies(&mut tx, first_id, &links)
                .await
                .map_err(|e| aborted(MergeStage::Update, "contact", first_id, second_id, e))?;

            let moved = contacts::reassign_contact_references(&mut tx, second_id, first_id)
                .await
                .map_err(|e| aborted(MergeStage::Reassign, "contact", first_id, second_id, e))?;
            debug!(
                first_id,
                second_id,
                links = links.len(),
                primary_contact_of = moved.primary_contact_of,
                tutored_internships = moved.tutored_internships,
                "Reassigned contact dependants"
            );

            let deleted = contacts::delete_contact(&mut *tx, second_id)
                .await
                .map_err(|e| aborted(MergeStage::Delete, "contact", first_id, second_id, e))?;
            if !deleted {
                return Err(aborted(
                    MergeStage::Delete,
                    "contact",
                    first_id,
                    second_id,
                    stagedirect_common::Error::NotFound(format!("contact {}", second_id)),
                ));
            }

            Ok::<Staged, MergeError>((guard, tx))
        })
        .await
        .map_err(|_| self.timed_out("contact", first_id, second_id))??;

        self.commit(staged, "contact", first_id, second_id).await?;
        info!(first_id, second_id, "Merged contacts");

        contacts::list_contacts(&self.pool).await.map_err(|e| {
            error!(first_id, second_id, "Reload after contact merge failed: {}", e);
            MergeError::ReloadFailed(e)
        })
    }

    /// Take the merge lock, then open a write transaction
    ///
    /// `BEGIN IMMEDIATE` reserves the write lock up front, so a writer outside
    /// the merge cannot invalidate the snapshot between the reads and the update.
    async fn begin_locked(
        &self,
        kind: &'static str,
        keep: i64,
        remove: i64,
    ) -> Result<Staged, MergeError> {
        let guard = self.lock.clone().lock_owned().await;
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| read_failed(kind, keep, remove, "begin", e.into()))?;
        Ok((guard, tx))
    }

    async fn commit(
        &self,
        (guard, tx): Staged,
        kind: &'static str,
        keep: i64,
        remove: i64,
    ) -> Result<(), MergeError> {
        let result = tx.commit().await;
        drop(guard);
        result.map_err(|e| aborted(MergeStage::Commit, kind, keep, remove, e.into()))
    }

    fn timed_out(&self, kind: &'static str, keep: i64, remove: i64) -> MergeError {
        warn!(kind, keep, remove, timeout_ms = self.timeout.as_millis() as u64, "Merge timed out, rolled back");
        MergeError::Timeout(self.timeout)
    }
}

/// Failure before the first write; nothing to roll back
fn read_failed(
    kind: &'static str,
    keep: i64,
    remove: i64,
    operation: &'static str,
    source: stagedirect_common::Error,
) -> MergeError {
    error!(kind, keep, remove, operation, "Merge read failed: {}", source);
    MergeError::Storage(source)
}

fn aborted(
    stage: MergeStage,
    kind: &'static str,
    keep: i64,
    remove: i64,
    source: stagedirect_common::Error,
) -> MergeError {
    error!(kind, keep, remove, %stage, "Merge failed, rolling back: {}", source);
    MergeError::Aborted { stage, source }
}
