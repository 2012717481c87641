//! Slot ledger: the single source of truth for who holds which raffle number.
//!
//! Writes go through [`arbitrate`], a pure decision over the current slot
//! state, the requested record and the caller's permission. The resulting
//! [`Mutation`] is then applied with one SQL statement. A guest claim is an
//! insert conditioned on the row still being absent, so two guests racing for
//! the same free slot can never both succeed: the loser sees zero affected
//! rows and gets [`LedgerError::SlotUnavailable`].

use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::models::slot::{SlotId, SlotIdError, SlotRecord, SlotState};

/// Permission level of the caller of a ledger write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Guest,
    Administrator,
}

impl Permission {
    pub fn is_admin(self) -> bool {
        self == Permission::Administrator
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Slot {0} is no longer available")]
    SlotUnavailable(SlotId),

    #[error("Invalid slot id: {0}")]
    InvalidSlot(#[from] SlotIdError),

    #[error("Slot {0} cannot be claimed with status libre")]
    FreeClaim(SlotId),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Import aborted at record {index}: {source}")]
    ImportAborted {
        index: usize,
        #[source]
        source: sqlx::Error,
    },
}

/// Storage change decided by [`arbitrate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert only if the slot is still free
    Claim(SlotRecord),
    /// Insert or fully replace the slot's row
    Put(SlotRecord),
    /// Delete the slot's row, if any
    Release(SlotId),
}

/// Decides what a write does, given the slot's current state and who is asking.
///
/// Guests may only occupy free slots and never set `validated`. Administrators
/// overwrite anything and free a slot by writing status `libre`.
pub fn arbitrate(
    current: &SlotState,
    change: SlotRecord,
    permission: Permission,
) -> Result<Mutation, LedgerError> {
    match (permission, current) {
        (Permission::Guest, SlotState::Occupied(_)) => Err(LedgerError::SlotUnavailable(change.id)),
        (Permission::Guest, SlotState::Free) if change.status.is_free() => {
            Err(LedgerError::FreeClaim(change.id))
        }
        (Permission::Guest, SlotState::Free) => Ok(Mutation::Claim(SlotRecord {
            validated: false,
            ..change
        })),
        (Permission::Administrator, _) if change.status.is_free() => {
            Ok(Mutation::Release(change.id))
        }
        (Permission::Administrator, _) => Ok(Mutation::Put(change)),
    }
}

#[derive(Clone)]
pub struct SlotLedger {
    pool: SqlitePool,
    id_width: usize,
}

impl SlotLedger {
    pub fn new(pool: SqlitePool, id_width: usize) -> Self {
        Self { pool, id_width }
    }

    pub fn normalize_id(&self, id: &SlotId) -> Result<SlotId, LedgerError> {
        Ok(id.with_width(self.id_width)?)
    }

    /// Every occupied slot keyed by id. Ids missing from the map are free.
    pub async fn list(&self) -> Result<BTreeMap<SlotId, SlotRecord>, LedgerError> {
        let rows = SlotRecord::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| (row.id.clone(), row)).collect())
    }

    pub async fn lookup(&self, id: &SlotId) -> Result<SlotState, LedgerError> {
        let id = self.normalize_id(id)?;
        let row = SlotRecord::find_by_id(&self.pool, &id).await?;
        Ok(SlotState::from(row))
    }

    /// Claims, updates or releases one slot and returns its resulting state
    pub async fn write(
        &self,
        mut change: SlotRecord,
        permission: Permission,
    ) -> Result<SlotState, LedgerError> {
        change.id = self.normalize_id(&change.id)?;

        let current = SlotState::from(SlotRecord::find_by_id(&self.pool, &change.id).await?);
        let mutation = arbitrate(&current, change, permission).map_err(|e| {
            if let LedgerError::SlotUnavailable(id) = &e {
                tracing::warn!(slot = %id, "Rejected claim on occupied slot");
            }
            e
        })?;

        self.apply(mutation).await
    }

    async fn apply(&self, mutation: Mutation) -> Result<SlotState, LedgerError> {
        match mutation {
            Mutation::Claim(record) => {
                if record.insert_if_absent(&self.pool).await? == 0 {
                    tracing::warn!(slot = %record.id, "Slot was taken by a concurrent claim");
                    return Err(LedgerError::SlotUnavailable(record.id));
                }
                tracing::info!(slot = %record.id, status = %record.status, "Slot claimed");
                Ok(SlotState::Occupied(record))
            }
            Mutation::Put(record) => {
                record.upsert(&self.pool).await?;
                tracing::info!(
                    slot = %record.id,
                    status = %record.status,
                    validated = record.validated,
                    "Slot overwritten by administrator"
                );
                Ok(SlotState::Occupied(record))
            }
            Mutation::Release(id) => {
                let deleted = SlotRecord::delete(&self.pool, &id).await?;
                tracing::info!(slot = %id, deleted, "Slot released");
                Ok(SlotState::Free)
            }
        }
    }

    /// Occupied slots by ascending id, for reports
    pub async fn export_rows(&self) -> Result<Vec<SlotRecord>, LedgerError> {
        Ok(SlotRecord::list_ordered(&self.pool).await?)
    }

    /// Occupied slots in storage order
    pub async fn dump(&self) -> Result<Vec<SlotRecord>, LedgerError> {
        Ok(SlotRecord::list_all(&self.pool).await?)
    }

    /// Upserts every record with administrator semantics, all or nothing.
    ///
    /// Returns the number of records applied.
    pub async fn import(&self, records: Vec<SlotRecord>) -> Result<usize, LedgerError> {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.id = self.normalize_id(&record.id)?;
                Ok(record)
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let mut tx = self.pool.begin().await?;

        for (index, record) in records.iter().enumerate() {
            if let Err(source) = record.upsert(&mut *tx).await {
                tracing::error!(
                    index,
                    slot = %record.id,
                    error = %source,
                    "Bulk import failed, rolling back"
                );
                tx.rollback().await?;
                return Err(LedgerError::ImportAborted { index, source });
            }
        }

        tx.commit().await?;
        tracing::info!(count = records.len(), "Bulk import committed");

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::SlotStatus;

    fn record(id: &str, status: &str, validated: bool) -> SlotRecord {
        SlotRecord {
            id: SlotId::parse(id).unwrap(),
            name: "Ana".to_string(),
            phone: "555".to_string(),
            status: SlotStatus::new(status).unwrap(),
            collector: String::new(),
            validated,
        }
    }

    #[test]
    fn test_guest_claims_free_slot_without_validation() {
        let mutation = arbitrate(
            &SlotState::Free,
            record("07", "reservado", true),
            Permission::Guest,
        )
        .unwrap();

        assert_eq!(mutation, Mutation::Claim(record("07", "reservado", false)));
    }

    #[test]
    fn test_guest_cannot_touch_occupied_slot() {
        let current = SlotState::Occupied(record("07", "pagado", true));

        for status in ["reservado", "libre"] {
            let result = arbitrate(&current, record("07", status, false), Permission::Guest);
            assert!(matches!(result, Err(LedgerError::SlotUnavailable(id)) if id.as_str() == "07"));
        }
    }

    #[test]
    fn test_guest_cannot_claim_slot_as_free() {
        let result = arbitrate(&SlotState::Free, record("07", "libre", false), Permission::Guest);
        assert!(matches!(result, Err(LedgerError::FreeClaim(_))));
    }

    #[test]
    fn test_admin_overwrites_any_state() {
        let occupied = SlotState::Occupied(record("07", "reservado", false));

        for current in [SlotState::Free, occupied] {
            let mutation = arbitrate(
                &current,
                record("07", "pagado", true),
                Permission::Administrator,
            )
            .unwrap();
            assert_eq!(mutation, Mutation::Put(record("07", "pagado", true)));
        }
    }

    #[test]
    fn test_admin_release_ignores_current_state() {
        let occupied = SlotState::Occupied(record("07", "reservado", false));

        for current in [SlotState::Free, occupied] {
            let mutation =
                arbitrate(&current, record("07", "libre", true), Permission::Administrator)
                    .unwrap();
            assert_eq!(mutation, Mutation::Release(SlotId::parse("07").unwrap()));
        }
    }
}
