use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Status value that marks a slot as free. Never persisted.
pub const FREE_STATUS: &str = "libre";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotIdError {
    #[error("Slot id must be a non-empty string of digits, got {0:?}")]
    NotNumeric(String),

    #[error("Slot id {id} does not fit in {width} digits")]
    TooWide { id: String, width: usize },
}

/// Raffle number, kept as a zero-padded decimal string once normalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn parse(raw: &str) -> Result<Self, SlotIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SlotIdError::NotNumeric(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Left-pads the id with zeros to exactly `width` digits.
    pub fn with_width(&self, width: usize) -> Result<Self, SlotIdError> {
        let significant = self.0.trim_start_matches('0');
        if significant.len() > width {
            return Err(SlotIdError::TooWide {
                id: self.0.clone(),
                width,
            });
        }
        Ok(Self(format!("{:0>width$}", significant, width = width)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SlotId {
    type Err = SlotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Clients send the id either as "07" or as the number 7.
impl<'de> Deserialize<'de> for SlotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SlotIdVisitor;

        impl<'de> de::Visitor<'de> for SlotIdVisitor {
            type Value = SlotId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a slot number as a digit string or non-negative integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SlotId, E> {
                SlotId::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SlotId, E> {
                Ok(SlotId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SlotId, E> {
                u64::try_from(v)
                    .map(|n| SlotId(n.to_string()))
                    .map_err(|_| E::custom(SlotIdError::NotNumeric(v.to_string())))
            }
        }

        deserializer.deserialize_any(SlotIdVisitor)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Slot status must not be empty")]
pub struct SlotStatusError;

/// Free-form occupancy tag such as "reservado" or "pagado"; `libre` means free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SlotStatus(String);

impl SlotStatus {
    pub fn new(raw: &str) -> Result<Self, SlotStatusError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SlotStatusError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn free() -> Self {
        Self(FREE_STATUS.to_string())
    }

    pub fn is_free(&self) -> bool {
        self.0 == FREE_STATUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SlotStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SlotStatus::new(&raw).map_err(de::Error::custom)
    }
}

/// A slot's occupancy record. Also the body of slot writes and imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SlotRecord {
    pub id: SlotId,
    #[serde(default, alias = "nombre", deserialize_with = "nullable_text")]
    pub name: String,
    #[serde(default, alias = "telefono", deserialize_with = "nullable_text")]
    pub phone: String,
    pub status: SlotStatus,
    #[serde(default, alias = "cobrador", deserialize_with = "nullable_text")]
    pub collector: String,
    #[serde(default, alias = "validado", deserialize_with = "flag")]
    pub validated: bool,
}

fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Older dumps store the flag as a 0/1 integer column.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None | Some(Flag::Int(0)) => Ok(false),
        Some(Flag::Bool(value)) => Ok(value),
        Some(Flag::Int(1)) => Ok(true),
        Some(Flag::Int(other)) => Err(de::Error::custom(format!(
            "validated flag must be true, false, 0 or 1, got {}",
            other
        ))),
    }
}

/// Occupancy of a slot as seen by the ledger. A missing row is `Free`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Occupied(SlotRecord),
}

impl SlotState {
    pub fn is_free(&self) -> bool {
        matches!(self, SlotState::Free)
    }
}

impl From<Option<SlotRecord>> for SlotState {
    fn from(row: Option<SlotRecord>) -> Self {
        row.map_or(SlotState::Free, SlotState::Occupied)
    }
}

impl SlotRecord {
    /// Finds the row for a slot, if it is occupied
    pub async fn find_by_id(pool: &SqlitePool, id: &SlotId) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, phone, status, collector, validated
            FROM slots WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists every occupied slot in storage order
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, phone, status, collector, validated FROM slots
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Lists every occupied slot by ascending id
    pub async fn list_ordered(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, name, phone, status, collector, validated
            FROM slots
            ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Inserts the row only when the slot has no row yet.
    ///
    /// Returns the number of inserted rows: 0 means the slot was already taken.
    pub async fn insert_if_absent<'e, E>(&self, executor: E) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO slots (id, name, phone, status, collector, validated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.phone)
        .bind(&self.status)
        .bind(&self.collector)
        .bind(self.validated)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Inserts the row or replaces every column of the existing one
    pub async fn upsert<'e, E>(&self, executor: E) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO slots (id, name, phone, status, collector, validated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                status = excluded.status,
                collector = excluded.collector,
                validated = excluded.validated
            "#,
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.phone)
        .bind(&self.status)
        .bind(&self.collector)
        .bind(self.validated)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Deletes the row for a slot. Deleting a free slot is not an error.
    pub async fn delete<'e, E>(executor: E, id: &SlotId) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM slots WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
