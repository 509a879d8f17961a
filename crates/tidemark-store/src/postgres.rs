//! `PostgreSQL` storage adapters.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use tidemark_core::error::EventStoreError;
use tidemark_core::event::EventContext;
use tidemark_core::store::{DispatchCursorStore, EventStore, SequencedEvent, StoredEvent};

fn storage(error: sqlx::Error) -> EventStoreError {
    EventStoreError::Storage(error.to_string())
}

fn row_to_stored(row: &PgRow) -> Result<StoredEvent, EventStoreError> {
    let context: serde_json::Value = row.try_get("context").map_err(storage)?;
    let context: EventContext = serde_json::from_value(context)
        .map_err(|e| EventStoreError::Storage(format!("undecodable event context: {e}")))?;
    Ok(StoredEvent {
        event_id: row.try_get::<Uuid, _>("event_id").map_err(storage)?,
        stream_id: row.try_get("stream_id").map_err(storage)?,
        event_type: row.try_get("event_type").map_err(storage)?,
        payload: row.try_get("payload").map_err(storage)?,
        sequence_number: row.try_get("sequence_number").map_err(storage)?,
        context,
    })
}

/// `PostgreSQL`-backed event store.
///
/// The conditional append takes a per-stream advisory lock inside one
/// transaction, checks the stream's current version, and inserts every
/// event or none. The `BIGSERIAL` primary key provides the global
/// append-order position the outbox tails.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn read_stream(&self, stream_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query(
            "SELECT event_id, stream_id, event_type, payload, sequence_number, context
             FROM event_log
             WHERE stream_id = $1
             ORDER BY sequence_number",
        )
        .bind(stream_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_stored).collect()
    }

    async fn append(
        &self,
        stream_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, EventStoreError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Serialize writers to this stream for the duration of the version
        // check and insert. Released automatically at commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(stream_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(sequence_number), 0) AS version
             FROM event_log
             WHERE stream_id = $1",
        )
        .bind(stream_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;
        let actual: i64 = row.try_get("version").map_err(storage)?;

        if actual != expected_version {
            return Err(EventStoreError::Conflict {
                stream_id: stream_id.to_owned(),
                expected: expected_version,
                actual,
            });
        }

        for (offset, event) in events.iter().enumerate() {
            let sequence = expected_version
                + 1
                + i64::try_from(offset)
                    .map_err(|_| EventStoreError::Storage("append batch too large".to_owned()))?;
            if event.sequence_number != sequence {
                return Err(EventStoreError::Storage(format!(
                    "event out of sequence in stream {stream_id}: expected {sequence}, got {}",
                    event.sequence_number
                )));
            }
            let context = serde_json::to_value(&event.context)
                .map_err(|e| EventStoreError::Storage(format!("unencodable context: {e}")))?;
            sqlx::query(
                "INSERT INTO event_log
                     (event_id, stream_id, event_type, payload, sequence_number, context)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(event.event_id)
            .bind(stream_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(context)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;

        let new_version = expected_version
            + i64::try_from(events.len())
                .map_err(|_| EventStoreError::Storage("append batch too large".to_owned()))?;
        tracing::debug!(stream_id, new_version, "appended events");
        Ok(new_version)
    }

    async fn read_after(
        &self,
        position: u64,
        limit: usize,
    ) -> Result<Vec<SequencedEvent>, EventStoreError> {
        let after = i64::try_from(position)
            .map_err(|_| EventStoreError::Storage(format!("position {position} out of range")))?;
        let limit = i64::try_from(limit)
            .map_err(|_| EventStoreError::Storage("limit out of range".to_owned()))?;

        let rows = sqlx::query(
            "SELECT global_position, event_id, stream_id, event_type, payload,
                    sequence_number, context
             FROM event_log
             WHERE global_position > $1
             ORDER BY global_position
             LIMIT $2",
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter()
            .map(|row| {
                let global: i64 = row.try_get("global_position").map_err(storage)?;
                let position = u64::try_from(global).map_err(|_| {
                    EventStoreError::Storage(format!("negative global position {global}"))
                })?;
                Ok(SequencedEvent {
                    position,
                    event: row_to_stored(row)?,
                })
            })
            .collect()
    }
}

/// `PostgreSQL`-backed dispatch cursor store. The upsert only ever moves a
/// cursor forward.
#[derive(Debug, Clone)]
pub struct PgCursorStore {
    pool: PgPool,
}

impl PgCursorStore {
    /// Creates a new `PgCursorStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchCursorStore for PgCursorStore {
    async fn load(&self, consumer_group: &str) -> Result<Option<u64>, EventStoreError> {
        let row = sqlx::query("SELECT position FROM dispatch_cursors WHERE consumer_group = $1")
            .bind(consumer_group)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(|row| {
            let position: i64 = row.try_get("position").map_err(storage)?;
            u64::try_from(position)
                .map_err(|_| EventStoreError::Storage(format!("negative cursor {position}")))
        })
        .transpose()
    }

    async fn save(&self, consumer_group: &str, position: u64) -> Result<(), EventStoreError> {
        let position = i64::try_from(position)
            .map_err(|_| EventStoreError::Storage(format!("cursor {position} out of range")))?;

        sqlx::query(
            "INSERT INTO dispatch_cursors (consumer_group, position)
             VALUES ($1, $2)
             ON CONFLICT (consumer_group) DO UPDATE
                 SET position = EXCLUDED.position, updated_at = NOW()
                 WHERE dispatch_cursors.position < EXCLUDED.position",
        )
        .bind(consumer_group)
        .bind(position)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}
