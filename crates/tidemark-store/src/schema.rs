//! Event store database schema.

/// SQL to create the event log table.
pub const CREATE_EVENT_LOG_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS event_log (
    global_position BIGSERIAL PRIMARY KEY,
    event_id        UUID NOT NULL UNIQUE,
    stream_id       TEXT NOT NULL,
    event_type      TEXT NOT NULL,
    payload         JSONB NOT NULL,
    sequence_number BIGINT NOT NULL,
    context         JSONB NOT NULL,
    UNIQUE (stream_id, sequence_number)
);

CREATE INDEX IF NOT EXISTS idx_event_log_stream_id
    ON event_log (stream_id, sequence_number);
";

/// SQL to create the dispatch cursors table.
pub const CREATE_DISPATCH_CURSORS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dispatch_cursors (
    consumer_group TEXT PRIMARY KEY,
    position       BIGINT NOT NULL,
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";
