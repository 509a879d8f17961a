//! Command handlers for the Booking context.
//!
//! Each handler orchestrates one unit of work: load the aggregate through
//! the repository, let the domain decide, and flush the resulting events.
//! Domain rejections are ordinary outcomes; only runtime failures are
//! errors.

use tidemark_core::aggregate::AggregateRoot;
use tidemark_core::clock::Clock;
use tidemark_core::command::Command;
use tidemark_core::error::RepositoryError;
use tidemark_core::repository::AggregateRepository;

use crate::domain::aggregates::{Booking, BookingError};
use crate::domain::commands::{Book, Cancel};

/// Outcome of handling a booking command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The decision was recorded and committed at this stream version.
    Accepted {
        /// The stream's version after the commit.
        version: i64,
    },
    /// A domain rule refused the command; nothing was recorded.
    Rejected(BookingError),
}

/// Handles the `Book` command.
///
/// # Errors
///
/// Returns [`RepositoryError`] when loading or committing fails; in
/// particular a concurrency conflict when another writer got there first,
/// in which case the caller reloads and retries.
pub async fn handle_book(
    command: &Book,
    clock: &dyn Clock,
    repository: &mut AggregateRepository<Booking>,
) -> Result<CommandOutcome, RepositoryError> {
    tracing::debug!(
        command_type = command.command_type(),
        booking_id = %command.booking_id,
        "handling command"
    );

    let booking = repository.get(&command.booking_id).await?;
    if let Err(rejection) = booking.book(
        command.reference.clone(),
        command.causation_id,
        command.actor.clone(),
        clock,
    ) {
        return Ok(CommandOutcome::Rejected(rejection));
    }

    commit(repository, &command.booking_id).await
}

/// Handles the `Cancel` command.
///
/// # Errors
///
/// Returns [`RepositoryError`] when loading or committing fails, including
/// [`RepositoryError::NotFound`] for a booking that was never created.
pub async fn handle_cancel(
    command: &Cancel,
    clock: &dyn Clock,
    repository: &mut AggregateRepository<Booking>,
) -> Result<CommandOutcome, RepositoryError> {
    tracing::debug!(
        command_type = command.command_type(),
        booking_id = %command.booking_id,
        "handling command"
    );

    let booking = repository.require(&command.booking_id).await?;
    if let Err(rejection) = booking.cancel(command.causation_id, command.actor.clone(), clock) {
        return Ok(CommandOutcome::Rejected(rejection));
    }

    commit(repository, &command.booking_id).await
}

async fn commit(
    repository: &mut AggregateRepository<Booking>,
    stream_id: &str,
) -> Result<CommandOutcome, RepositoryError> {
    let outcome = repository
        .flush()
        .await
        .into_iter()
        .find(|outcome| outcome.stream_id == stream_id);

    match outcome {
        Some(outcome) => outcome
            .result
            .map(|version| CommandOutcome::Accepted { version }),
        // Nothing was pending for this stream: the decision was a no-op.
        None => {
            let version = repository.get(stream_id).await?.version();
            Ok(CommandOutcome::Accepted { version })
        }
    }
}
