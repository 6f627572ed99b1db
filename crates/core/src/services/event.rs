//! Event service.

use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{entities::event, repositories::EventRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(length(max = 256))]
    pub venue: Option<String>,

    pub starts_at: DateTime<Utc>,

    pub ends_at: Option<DateTime<Utc>>,
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(event_repo: EventRepository) -> Self {
        Self {
            event_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an event with a fresh check-in code.
    ///
    /// The code is an opaque token; clients render it as a QR image for the
    /// venue screen and attendees present it back at time-in.
    pub async fn create(&self, created_by: &str, input: CreateEventInput) -> AppResult<event::Model> {
        input.validate()?;

        if let Some(ends_at) = input.ends_at {
            if ends_at <= input.starts_at {
                return Err(AppError::Validation(
                    "endsAt must be after startsAt".to_string(),
                ));
            }
        }

        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            description: Set(input.description),
            venue: Set(input.venue),
            starts_at: Set(input.starts_at.into()),
            ends_at: Set(input.ends_at.map(Into::into)),
            check_in_code: Set(self.id_gen.generate_token()),
            created_by: Set(created_by.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let event = self.event_repo.create(model).await?;

        tracing::info!(event_id = %event.id, name = %event.name, "Event created");

        Ok(event)
    }

    /// Get an event by ID.
    pub async fn get(&self, id: &str) -> AppResult<event::Model> {
        self.event_repo.get_by_id(id).await
    }

    /// List events (paginated).
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<event::Model>> {
        self.event_repo.list(limit, offset).await
    }

    /// Replace an event's check-in code, invalidating the old one.
    pub async fn regenerate_check_in_code(&self, id: &str) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(id).await?;

        let mut active: event::ActiveModel = event.into();
        active.check_in_code = Set(self.id_gen.generate_token());

        let event = self.event_repo.update(active).await?;

        tracing::info!(event_id = %event.id, "Check-in code regenerated");

        Ok(event)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_rejects_inverted_times() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = EventService::new(EventRepository::new(db));

        let starts_at = Utc::now();
        let input = CreateEventInput {
            name: "Orientation".to_string(),
            description: None,
            venue: None,
            starts_at,
            ends_at: Some(starts_at - chrono::Duration::hours(1)),
        };

        let result = service.create("admin1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = EventService::new(EventRepository::new(db));

        let input = CreateEventInput {
            name: String::new(),
            description: None,
            venue: None,
            starts_at: Utc::now(),
            ends_at: None,
        };

        let result = service.create("admin1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
