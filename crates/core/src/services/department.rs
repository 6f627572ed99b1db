//! Department service.

use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{entities::department, repositories::DepartmentRepository};
use sea_orm::Set;

/// Department service for business logic.
#[derive(Clone)]
pub struct DepartmentService {
    department_repo: DepartmentRepository,
    id_gen: IdGenerator,
}

impl DepartmentService {
    /// Create a new department service.
    #[must_use]
    pub const fn new(department_repo: DepartmentRepository) -> Self {
        Self {
            department_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a department.
    pub async fn create(&self, name: &str) -> AppResult<department::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let model = department::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let department = self.department_repo.create(model).await?;

        tracing::info!(department_id = %department.id, name = %department.name, "Department created");

        Ok(department)
    }

    /// List all departments.
    pub async fn list(&self) -> AppResult<Vec<department::Model>> {
        self.department_repo.list().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = DepartmentService::new(DepartmentRepository::new(db));

        let result = service.create("   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
