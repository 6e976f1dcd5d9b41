// ABOUTME: SQLite persistence layer for users and items via SeaORM
// ABOUTME: Item lifecycle transitions live here; assign/reassign write conditionally

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, Database, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::entities::item::{AssignmentKind, HistoryEntry, HistoryLog, IssueLog, IssueReport};
use crate::entities::user::{Role, UserStatus};
use crate::entities::{item, user};
use crate::error::{AppError, Result};
use crate::migration::Migrator;
use crate::types::{NewItem, UpdateItemRequest};

pub struct Storage {
    pub db: DatabaseConnection,
}

impl Storage {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    // User operations

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<user::Model> {
        let now = Utc::now().timestamp();
        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role),
            status: Set(UserStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(new_user.insert(&self.db).await?)
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn user_taken(&self, username: &str, email: &str) -> Result<bool> {
        let existing = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }

    // Item CRUD

    pub async fn create_item(&self, new: NewItem) -> Result<item::Model> {
        let now = Utc::now().timestamp();
        let new_item = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            category: Set(new.category),
            description: Set(new.description),
            availability: Set(new.availability),
            assigned_to: Set(None),
            status: Set("available".to_string()),
            history: Set(HistoryLog::default()),
            issue_reports: Set(IssueLog::default()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(new_item.insert(&self.db).await?)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<item::Model> {
        item::Entity::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    pub async fn list_items(&self) -> Result<Vec<item::Model>> {
        Ok(item::Entity::find().all(&self.db).await?)
    }

    pub async fn update_item(&self, item_id: Uuid, patch: &UpdateItemRequest) -> Result<item::Model> {
        let item = self.get_item(item_id).await?;
        let mut updated = item.into_active_model();

        // Absent fields stay untouched; supplied fields are applied as-is,
        // empty strings included.
        if let Some(name) = &patch.name {
            updated.name = Set(name.clone());
        }
        if let Some(category) = &patch.category {
            updated.category = Set(category.clone());
        }
        if let Some(description) = &patch.description {
            updated.description = Set(Some(description.clone()));
        }
        if let Some(availability) = patch.availability {
            updated.availability = Set(availability);
        }
        updated.updated_at = Set(Utc::now().timestamp());

        Ok(updated.update(&self.db).await?)
    }

    pub async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let result = item::Entity::delete_by_id(item_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        Ok(())
    }

    // Assignment lifecycle

    pub async fn assign_item(&self, item_id: Uuid, user_id: Uuid) -> Result<item::Model> {
        let item = self.get_item(item_id).await?;
        if !item.availability {
            return Err(AppError::Conflict("Item is already assigned".to_string()));
        }

        let user = self
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut history = item.history.clone();
        history.0.push(HistoryEntry {
            user_id: user.id,
            assigned_at: Utc::now(),
            status: AssignmentKind::Assigned,
        });

        let update = item::ActiveModel {
            assigned_to: Set(Some(user.id)),
            availability: Set(false),
            history: Set(history),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        // Conditional write: if a concurrent assign got here first the
        // availability check fails and zero rows change.
        let result = item::Entity::update_many()
            .set(update)
            .filter(item::Column::Id.eq(item_id))
            .filter(item::Column::Availability.eq(true))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict("Item is already assigned".to_string()));
        }

        self.get_item(item_id).await
    }

    pub async fn reassign_item(&self, item_id: Uuid, new_user_id: Uuid) -> Result<item::Model> {
        let item = self.get_item(item_id).await?;

        // Only the presence of an assignee matters here, not availability.
        let current_holder = item.assigned_to.ok_or_else(|| {
            AppError::Conflict("Item is not assigned to anyone".to_string())
        })?;

        let new_user = self
            .find_user(new_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("New user not found".to_string()))?;

        let mut history = item.history.clone();
        history.0.push(HistoryEntry {
            user_id: new_user.id,
            assigned_at: Utc::now(),
            status: AssignmentKind::Reassigned,
        });

        let update = item::ActiveModel {
            assigned_to: Set(Some(new_user.id)),
            history: Set(history),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        let result = item::Entity::update_many()
            .set(update)
            .filter(item::Column::Id.eq(item_id))
            .filter(item::Column::AssignedTo.eq(current_holder))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Item changed hands, retry the reassignment".to_string(),
            ));
        }

        self.get_item(item_id).await
    }

    pub async fn update_item_status(
        &self,
        item_id: Uuid,
        status: &str,
        caller: Uuid,
    ) -> Result<item::Model> {
        let item = self.get_item(item_id).await?;
        if item.assigned_to != Some(caller) {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        let mut updated = item.into_active_model();
        // Free text, no history entry: status changes and assignment
        // history are separate trails.
        updated.status = Set(status.to_string());
        updated.updated_at = Set(Utc::now().timestamp());

        Ok(updated.update(&self.db).await?)
    }

    pub async fn add_issue_report(
        &self,
        item_id: Uuid,
        issue: &str,
        caller: Uuid,
    ) -> Result<item::Model> {
        let item = self.get_item(item_id).await?;
        if item.assigned_to != Some(caller) {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        let mut reports = item.issue_reports.clone();
        reports.0.push(IssueReport {
            issue: issue.to_string(),
            reported_by: Some(caller),
            status: "pending".to_string(),
        });

        let mut updated = item.into_active_model();
        updated.issue_reports = Set(reports);
        updated.updated_at = Set(Utc::now().timestamp());

        Ok(updated.update(&self.db).await?)
    }

    // Query layer

    pub async fn items_assigned_to(&self, user_id: Uuid) -> Result<Vec<item::Model>> {
        Ok(item::Entity::find()
            .filter(item::Column::AssignedTo.eq(user_id))
            .all(&self.db)
            .await?)
    }

    pub async fn search_items(&self, query: &str) -> Result<Vec<item::Model>> {
        Ok(item::Entity::find()
            .filter(
                Condition::any()
                    .add(item::Column::Name.contains(query))
                    .add(item::Column::Category.contains(query)),
            )
            .all(&self.db)
            .await?)
    }

    pub async fn filter_items(
        &self,
        availability: Option<bool>,
        assigned_to: Option<Uuid>,
    ) -> Result<Vec<item::Model>> {
        let mut condition = Condition::all();
        if let Some(availability) = availability {
            condition = condition.add(item::Column::Availability.eq(availability));
        }
        if let Some(assigned_to) = assigned_to {
            condition = condition.add(item::Column::AssignedTo.eq(assigned_to));
        }

        Ok(item::Entity::find()
            .filter(condition)
            .all(&self.db)
            .await?)
    }
}
