// ABOUTME: Comprehensive tests for the storage layer and item lifecycle
// ABOUTME: Covers assignment transitions, history growth, search, filter, and patching

#[cfg(test)]
mod tests {
    use super::super::entities::item::AssignmentKind;
    use super::super::entities::user::Role;
    use super::super::error::AppError;
    use super::super::storage::Storage;
    use super::super::types::{NewItem, UpdateItemRequest};
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let storage = Storage::new(&db_url).await.unwrap();
        (storage, temp_dir)
    }

    async fn create_test_user(storage: &Storage, username: &str) -> crate::entities::user::Model {
        storage
            .create_user(
                username,
                &format!("{}@example.com", username),
                "$argon2id$test-hash",
                Role::Employee,
            )
            .await
            .unwrap()
    }

    fn new_item(name: &str, category: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            category: category.to_string(),
            description: None,
            availability: true,
        }
    }

    #[tokio::test]
    async fn test_user_operations() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "alice").await;

        let by_id = storage.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.role, Role::Employee);

        let by_email = storage
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(storage.user_taken("alice", "other@example.com").await.unwrap());
        assert!(storage.user_taken("someone", "alice@example.com").await.unwrap());
        assert!(!storage.user_taken("someone", "other@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_user_missing() {
        let (storage, _temp_dir) = create_test_storage().await;

        assert!(storage.find_user(Uuid::new_v4()).await.unwrap().is_none());
        assert!(storage
            .find_user_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_item_defaults() {
        let (storage, _temp_dir) = create_test_storage().await;

        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        assert!(item.availability);
        assert_eq!(item.assigned_to, None);
        assert_eq!(item.status, "available");
        assert!(item.history.0.is_empty());
        assert!(item.issue_reports.0.is_empty());
    }

    #[tokio::test]
    async fn test_assign_sets_state_and_history() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "holder").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        let assigned = storage.assign_item(item.id, user.id).await.unwrap();

        assert!(!assigned.availability);
        assert_eq!(assigned.assigned_to, Some(user.id));
        assert_eq!(assigned.history.0.len(), 1);
        assert_eq!(assigned.history.0[0].user_id, user.id);
        assert_eq!(assigned.history.0[0].status, AssignmentKind::Assigned);
    }

    #[tokio::test]
    async fn test_assign_unavailable_item_conflicts() {
        let (storage, _temp_dir) = create_test_storage().await;

        let first = create_test_user(&storage, "first").await;
        let second = create_test_user(&storage, "second").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        storage.assign_item(item.id, first.id).await.unwrap();
        let err = storage.assign_item(item.id, second.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // No state change from the rejected call
        let unchanged = storage.get_item(item.id).await.unwrap();
        assert_eq!(unchanged.assigned_to, Some(first.id));
        assert_eq!(unchanged.history.0.len(), 1);
    }

    #[tokio::test]
    async fn test_assign_missing_item_or_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "holder").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        let err = storage.assign_item(Uuid::new_v4(), user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = storage.assign_item(item.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Failed user lookup must not mutate the item
        let unchanged = storage.get_item(item.id).await.unwrap();
        assert!(unchanged.availability);
        assert!(unchanged.history.0.is_empty());
    }

    #[tokio::test]
    async fn test_reassign_without_assignee_conflicts() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "next").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        let err = storage.reassign_item(item.id, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reassign_appends_history() {
        let (storage, _temp_dir) = create_test_storage().await;

        let first = create_test_user(&storage, "first").await;
        let second = create_test_user(&storage, "second").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        storage.assign_item(item.id, first.id).await.unwrap();
        let reassigned = storage.reassign_item(item.id, second.id).await.unwrap();

        assert_eq!(reassigned.assigned_to, Some(second.id));
        // Availability stays false: reassign never touches it
        assert!(!reassigned.availability);
        assert_eq!(reassigned.history.0.len(), 2);

        // Prior entry untouched
        assert_eq!(reassigned.history.0[0].user_id, first.id);
        assert_eq!(reassigned.history.0[0].status, AssignmentKind::Assigned);
        assert_eq!(reassigned.history.0[1].user_id, second.id);
        assert_eq!(reassigned.history.0[1].status, AssignmentKind::Reassigned);
    }

    #[tokio::test]
    async fn test_drill_scenario() {
        let (storage, _temp_dir) = create_test_storage().await;

        let u1 = create_test_user(&storage, "userone").await;
        let u2 = create_test_user(&storage, "usertwo").await;

        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        let after_assign = storage.assign_item(item.id, u1.id).await.unwrap();
        assert!(!after_assign.availability);
        assert_eq!(after_assign.assigned_to, Some(u1.id));
        assert_eq!(after_assign.history.0.len(), 1);
        assert_eq!(after_assign.history.0[0].user_id, u1.id);
        assert_eq!(after_assign.history.0[0].status, AssignmentKind::Assigned);

        let after_reassign = storage.reassign_item(item.id, u2.id).await.unwrap();
        assert_eq!(after_reassign.assigned_to, Some(u2.id));
        assert_eq!(after_reassign.history.0.len(), 2);
        assert_eq!(after_reassign.history.0[1].user_id, u2.id);
        assert_eq!(after_reassign.history.0[1].status, AssignmentKind::Reassigned);
    }

    #[tokio::test]
    async fn test_history_survives_other_operations() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "holder").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        storage.assign_item(item.id, user.id).await.unwrap();

        // Status changes and issue reports never touch assignment history
        storage
            .update_item_status(item.id, "in repair", user.id)
            .await
            .unwrap();
        storage
            .add_issue_report(item.id, "chuck is loose", user.id)
            .await
            .unwrap();
        let patch = UpdateItemRequest {
            name: Some("Hammer Drill".to_string()),
            ..Default::default()
        };
        storage.update_item(item.id, &patch).await.unwrap();

        let current = storage.get_item(item.id).await.unwrap();
        assert_eq!(current.history.0.len(), 1);
        assert_eq!(current.history.0[0].user_id, user.id);
        assert_eq!(current.history.0[0].status, AssignmentKind::Assigned);
    }

    #[tokio::test]
    async fn test_update_status_requires_holder() {
        let (storage, _temp_dir) = create_test_storage().await;

        let holder = create_test_user(&storage, "holder").await;
        let other = create_test_user(&storage, "other").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        storage.assign_item(item.id, holder.id).await.unwrap();

        let err = storage
            .update_item_status(item.id, "broken", other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = storage
            .update_item_status(item.id, "broken", holder.id)
            .await
            .unwrap();
        assert_eq!(updated.status, "broken");
    }

    #[tokio::test]
    async fn test_report_issue_requires_holder() {
        let (storage, _temp_dir) = create_test_storage().await;

        let holder = create_test_user(&storage, "holder").await;
        let other = create_test_user(&storage, "other").await;
        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        storage.assign_item(item.id, holder.id).await.unwrap();

        let err = storage
            .add_issue_report(item.id, "bit snapped", other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = storage
            .add_issue_report(item.id, "bit snapped", holder.id)
            .await
            .unwrap();
        assert_eq!(updated.issue_reports.0.len(), 1);
        assert_eq!(updated.issue_reports.0[0].issue, "bit snapped");
        assert_eq!(updated.issue_reports.0[0].reported_by, Some(holder.id));
        assert_eq!(updated.issue_reports.0[0].status, "pending");
    }

    #[tokio::test]
    async fn test_update_item_patch_semantics() {
        let (storage, _temp_dir) = create_test_storage().await;

        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        // Absent fields stay untouched
        let patch = UpdateItemRequest {
            category: Some("Power Tools".to_string()),
            ..Default::default()
        };
        let updated = storage.update_item(item.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Drill");
        assert_eq!(updated.category, "Power Tools");
        assert!(updated.availability);

        // A supplied empty string is an update, and false is distinguishable
        // from not-supplied
        let patch = UpdateItemRequest {
            name: Some(String::new()),
            availability: Some(false),
            ..Default::default()
        };
        let updated = storage.update_item(item.id, &patch).await.unwrap();
        assert_eq!(updated.name, "");
        assert!(!updated.availability);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let (storage, _temp_dir) = create_test_storage().await;

        let item = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        storage.delete_item(item.id).await.unwrap();

        let err = storage.get_item(item.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = storage.delete_item(item.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (storage, _temp_dir) = create_test_storage().await;

        storage.create_item(new_item("Laptop", "Electronics")).await.unwrap();
        storage.create_item(new_item("Drill", "Tools")).await.unwrap();

        let found = storage.search_items("LAPTOP").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Laptop");

        // Substring of the category matches too
        let found = storage.search_items("tool").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Drill");

        let found = storage.search_items("missing").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_filter_items() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "holder").await;
        let assigned = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        storage.create_item(new_item("Laptop", "Electronics")).await.unwrap();
        storage.assign_item(assigned.id, user.id).await.unwrap();

        // Absent filters are not applied
        let all = storage.filter_items(None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let available = storage.filter_items(Some(true), None).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Laptop");

        let held = storage.filter_items(None, Some(user.id)).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].name, "Drill");

        let both = storage.filter_items(Some(false), Some(user.id)).await.unwrap();
        assert_eq!(both.len(), 1);

        let none = storage.filter_items(Some(true), Some(user.id)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_assigned_items_listing() {
        let (storage, _temp_dir) = create_test_storage().await;

        let user = create_test_user(&storage, "holder").await;
        let first = storage.create_item(new_item("Drill", "Tools")).await.unwrap();
        let second = storage.create_item(new_item("Saw", "Tools")).await.unwrap();
        storage.create_item(new_item("Laptop", "Electronics")).await.unwrap();

        storage.assign_item(first.id, user.id).await.unwrap();
        storage.assign_item(second.id, user.id).await.unwrap();

        let held = storage.items_assigned_to(user.id).await.unwrap();
        assert_eq!(held.len(), 2);
        assert!(held.iter().all(|i| i.assigned_to == Some(user.id)));
    }
}
