// ABOUTME: HTTP handlers for the item surface: CRUD, lifecycle, search and filter
// ABOUTME: Authorization tiers are expressed through the AuthUser extractor per route

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::AppState;
use crate::entities::item;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::types::{
    AssignRequest, AssignedParams, CreateItemRequest, FilterParams, ItemRequestBody,
    MessageResponse, NewItem, ReassignRequest, ReportIssueRequest, RequestAck, SearchParams,
    StatusUpdateRequest, UpdateItemRequest,
};

pub async fn create_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<item::Model>)> {
    caller.require_storekeeper()?;

    let (name, category) = match (req.name, req.category) {
        (Some(name), Some(category)) => (name, category),
        _ => {
            return Err(AppError::Validation(
                "Please provide name and category".to_string(),
            ));
        }
    };

    let item = state
        .storage
        .create_item(NewItem {
            name,
            category,
            description: req.description,
            availability: req.availability.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<item::Model>>> {
    Ok(Json(state.storage.list_items().await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(patch): Json<UpdateItemRequest>,
) -> Result<Json<item::Model>> {
    caller.require_storekeeper()?;
    Ok(Json(state.storage.update_item(item_id, &patch).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    caller.require_storekeeper()?;
    state.storage.delete_item(item_id).await?;
    Ok(Json(MessageResponse {
        msg: "Item removed".to_string(),
    }))
}

pub async fn assign_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<AssignRequest>,
) -> Result<Json<item::Model>> {
    state.policy.authorize(&caller.0)?;
    Ok(Json(
        state.storage.assign_item(req.item_id, req.user_id).await?,
    ))
}

pub async fn reassign_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(req): Json<ReassignRequest>,
) -> Result<Json<item::Model>> {
    state.policy.authorize(&caller.0)?;
    Ok(Json(
        state
            .storage
            .reassign_item(req.item_id, req.new_user_id)
            .await?,
    ))
}

pub async fn update_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<item::Model>> {
    Ok(Json(
        state
            .storage
            .update_item_status(item_id, &req.status, caller.0.id)
            .await?,
    ))
}

pub async fn report_issue(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<ReportIssueRequest>,
) -> Result<Json<item::Model>> {
    Ok(Json(
        state
            .storage
            .add_issue_report(item_id, &req.issue, caller.0.id)
            .await?,
    ))
}

// Acknowledgment only; nothing durable is recorded for a request.
pub async fn request_item(
    State(state): State<AppState>,
    _caller: AuthUser,
    Json(req): Json<ItemRequestBody>,
) -> Result<Json<RequestAck>> {
    state.storage.get_item(req.item_id).await?;
    Ok(Json(RequestAck {
        msg: "Request submitted for additional item".to_string(),
        item_id: req.item_id,
    }))
}

pub async fn assigned_items(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<AssignedParams>,
) -> Result<Json<Vec<item::Model>>> {
    let user_id = params.user_id.unwrap_or(caller.0.id);
    Ok(Json(state.storage.items_assigned_to(user_id).await?))
}

pub async fn search_items(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<item::Model>>> {
    Ok(Json(state.storage.search_items(&params.query).await?))
}

pub async fn filter_items(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<item::Model>>> {
    Ok(Json(
        state
            .storage
            .filter_items(params.availability, params.assigned_to)
            .await?,
    ))
}
