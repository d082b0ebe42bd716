use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use common::rpc::RpcError;
use common::wire::{to_wire_activity, ActivityWire};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{CreateActivityRequest, DeleteActivityRequest};
use crate::rpc::{AuthSession, CrmApiState, IdInput, RpcInput};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddActivityInput {
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub contact_ids: Vec<String>,
    pub company_ids: Vec<String>,
    pub project_ids: Vec<String>,
}

#[instrument(name = "activity.getAll", skip_all, fields(user_id = %session.user_id))]
pub async fn get_all(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<ActivityWire>>, RpcError> {
    let activities = state.activity_service.list_activities(&session).await?;
    Ok(Json(activities.into_iter().map(to_wire_activity).collect()))
}

#[instrument(name = "activity.addOne", skip_all, fields(user_id = %session.user_id))]
pub async fn add_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<AddActivityInput>,
) -> Result<Json<ActivityWire>, RpcError> {
    let activity = state
        .activity_service
        .create_activity(
            &session,
            CreateActivityRequest {
                description: input.description,
                activity_type: input.activity_type,
                date: input.date,
                contact_ids: input.contact_ids,
                company_ids: input.company_ids,
                project_ids: input.project_ids,
            },
        )
        .await?;

    debug!(activity_id = %activity.id, "activity created");
    Ok(Json(to_wire_activity(activity)))
}

#[instrument(name = "activity.deleteOne", skip_all, fields(user_id = %session.user_id, activity_id = %input.id))]
pub async fn delete_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<ActivityWire>, RpcError> {
    let activity = state
        .activity_service
        .delete_activity(
            &session,
            DeleteActivityRequest {
                activity_id: input.id,
            },
        )
        .await?;
    Ok(Json(to_wire_activity(activity)))
}
