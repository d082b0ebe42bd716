use axum::Json;
use common::wire::{to_wire_session, SessionWire};
use tracing::instrument;

use crate::rpc::AuthSession;

/// Current user with role capabilities and head
#[instrument(name = "session.get", skip_all, fields(user_id = %session.user_id))]
pub async fn get(AuthSession(session): AuthSession) -> Json<SessionWire> {
    Json(to_wire_session(session))
}
