use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Activity;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWire {
    pub id: String,
    pub head_id: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: &'static str,
    pub date: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn to_wire_activity(activity: Activity) -> ActivityWire {
    ActivityWire {
        id: activity.id,
        head_id: activity.head_id,
        description: activity.description,
        activity_type: activity.activity_type.as_str(),
        date: activity.date,
        created_at: activity.created_at,
        updated_at: activity.updated_at,
    }
}
