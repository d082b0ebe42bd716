use serde::Serialize;

use crate::domain::{RoleCapabilities, Session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadWire {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWire {
    pub id: String,
    pub name: String,
    pub can_create_contact: bool,
    pub can_read_all_contact: bool,
    pub can_edit_all_contact: bool,
    pub can_delete_all_contact: bool,
    pub can_create_company: bool,
    pub can_read_all_company: bool,
    pub can_edit_all_company: bool,
    pub can_delete_all_company: bool,
    pub can_create_project: bool,
    pub can_read_all_project: bool,
    pub can_edit_all_project: bool,
    pub can_delete_all_project: bool,
    pub can_create_activity: bool,
    pub can_read_all_activity: bool,
    pub can_edit_all_activity: bool,
    pub can_delete_all_activity: bool,
    pub can_delete_connected_activity: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWire {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub head: HeadWire,
    pub role: RoleWire,
}

pub fn to_wire_session(session: Session) -> SessionWire {
    let RoleCapabilities {
        can_create_contact,
        can_read_all_contact,
        can_edit_all_contact,
        can_delete_all_contact,
        can_create_company,
        can_read_all_company,
        can_edit_all_company,
        can_delete_all_company,
        can_create_project,
        can_read_all_project,
        can_edit_all_project,
        can_delete_all_project,
        can_create_activity,
        can_read_all_activity,
        can_edit_all_activity,
        can_delete_all_activity,
        can_delete_connected_activity,
    } = session.role.capabilities;

    SessionWire {
        user_id: session.user_id,
        email: session.email,
        name: session.name,
        head: HeadWire {
            id: session.head.id,
            name: session.head.name,
        },
        role: RoleWire {
            id: session.role.id,
            name: session.role.name,
            can_create_contact,
            can_read_all_contact,
            can_edit_all_contact,
            can_delete_all_contact,
            can_create_company,
            can_read_all_company,
            can_edit_all_company,
            can_delete_all_company,
            can_create_project,
            can_read_all_project,
            can_edit_all_project,
            can_delete_all_project,
            can_create_activity,
            can_read_all_activity,
            can_edit_all_activity,
            can_delete_all_activity,
            can_delete_connected_activity,
        },
    }
}
