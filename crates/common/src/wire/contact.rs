use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Contact, ContactDetails, PolicyGrant, User};
use crate::wire::{
    to_wire_activity, to_wire_company_details, to_wire_project_details, ActivityWire,
    CompanyWire, ProjectWire,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWire {
    pub id: String,
    pub head_id: String,
    pub role_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyWire {
    pub user_id: String,
    pub record_id: String,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Contact as returned to RPC clients; relations appear only when requested
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactWire {
    pub id: String,
    pub head_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    pub mobile: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Option<UserWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<CompanyWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<ActivityWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<PolicyWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_relations: Option<Vec<ContactWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_relations: Option<Vec<ContactWire>>,
}

pub fn to_wire_user(user: User) -> UserWire {
    UserWire {
        id: user.id,
        head_id: user.head_id,
        role_id: user.role_id,
        email: user.email,
        name: user.name,
    }
}

pub fn to_wire_policy(policy: PolicyGrant) -> PolicyWire {
    PolicyWire {
        user_id: policy.user_id,
        record_id: policy.record_id,
        can_edit: policy.can_edit,
        can_delete: policy.can_delete,
    }
}

/// Convert a bare contact
pub fn to_wire_contact(contact: Contact) -> ContactWire {
    ContactWire {
        id: contact.id,
        head_id: contact.head_id,
        user_id: contact.user_id,
        name: contact.name,
        email: contact.email,
        info: contact.info,
        mobile: contact.mobile,
        created_at: contact.created_at,
        updated_at: contact.updated_at,
        user: None,
        companies: None,
        activities: None,
        projects: None,
        policies: None,
        incoming_relations: None,
        outgoing_relations: None,
    }
}

/// Convert a contact together with its loaded relations
pub fn to_wire_contact_details(details: ContactDetails) -> ContactWire {
    let mut wire = to_wire_contact(details.contact);
    wire.user = details.user.map(|user| user.map(to_wire_user));
    wire.companies = details
        .companies
        .map(|companies| companies.into_iter().map(to_wire_company_details).collect());
    wire.activities = details
        .activities
        .map(|activities| activities.into_iter().map(to_wire_activity).collect());
    wire.projects = details
        .projects
        .map(|projects| projects.into_iter().map(to_wire_project_details).collect());
    wire.policies = details
        .policies
        .map(|policies| policies.into_iter().map(to_wire_policy).collect());
    wire.incoming_relations = details
        .incoming_relations
        .map(|contacts| contacts.into_iter().map(to_wire_contact).collect());
    wire.outgoing_relations = details
        .outgoing_relations
        .map(|contacts| contacts.into_iter().map(to_wire_contact).collect());
    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            id: "c1".to_string(),
            head_id: "h1".to_string(),
            user_id: None,
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            info: None,
            mobile: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_unrequested_relations_are_omitted() {
        let json = serde_json::to_value(to_wire_contact(contact())).unwrap();
        assert_eq!(json["headId"], "h1");
        assert!(json.get("companies").is_none());
        assert!(json.get("outgoingRelations").is_none());
    }

    #[test]
    fn test_requested_missing_user_serializes_as_null() {
        let mut details = ContactDetails::new(contact());
        details.user = Some(None);
        details.outgoing_relations = Some(vec![]);
        let json = serde_json::to_value(to_wire_contact_details(details)).unwrap();
        assert!(json["user"].is_null());
        assert_eq!(json["outgoingRelations"], serde_json::json!([]));
    }
}
