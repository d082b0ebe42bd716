use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Company, CompanyDetails};
use crate::wire::{
    to_wire_activity, to_wire_contact, to_wire_project_details, ActivityWire, ContactWire,
    ProjectWire,
};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCountWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWire {
    pub id: String,
    pub head_id: String,
    pub name: String,
    pub info: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<ContactWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<ActivityWire>>,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<CompanyCountWire>,
}

pub fn to_wire_company(company: Company) -> CompanyWire {
    CompanyWire {
        id: company.id,
        head_id: company.head_id,
        name: company.name,
        info: company.info,
        created_at: company.created_at,
        updated_at: company.updated_at,
        contacts: None,
        projects: None,
        activities: None,
        count: None,
    }
}

pub fn to_wire_company_details(details: CompanyDetails) -> CompanyWire {
    let mut wire = to_wire_company(details.company);
    wire.contacts = details
        .contacts
        .map(|contacts| contacts.into_iter().map(to_wire_contact).collect());
    wire.projects = details
        .projects
        .map(|projects| projects.into_iter().map(to_wire_project_details).collect());
    wire.activities = details
        .activities
        .map(|activities| activities.into_iter().map(to_wire_activity).collect());
    if details.contact_count.is_some() || details.project_count.is_some() {
        wire.count = Some(CompanyCountWire {
            contacts: details.contact_count,
            projects: details.project_count,
        });
    }
    wire
}
