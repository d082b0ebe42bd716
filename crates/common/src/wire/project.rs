use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Project, ProjectDetails};
use crate::wire::{
    to_wire_activity, to_wire_company, to_wire_contact, ActivityWire, CompanyWire, ContactWire,
};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCountWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companies: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWire {
    pub id: String,
    pub head_id: String,
    pub name: String,
    pub info: Option<String>,
    pub status: &'static str,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<ContactWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<CompanyWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<ActivityWire>>,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<ProjectCountWire>,
}

pub fn to_wire_project(project: Project) -> ProjectWire {
    ProjectWire {
        id: project.id,
        head_id: project.head_id,
        name: project.name,
        info: project.info,
        status: project.status.as_str(),
        created_at: project.created_at,
        updated_at: project.updated_at,
        contacts: None,
        companies: None,
        activities: None,
        count: None,
    }
}

pub fn to_wire_project_details(details: ProjectDetails) -> ProjectWire {
    let mut wire = to_wire_project(details.project);
    wire.contacts = details
        .contacts
        .map(|contacts| contacts.into_iter().map(to_wire_contact).collect());
    wire.companies = details
        .companies
        .map(|companies| companies.into_iter().map(to_wire_company).collect());
    wire.activities = details
        .activities
        .map(|activities| activities.into_iter().map(to_wire_activity).collect());
    if details.contact_count.is_some() || details.company_count.is_some() {
        wire.count = Some(ProjectCountWire {
            contacts: details.contact_count,
            companies: details.company_count,
        });
    }
    wire
}
