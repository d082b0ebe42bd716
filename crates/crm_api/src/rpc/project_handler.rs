use axum::extract::State;
use axum::Json;
use common::domain::ProjectIncludes;
use common::rpc::RpcError;
use common::wire::{
    to_wire_contact, to_wire_project, to_wire_project_details, ContactWire, ProjectWire,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{
    CreateProjectRequest, GetProjectRequest, ListProjectsRequest, ProjectAssociationRequest,
    ProjectIdRequest, UpdateProjectRequest,
};
use crate::rpc::{AuthSession, CrmApiState, IdInput, RpcInput};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ProjectCountInput {
    pub contacts: bool,
    pub companies: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ProjectIncludeInput {
    pub contacts: bool,
    pub activities: bool,
    pub companies: bool,
    pub count: Option<ProjectCountInput>,
}

impl From<ProjectIncludeInput> for ProjectIncludes {
    fn from(input: ProjectIncludeInput) -> Self {
        let count = input.count.unwrap_or_default();
        ProjectIncludes {
            contacts: input.contacts,
            activities: input.activities,
            companies: input.companies,
            count_contacts: count.contacts,
            count_companies: count.companies,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAllProjectsInput {
    #[serde(default)]
    pub include: Option<ProjectIncludeInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetProjectInput {
    pub id: String,
    #[serde(default)]
    pub include: Option<ProjectIncludeInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddProjectInput {
    pub name: String,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectInput {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContactsInput {
    pub project_id: String,
    pub contact_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompaniesInput {
    pub project_id: String,
    pub company_ids: Vec<String>,
}

fn project_id(input: IdInput) -> ProjectIdRequest {
    ProjectIdRequest {
        project_id: input.id,
    }
}

#[instrument(name = "project.getAll", skip_all, fields(user_id = %session.user_id))]
pub async fn get_all(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<Option<GetAllProjectsInput>>,
) -> Result<Json<Vec<ProjectWire>>, RpcError> {
    let include = input
        .and_then(|input| input.include)
        .unwrap_or_default()
        .into();

    let projects = state
        .project_service
        .list_projects(&session, ListProjectsRequest { include })
        .await?;

    Ok(Json(projects.into_iter().map(to_wire_project_details).collect()))
}

#[instrument(name = "project.getOne", skip_all, fields(user_id = %session.user_id, project_id = %input.id))]
pub async fn get_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<GetProjectInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let details = state
        .project_service
        .get_project(
            &session,
            GetProjectRequest {
                project_id: input.id,
                include: input.include.unwrap_or_default().into(),
            },
        )
        .await?;

    Ok(Json(to_wire_project_details(details)))
}

#[instrument(name = "project.getProjectContacts", skip_all, fields(user_id = %session.user_id, project_id = %input.id))]
pub async fn get_project_contacts(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<Vec<ContactWire>>, RpcError> {
    let contacts = state
        .project_service
        .list_project_contacts(&session, project_id(input))
        .await?;
    Ok(Json(contacts.into_iter().map(to_wire_contact).collect()))
}

#[instrument(name = "project.addOne", skip_all, fields(user_id = %session.user_id))]
pub async fn add_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<AddProjectInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .create_project(
            &session,
            CreateProjectRequest {
                name: input.name,
                info: input.info,
                status: input.status,
            },
        )
        .await?;

    debug!(project_id = %project.id, "project created");
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.updateOne", skip_all, fields(user_id = %session.user_id, project_id = %input.id))]
pub async fn update_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<UpdateProjectInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .update_project(
            &session,
            UpdateProjectRequest {
                project_id: input.id,
                name: input.name,
                status: input.status,
            },
        )
        .await?;
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.deleteOne", skip_all, fields(user_id = %session.user_id, project_id = %input.id))]
pub async fn delete_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .delete_project(&session, project_id(input))
        .await?;

    debug!(project_id = %project.id, "project deleted");
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.addContact", skip_all, fields(user_id = %session.user_id, project_id = %input.project_id))]
pub async fn add_contact(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ProjectContactsInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .add_contacts(
            &session,
            ProjectAssociationRequest {
                project_id: input.project_id,
                related_ids: input.contact_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.deleteContact", skip_all, fields(user_id = %session.user_id, project_id = %input.project_id))]
pub async fn delete_contact(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ProjectContactsInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .remove_contacts(
            &session,
            ProjectAssociationRequest {
                project_id: input.project_id,
                related_ids: input.contact_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.addCompany", skip_all, fields(user_id = %session.user_id, project_id = %input.project_id))]
pub async fn add_company(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ProjectCompaniesInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .add_companies(
            &session,
            ProjectAssociationRequest {
                project_id: input.project_id,
                related_ids: input.company_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_project(project)))
}

#[instrument(name = "project.deleteCompany", skip_all, fields(user_id = %session.user_id, project_id = %input.project_id))]
pub async fn delete_company(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ProjectCompaniesInput>,
) -> Result<Json<ProjectWire>, RpcError> {
    let project = state
        .project_service
        .remove_companies(
            &session,
            ProjectAssociationRequest {
                project_id: input.project_id,
                related_ids: input.company_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_project(project)))
}
