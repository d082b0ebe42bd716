use axum::extract::State;
use axum::Json;
use common::domain::ContactIncludes;
use common::rpc::RpcError;
use common::wire::{to_wire_contact, to_wire_contact_details, ContactWire};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{
    ContactAssociationRequest, ContactLinkRequest, CreateContactRequest, DeleteContactRequest,
    GetContactRequest, ListContactsRequest, UpdateContactRequest,
};
use crate::rpc::{AuthSession, CrmApiState, IdInput, RpcInput};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ContactIncludeInput {
    pub user: bool,
    pub companies: bool,
    pub activities: bool,
    pub projects: bool,
    pub policies: bool,
    pub relations: bool,
}

impl From<ContactIncludeInput> for ContactIncludes {
    fn from(input: ContactIncludeInput) -> Self {
        ContactIncludes {
            user: input.user,
            companies: input.companies,
            activities: input.activities,
            projects: input.projects,
            policies: input.policies,
            relations: input.relations,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAllContactsInput {
    #[serde(default)]
    pub include: Option<ContactIncludeInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetContactInput {
    pub id: String,
    #[serde(default)]
    pub include: Option<ContactIncludeInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDataInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_ids: Option<Vec<String>>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContactInput {
    pub contact_data: ContactDataInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContactInput {
    pub id: String,
    pub data: ContactDataInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLinkInput {
    pub contact_one: String,
    pub contact_two: String,
    pub mode: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCompaniesInput {
    pub contact_id: String,
    pub company_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProjectsInput {
    pub contact_id: String,
    pub project_ids: Vec<String>,
}

impl From<ContactLinkInput> for ContactLinkRequest {
    fn from(input: ContactLinkInput) -> Self {
        ContactLinkRequest {
            contact_one: input.contact_one,
            contact_two: input.contact_two,
            mode: input.mode,
        }
    }
}

#[instrument(name = "contact.getAll", skip_all, fields(user_id = %session.user_id))]
pub async fn get_all(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<Option<GetAllContactsInput>>,
) -> Result<Json<Vec<ContactWire>>, RpcError> {
    let include = input
        .and_then(|input| input.include)
        .unwrap_or_default()
        .into();

    let contacts = state
        .contact_service
        .list_contacts(&session, ListContactsRequest { include })
        .await?;

    Ok(Json(contacts.into_iter().map(to_wire_contact_details).collect()))
}

#[instrument(name = "contact.get", skip_all, fields(user_id = %session.user_id, contact_id = %input.id))]
pub async fn get(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<GetContactInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let details = state
        .contact_service
        .get_contact(
            &session,
            GetContactRequest {
                contact_id: input.id,
                include: input.include.unwrap_or_default().into(),
            },
        )
        .await?;

    Ok(Json(to_wire_contact_details(details)))
}

#[instrument(name = "contact.add", skip_all, fields(user_id = %session.user_id))]
pub async fn add(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<AddContactInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let data = input.contact_data;
    let contact = state
        .contact_service
        .create_contact(
            &session,
            CreateContactRequest {
                name: data.name,
                email: data.email,
                info: data.info,
                mobile: data.mobile,
                company_ids: data.company_ids.unwrap_or_default(),
            },
        )
        .await?;

    debug!(contact_id = %contact.id, "contact created");
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.update", skip_all, fields(user_id = %session.user_id, contact_id = %input.id))]
pub async fn update(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<UpdateContactInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let data = input.data;
    let contact = state
        .contact_service
        .update_contact(
            &session,
            UpdateContactRequest {
                contact_id: input.id,
                name: data.name,
                email: data.email,
                info: data.info,
                mobile: data.mobile,
                company_ids: data.company_ids.unwrap_or_default(),
            },
        )
        .await?;

    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.delete", skip_all, fields(user_id = %session.user_id, contact_id = %input.id))]
pub async fn delete(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .delete_contact(&session, DeleteContactRequest { contact_id: input.id })
        .await?;

    debug!(contact_id = %contact.id, "contact deleted");
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.addLink", skip_all, fields(user_id = %session.user_id, mode = input.mode))]
pub async fn add_link(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactLinkInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .add_link(&session, input.into())
        .await?;
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.deleteLink", skip_all, fields(user_id = %session.user_id, mode = input.mode))]
pub async fn delete_link(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactLinkInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .delete_link(&session, input.into())
        .await?;
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.addCompany", skip_all, fields(user_id = %session.user_id, contact_id = %input.contact_id))]
pub async fn add_company(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactCompaniesInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .add_companies(
            &session,
            ContactAssociationRequest {
                contact_id: input.contact_id,
                related_ids: input.company_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.deleteCompany", skip_all, fields(user_id = %session.user_id, contact_id = %input.contact_id))]
pub async fn delete_company(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactCompaniesInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .remove_companies(
            &session,
            ContactAssociationRequest {
                contact_id: input.contact_id,
                related_ids: input.company_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.addProject", skip_all, fields(user_id = %session.user_id, contact_id = %input.contact_id))]
pub async fn add_project(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactProjectsInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .add_projects(
            &session,
            ContactAssociationRequest {
                contact_id: input.contact_id,
                related_ids: input.project_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_contact(contact)))
}

#[instrument(name = "contact.deleteProject", skip_all, fields(user_id = %session.user_id, contact_id = %input.contact_id))]
pub async fn delete_project(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<ContactProjectsInput>,
) -> Result<Json<ContactWire>, RpcError> {
    let contact = state
        .contact_service
        .remove_projects(
            &session,
            ContactAssociationRequest {
                contact_id: input.contact_id,
                related_ids: input.project_ids,
            },
        )
        .await?;
    Ok(Json(to_wire_contact(contact)))
}
