use axum::extract::State;
use axum::Json;
use common::rpc::RpcError;
use common::wire::{
    to_wire_company, to_wire_company_details, to_wire_contact, CompanyWire, ContactWire,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{
    CompanyAssociationRequest, CompanyIdRequest, CreateCompanyRequest, UpdateCompanyRequest,
};
use crate::rpc::{AuthSession, CrmApiState, IdInput, RpcInput};

#[derive(Debug, Clone, Deserialize)]
pub struct AddCompanyInput {
    pub name: String,
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCompanyInput {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContactsInput {
    pub company_id: String,
    pub contact_ids: Vec<String>,
}

impl From<CompanyContactsInput> for CompanyAssociationRequest {
    fn from(input: CompanyContactsInput) -> Self {
        CompanyAssociationRequest {
            company_id: input.company_id,
            related_ids: input.contact_ids,
        }
    }
}

fn company_id(input: IdInput) -> CompanyIdRequest {
    CompanyIdRequest {
        company_id: input.id,
    }
}

#[instrument(name = "company.getAll", skip_all, fields(user_id = %session.user_id))]
pub async fn get_all(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<CompanyWire>>, RpcError> {
    let companies = state.company_service.list_companies(&session).await?;
    Ok(Json(companies.into_iter().map(to_wire_company).collect()))
}

#[instrument(name = "company.getOne", skip_all, fields(user_id = %session.user_id, company_id = %input.id))]
pub async fn get_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .get_company(&session, company_id(input))
        .await?;
    Ok(Json(to_wire_company(company)))
}

#[instrument(name = "company.getCompanyContacts", skip_all, fields(user_id = %session.user_id, company_id = %input.id))]
pub async fn get_company_contacts(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<Vec<ContactWire>>, RpcError> {
    let contacts = state
        .company_service
        .list_company_contacts(&session, company_id(input))
        .await?;
    Ok(Json(contacts.into_iter().map(to_wire_contact).collect()))
}

#[instrument(name = "company.getCompanyProjects", skip_all, fields(user_id = %session.user_id, company_id = %input.id))]
pub async fn get_company_projects(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let details = state
        .company_service
        .get_company_projects(&session, company_id(input))
        .await?;
    Ok(Json(to_wire_company_details(details)))
}

#[instrument(name = "company.addOne", skip_all, fields(user_id = %session.user_id))]
pub async fn add_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<AddCompanyInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .create_company(
            &session,
            CreateCompanyRequest {
                name: input.name,
                info: input.info,
            },
        )
        .await?;

    debug!(company_id = %company.id, "company created");
    Ok(Json(to_wire_company(company)))
}

#[instrument(name = "company.updateOne", skip_all, fields(user_id = %session.user_id, company_id = %input.id))]
pub async fn update_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<UpdateCompanyInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .update_company(
            &session,
            UpdateCompanyRequest {
                company_id: input.id,
                name: input.name,
                info: input.info,
            },
        )
        .await?;
    Ok(Json(to_wire_company(company)))
}

#[instrument(name = "company.deleteOne", skip_all, fields(user_id = %session.user_id, company_id = %input.id))]
pub async fn delete_one(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<IdInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .delete_company(&session, company_id(input))
        .await?;

    debug!(company_id = %company.id, "company deleted");
    Ok(Json(to_wire_company(company)))
}

#[instrument(name = "company.addContact", skip_all, fields(user_id = %session.user_id, company_id = %input.company_id))]
pub async fn add_contact(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<CompanyContactsInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .add_contacts(&session, input.into())
        .await?;
    Ok(Json(to_wire_company(company)))
}

#[instrument(name = "company.deleteContact", skip_all, fields(user_id = %session.user_id, company_id = %input.company_id))]
pub async fn delete_contact(
    State(state): State<CrmApiState>,
    AuthSession(session): AuthSession,
    RpcInput(input): RpcInput<CompanyContactsInput>,
) -> Result<Json<CompanyWire>, RpcError> {
    let company = state
        .company_service
        .remove_contacts(&session, input.into())
        .await?;
    Ok(Json(to_wire_company(company)))
}
