use common::auth::{EntityKind, Operation};
use common::domain::{
    Company, CompanyDetails, Contact, CreateCompanyRepoInputWithId, CrmRepositories,
    DeleteCompanyRepoInput, DomainError, DomainResult, GetCompanyRepoInput,
    ListCompaniesRepoInput, ProjectDetails, Session, UpdateCompanyRepoInput,
};
use common::garde::non_empty_ids;
use garde::Validate;
use tracing::{debug, instrument};

use crate::domain::{blank_to_none, AssociationEdit, RecordAccess, RelatedLoader};

/// Request naming one company
#[derive(Debug, Clone, Validate)]
pub struct CompanyIdRequest {
    #[garde(length(min = 1))]
    pub company_id: String,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateCompanyRequest {
    #[garde(length(chars, min = 2, max = 50))]
    pub name: String,
    #[garde(length(chars, max = 200))]
    pub info: Option<String>,
}

/// Partial update; absent fields keep their value and blank info clears it
#[derive(Debug, Clone, Validate)]
pub struct UpdateCompanyRequest {
    #[garde(length(min = 1))]
    pub company_id: String,
    #[garde(length(chars, min = 2, max = 50))]
    pub name: Option<String>,
    #[garde(length(chars, max = 200))]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct CompanyAssociationRequest {
    #[garde(length(min = 1))]
    pub company_id: String,
    #[garde(custom(non_empty_ids))]
    pub related_ids: Vec<String>,
}

/// Domain service for companies
pub struct CompanyService {
    repositories: CrmRepositories,
    access: RecordAccess,
}

impl CompanyService {
    pub fn new(repositories: CrmRepositories, access: RecordAccess) -> Self {
        Self {
            repositories,
            access,
        }
    }

    async fn readable_company(&self, session: &Session, company_id: &str) -> DomainResult<Company> {
        self.repositories
            .companies
            .get_company(GetCompanyRepoInput {
                company_id: company_id.to_string(),
                scope: self.access.scope(session, EntityKind::Company, Operation::Read),
            })
            .await?
            .ok_or_else(|| DomainError::CompanyNotFound(company_id.to_string()))
    }

    /// List companies, newest first
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn list_companies(&self, session: &Session) -> DomainResult<Vec<Company>> {
        let companies = self
            .repositories
            .companies
            .list_companies(ListCompaniesRepoInput {
                scope: self.access.scope(session, EntityKind::Company, Operation::Read),
            })
            .await?;
        debug!(count = companies.len(), "listed companies");
        Ok(companies)
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    pub async fn get_company(
        &self,
        session: &Session,
        request: CompanyIdRequest,
    ) -> DomainResult<Company> {
        common::garde::validate_struct(&request)?;
        self.readable_company(session, &request.company_id).await
    }

    /// Contacts of a readable company
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    pub async fn list_company_contacts(
        &self,
        session: &Session,
        request: CompanyIdRequest,
    ) -> DomainResult<Vec<Contact>> {
        common::garde::validate_struct(&request)?;
        let company = self.readable_company(session, &request.company_id).await?;

        let loader = RelatedLoader::new(&self.repositories, &self.access, session);
        let mut contacts = loader
            .contacts(EntityKind::Company, &[company.id.clone()], None)
            .await?;
        Ok(contacts.remove(&company.id).unwrap_or_default())
    }

    /// A readable company together with its projects
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    pub async fn get_company_projects(
        &self,
        session: &Session,
        request: CompanyIdRequest,
    ) -> DomainResult<CompanyDetails> {
        common::garde::validate_struct(&request)?;
        let company = self.readable_company(session, &request.company_id).await?;

        let loader = RelatedLoader::new(&self.repositories, &self.access, session);
        let mut projects = loader
            .projects(EntityKind::Company, &[company.id.clone()])
            .await?;

        let mut details = CompanyDetails::new(company);
        details.projects = Some(
            projects
                .remove(&details.company.id)
                .unwrap_or_default()
                .into_iter()
                .map(ProjectDetails::new)
                .collect(),
        );
        Ok(details)
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, name = %request.name))]
    pub async fn create_company(
        &self,
        session: &Session,
        request: CreateCompanyRequest,
    ) -> DomainResult<Company> {
        common::garde::validate_struct(&request)?;
        self.access.require_create(session, EntityKind::Company)?;

        let company_id = xid::new().to_string();
        debug!(company_id = %company_id, "creating company");

        self.repositories
            .companies
            .create_company(CreateCompanyRepoInputWithId {
                id: company_id,
                head_id: session.head_id().to_string(),
                created_by: session.user_id.clone(),
                name: request.name,
                info: blank_to_none(request.info),
            })
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    pub async fn update_company(
        &self,
        session: &Session,
        request: UpdateCompanyRequest,
    ) -> DomainResult<Company> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Company, Operation::Edit, &request.company_id)
            .await?;

        self.repositories
            .companies
            .update_company(UpdateCompanyRepoInput {
                company_id: request.company_id,
                scope: self.access.scope(session, EntityKind::Company, Operation::Edit),
                name: request.name,
                info: request.info.map(|info| blank_to_none(Some(info))),
            })
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    pub async fn delete_company(
        &self,
        session: &Session,
        request: CompanyIdRequest,
    ) -> DomainResult<Company> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Company, Operation::Delete, &request.company_id)
            .await?;

        self.repositories
            .companies
            .delete_company(DeleteCompanyRepoInput {
                company_id: request.company_id,
                scope: self.access.scope(session, EntityKind::Company, Operation::Delete),
            })
            .await
    }

    pub async fn add_contacts(
        &self,
        session: &Session,
        request: CompanyAssociationRequest,
    ) -> DomainResult<Company> {
        self.edit_contacts(session, request, AssociationEdit::Connect)
            .await
    }

    pub async fn remove_contacts(
        &self,
        session: &Session,
        request: CompanyAssociationRequest,
    ) -> DomainResult<Company> {
        self.edit_contacts(session, request, AssociationEdit::Disconnect)
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, company_id = %request.company_id))]
    async fn edit_contacts(
        &self,
        session: &Session,
        request: CompanyAssociationRequest,
        edit: AssociationEdit,
    ) -> DomainResult<Company> {
        common::garde::validate_struct(&request)?;
        self.access
            .edit_associations(
                session,
                edit,
                EntityKind::Company,
                &request.company_id,
                EntityKind::Contact,
                request.related_ids,
            )
            .await?;

        self.readable_company(session, &request.company_id).await
    }
}
