use common::auth::{EntityKind, Operation};
use common::domain::{
    Contact, CreateProjectRepoInputWithId, CrmRepositories, DeleteProjectRepoInput, DomainError,
    DomainResult, GetProjectRepoInput, ListProjectsRepoInput, Project, ProjectDetails,
    ProjectIncludes, ProjectStatus, Session, UpdateProjectRepoInput,
};
use common::garde::non_empty_ids;
use garde::Validate;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::domain::{blank_to_none, AssociationEdit, RecordAccess, RelatedLoader};

/// Contacts shown per project when listing projects
const LISTED_CONTACTS_PER_PROJECT: i64 = 4;

#[derive(Debug, Clone, Default, Validate)]
pub struct ListProjectsRequest {
    #[garde(skip)]
    pub include: ProjectIncludes,
}

/// Request to get one project; counts are not loaded
#[derive(Debug, Clone, Validate)]
pub struct GetProjectRequest {
    #[garde(length(min = 1))]
    pub project_id: String,
    #[garde(skip)]
    pub include: ProjectIncludes,
}

#[derive(Debug, Clone, Validate)]
pub struct ProjectIdRequest {
    #[garde(length(min = 1))]
    pub project_id: String,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateProjectRequest {
    #[garde(length(chars, min = 2, max = 50))]
    pub name: String,
    #[garde(length(chars, max = 200))]
    pub info: Option<String>,
    /// Defaults to `PLANNED`
    #[garde(skip)]
    pub status: Option<String>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Validate)]
pub struct UpdateProjectRequest {
    #[garde(length(min = 1))]
    pub project_id: String,
    #[garde(length(chars, min = 2, max = 50))]
    pub name: Option<String>,
    #[garde(skip)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct ProjectAssociationRequest {
    #[garde(length(min = 1))]
    pub project_id: String,
    #[garde(custom(non_empty_ids))]
    pub related_ids: Vec<String>,
}

/// Domain service for projects and their associations
pub struct ProjectService {
    repositories: CrmRepositories,
    access: RecordAccess,
}

impl ProjectService {
    pub fn new(repositories: CrmRepositories, access: RecordAccess) -> Self {
        Self {
            repositories,
            access,
        }
    }

    async fn readable_project(&self, session: &Session, project_id: &str) -> DomainResult<Project> {
        self.repositories
            .projects
            .get_project(GetProjectRepoInput {
                project_id: project_id.to_string(),
                scope: self.access.scope(session, EntityKind::Project, Operation::Read),
            })
            .await?
            .ok_or_else(|| DomainError::ProjectNotFound(project_id.to_string()))
    }

    /// List projects, newest first. Listed projects carry at most four contacts.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id))]
    pub async fn list_projects(
        &self,
        session: &Session,
        request: ListProjectsRequest,
    ) -> DomainResult<Vec<ProjectDetails>> {
        let projects = self
            .repositories
            .projects
            .list_projects(ListProjectsRepoInput {
                scope: self.access.scope(session, EntityKind::Project, Operation::Read),
            })
            .await?;
        debug!(count = projects.len(), "listed projects");

        self.load_includes(session, projects, request.include, Some(LISTED_CONTACTS_PER_PROJECT))
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, project_id = %request.project_id))]
    pub async fn get_project(
        &self,
        session: &Session,
        request: GetProjectRequest,
    ) -> DomainResult<ProjectDetails> {
        common::garde::validate_struct(&request)?;
        let project = self.readable_project(session, &request.project_id).await?;

        let include = ProjectIncludes {
            count_contacts: false,
            count_companies: false,
            ..request.include
        };
        self.load_includes(session, vec![project], include, None)
            .await?
            .pop()
            .ok_or(DomainError::ProjectNotFound(request.project_id))
    }

    /// Every readable contact of a readable project
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, project_id = %request.project_id))]
    pub async fn list_project_contacts(
        &self,
        session: &Session,
        request: ProjectIdRequest,
    ) -> DomainResult<Vec<Contact>> {
        common::garde::validate_struct(&request)?;
        let project = self.readable_project(session, &request.project_id).await?;

        let loader = RelatedLoader::new(&self.repositories, &self.access, session);
        let mut contacts = loader
            .contacts(EntityKind::Project, &[project.id.clone()], None)
            .await?;
        Ok(contacts.remove(&project.id).unwrap_or_default())
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, name = %request.name))]
    pub async fn create_project(
        &self,
        session: &Session,
        request: CreateProjectRequest,
    ) -> DomainResult<Project> {
        common::garde::validate_struct(&request)?;
        let status = parse_status(request.status.as_deref())?.unwrap_or_default();
        self.access.require_create(session, EntityKind::Project)?;

        let project_id = xid::new().to_string();
        debug!(project_id = %project_id, status = %status, "creating project");

        self.repositories
            .projects
            .create_project(CreateProjectRepoInputWithId {
                id: project_id,
                head_id: session.head_id().to_string(),
                created_by: session.user_id.clone(),
                name: request.name,
                info: blank_to_none(request.info),
                status,
            })
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, project_id = %request.project_id))]
    pub async fn update_project(
        &self,
        session: &Session,
        request: UpdateProjectRequest,
    ) -> DomainResult<Project> {
        common::garde::validate_struct(&request)?;
        let status = parse_status(request.status.as_deref())?;
        self.access
            .require(session, EntityKind::Project, Operation::Edit, &request.project_id)
            .await?;

        self.repositories
            .projects
            .update_project(UpdateProjectRepoInput {
                project_id: request.project_id,
                scope: self.access.scope(session, EntityKind::Project, Operation::Edit),
                name: request.name,
                status,
            })
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, project_id = %request.project_id))]
    pub async fn delete_project(
        &self,
        session: &Session,
        request: ProjectIdRequest,
    ) -> DomainResult<Project> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Project, Operation::Delete, &request.project_id)
            .await?;

        self.repositories
            .projects
            .delete_project(DeleteProjectRepoInput {
                project_id: request.project_id,
                scope: self.access.scope(session, EntityKind::Project, Operation::Delete),
            })
            .await
    }

    pub async fn add_contacts(
        &self,
        session: &Session,
        request: ProjectAssociationRequest,
    ) -> DomainResult<Project> {
        self.edit_associations(session, request, AssociationEdit::Connect, EntityKind::Contact)
            .await
    }

    pub async fn remove_contacts(
        &self,
        session: &Session,
        request: ProjectAssociationRequest,
    ) -> DomainResult<Project> {
        self.edit_associations(session, request, AssociationEdit::Disconnect, EntityKind::Contact)
            .await
    }

    pub async fn add_companies(
        &self,
        session: &Session,
        request: ProjectAssociationRequest,
    ) -> DomainResult<Project> {
        self.edit_associations(session, request, AssociationEdit::Connect, EntityKind::Company)
            .await
    }

    pub async fn remove_companies(
        &self,
        session: &Session,
        request: ProjectAssociationRequest,
    ) -> DomainResult<Project> {
        self.edit_associations(session, request, AssociationEdit::Disconnect, EntityKind::Company)
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, project_id = %request.project_id, related = related_kind.as_str()))]
    async fn edit_associations(
        &self,
        session: &Session,
        request: ProjectAssociationRequest,
        edit: AssociationEdit,
        related_kind: EntityKind,
    ) -> DomainResult<Project> {
        common::garde::validate_struct(&request)?;
        self.access
            .edit_associations(
                session,
                edit,
                EntityKind::Project,
                &request.project_id,
                related_kind,
                request.related_ids,
            )
            .await?;

        self.readable_project(session, &request.project_id).await
    }

    async fn load_includes(
        &self,
        session: &Session,
        projects: Vec<Project>,
        include: ProjectIncludes,
        contacts_per_project: Option<i64>,
    ) -> DomainResult<Vec<ProjectDetails>> {
        let ids: Vec<String> = projects.iter().map(|p| p.id.clone()).collect();
        let loader = RelatedLoader::new(&self.repositories, &self.access, session);

        let mut contacts = if include.contacts {
            loader
                .contacts(EntityKind::Project, &ids, contacts_per_project)
                .await?
        } else {
            HashMap::new()
        };
        let mut activities = if include.activities {
            loader.activities(EntityKind::Project, &ids, None).await?
        } else {
            HashMap::new()
        };
        let mut companies = if include.companies {
            loader.companies(EntityKind::Project, &ids).await?
        } else {
            HashMap::new()
        };
        let contact_counts = if include.count_contacts {
            loader
                .counts(EntityKind::Project, &ids, EntityKind::Contact)
                .await?
        } else {
            HashMap::new()
        };
        let company_counts = if include.count_companies {
            loader
                .counts(EntityKind::Project, &ids, EntityKind::Company)
                .await?
        } else {
            HashMap::new()
        };

        Ok(projects
            .into_iter()
            .map(|project| {
                let id = project.id.clone();
                let mut details = ProjectDetails::new(project);
                if include.contacts {
                    details.contacts = Some(contacts.remove(&id).unwrap_or_default());
                }
                if include.activities {
                    details.activities = Some(activities.remove(&id).unwrap_or_default());
                }
                if include.companies {
                    details.companies = Some(companies.remove(&id).unwrap_or_default());
                }
                if include.count_contacts {
                    details.contact_count = Some(contact_counts.get(&id).copied().unwrap_or(0));
                }
                if include.count_companies {
                    details.company_count = Some(company_counts.get(&id).copied().unwrap_or(0));
                }
                details
            })
            .collect())
    }
}

fn parse_status(status: Option<&str>) -> DomainResult<Option<ProjectStatus>> {
    status.map(str::parse::<ProjectStatus>).transpose()
}
