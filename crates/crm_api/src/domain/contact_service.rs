use common::auth::{EntityKind, Operation};
use common::domain::{
    ActivityExclusion, CompanyDetails, Contact, ContactDetails, ContactIncludes,
    ContactLinkRepoInput, CreateContactRepoInputWithId, CrmRepositories, DeleteContactRepoInput,
    DomainError, DomainResult, GetContactRepoInput, LinkDirection, ListContactsRepoInput,
    ListRelatedRepoInput, ProjectDetails, RecordScope, RelationSide, Session,
    UpdateContactRepoInput,
};
use common::garde::{email_or_empty, non_empty_ids};
use garde::Validate;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::domain::{blank_to_none, AssociationEdit, RecordAccess, RelatedLoader};

// ============================================================================
// Service Request Types
// ============================================================================

/// Request to list the contacts visible to the session
#[derive(Debug, Clone, Default, Validate)]
pub struct ListContactsRequest {
    #[garde(skip)]
    pub include: ContactIncludes,
}

/// Request to get one contact. Relations are always loaded; `policies`
/// is ignored.
#[derive(Debug, Clone, Validate)]
pub struct GetContactRequest {
    #[garde(length(min = 1))]
    pub contact_id: String,
    #[garde(skip)]
    pub include: ContactIncludes,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateContactRequest {
    #[garde(length(chars, min = 2, max = 50))]
    pub name: String,
    #[garde(custom(email_or_empty))]
    pub email: Option<String>,
    #[garde(length(chars, max = 200))]
    pub info: Option<String>,
    #[garde(skip)]
    pub mobile: Option<String>,
    #[garde(custom(non_empty_ids))]
    pub company_ids: Vec<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct UpdateContactRequest {
    #[garde(length(min = 1))]
    pub contact_id: String,
    #[garde(length(chars, min = 2, max = 50))]
    pub name: String,
    #[garde(custom(email_or_empty))]
    pub email: Option<String>,
    #[garde(length(chars, max = 200))]
    pub info: Option<String>,
    #[garde(skip)]
    pub mobile: Option<String>,
    #[garde(custom(non_empty_ids))]
    pub company_ids: Vec<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct DeleteContactRequest {
    #[garde(length(min = 1))]
    pub contact_id: String,
}

/// Request to add or remove directed edges between two contacts.
/// `mode` 0 touches both directions, 1 the edge one→two, 2 the edge two→one.
#[derive(Debug, Clone, Validate)]
pub struct ContactLinkRequest {
    #[garde(length(min = 1))]
    pub contact_one: String,
    #[garde(length(min = 1))]
    pub contact_two: String,
    #[garde(skip)]
    pub mode: i32,
}

/// Request to connect or disconnect records of another kind to a contact
#[derive(Debug, Clone, Validate)]
pub struct ContactAssociationRequest {
    #[garde(length(min = 1))]
    pub contact_id: String,
    #[garde(custom(non_empty_ids))]
    pub related_ids: Vec<String>,
}

/// Domain service for contacts, their links and associations
pub struct ContactService {
    repositories: CrmRepositories,
    access: RecordAccess,
}

impl ContactService {
    pub fn new(repositories: CrmRepositories, access: RecordAccess) -> Self {
        Self {
            repositories,
            access,
        }
    }

    /// List contacts, newest first, with the requested relations
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id))]
    pub async fn list_contacts(
        &self,
        session: &Session,
        request: ListContactsRequest,
    ) -> DomainResult<Vec<ContactDetails>> {
        let scope = self.access.scope(session, EntityKind::Contact, Operation::Read);
        let contacts = self
            .repositories
            .contacts
            .list_contacts(ListContactsRepoInput { scope })
            .await?;

        debug!(count = contacts.len(), "listed contacts");
        self.load_includes(session, contacts, request.include).await
    }

    /// Get one contact with its relations.
    ///
    /// When activities are requested together with companies or projects,
    /// each company and project carries its association counts and the
    /// activities not already shown on the contact itself.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_id = %request.contact_id))]
    pub async fn get_contact(
        &self,
        session: &Session,
        request: GetContactRequest,
    ) -> DomainResult<ContactDetails> {
        common::garde::validate_struct(&request)?;

        let contact = self
            .repositories
            .contacts
            .get_contact(GetContactRepoInput {
                contact_id: request.contact_id.clone(),
                scope: self.access.scope(session, EntityKind::Contact, Operation::Read),
            })
            .await?
            .ok_or_else(|| DomainError::ContactNotFound(request.contact_id.clone()))?;

        let include = ContactIncludes {
            policies: false,
            relations: true,
            ..request.include
        };
        let mut details = self
            .load_includes(session, vec![contact], include)
            .await?
            .pop()
            .ok_or_else(|| DomainError::ContactNotFound(request.contact_id.clone()))?;

        if include.activities {
            let loader = RelatedLoader::new(&self.repositories, &self.access, session);
            if let Some(companies) = details.companies.take() {
                details.companies =
                    Some(enrich_companies(&loader, &request.contact_id, companies).await?);
            }
            if let Some(projects) = details.projects.take() {
                details.projects =
                    Some(enrich_projects(&loader, &request.contact_id, projects).await?);
            }
        }

        Ok(details)
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, name = %request.name))]
    pub async fn create_contact(
        &self,
        session: &Session,
        request: CreateContactRequest,
    ) -> DomainResult<Contact> {
        common::garde::validate_struct(&request)?;
        self.access.require_create(session, EntityKind::Contact)?;

        let contact_id = xid::new().to_string();
        debug!(contact_id = %contact_id, "creating contact");

        self.repositories
            .contacts
            .create_contact(CreateContactRepoInputWithId {
                id: contact_id,
                head_id: session.head_id().to_string(),
                created_by: session.user_id.clone(),
                name: request.name,
                email: blank_to_none(request.email),
                info: blank_to_none(request.info),
                mobile: blank_to_none(request.mobile),
                company_ids: request.company_ids,
            })
            .await
    }

    /// Replace the contact's fields and connect the listed companies
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_id = %request.contact_id))]
    pub async fn update_contact(
        &self,
        session: &Session,
        request: UpdateContactRequest,
    ) -> DomainResult<Contact> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Contact, Operation::Edit, &request.contact_id)
            .await?;

        self.repositories
            .contacts
            .update_contact(UpdateContactRepoInput {
                contact_id: request.contact_id,
                scope: self.access.scope(session, EntityKind::Contact, Operation::Edit),
                name: request.name,
                email: blank_to_none(request.email),
                info: blank_to_none(request.info),
                mobile: blank_to_none(request.mobile),
                company_ids: request.company_ids,
            })
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_id = %request.contact_id))]
    pub async fn delete_contact(
        &self,
        session: &Session,
        request: DeleteContactRequest,
    ) -> DomainResult<Contact> {
        common::garde::validate_struct(&request)?;
        self.access
            .require(session, EntityKind::Contact, Operation::Delete, &request.contact_id)
            .await?;

        self.repositories
            .contacts
            .delete_contact(DeleteContactRepoInput {
                contact_id: request.contact_id,
                scope: self.access.scope(session, EntityKind::Contact, Operation::Delete),
            })
            .await
    }

    /// Create the edges selected by the mode. The second contact must be
    /// editable by the session as well.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_one = %request.contact_one, contact_two = %request.contact_two, mode = request.mode))]
    pub async fn add_link(
        &self,
        session: &Session,
        request: ContactLinkRequest,
    ) -> DomainResult<Contact> {
        let input = self.link_input(session, request, true).await?;
        self.repositories.relations.add_links(input).await
    }

    /// Remove the edges selected by the mode; missing edges are ignored
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_one = %request.contact_one, contact_two = %request.contact_two, mode = request.mode))]
    pub async fn delete_link(
        &self,
        session: &Session,
        request: ContactLinkRequest,
    ) -> DomainResult<Contact> {
        let input = self.link_input(session, request, false).await?;
        self.repositories.relations.remove_links(input).await
    }

    async fn link_input(
        &self,
        session: &Session,
        request: ContactLinkRequest,
        scope_target: bool,
    ) -> DomainResult<ContactLinkRepoInput> {
        common::garde::validate_struct(&request)?;
        let direction = LinkDirection::try_from(request.mode)?;
        if request.contact_one == request.contact_two {
            return Err(DomainError::SelfLink(request.contact_one));
        }

        self.access
            .require(session, EntityKind::Contact, Operation::Edit, &request.contact_one)
            .await?;

        let edit_scope = self.access.scope(session, EntityKind::Contact, Operation::Edit);
        Ok(ContactLinkRepoInput {
            source_id: request.contact_one,
            target_id: request.contact_two,
            direction,
            target_scope: scope_target.then(|| edit_scope.clone()),
            source_scope: edit_scope,
        })
    }

    pub async fn add_companies(
        &self,
        session: &Session,
        request: ContactAssociationRequest,
    ) -> DomainResult<Contact> {
        self.edit_associations(session, request, AssociationEdit::Connect, EntityKind::Company)
            .await
    }

    pub async fn remove_companies(
        &self,
        session: &Session,
        request: ContactAssociationRequest,
    ) -> DomainResult<Contact> {
        self.edit_associations(session, request, AssociationEdit::Disconnect, EntityKind::Company)
            .await
    }

    pub async fn add_projects(
        &self,
        session: &Session,
        request: ContactAssociationRequest,
    ) -> DomainResult<Contact> {
        self.edit_associations(session, request, AssociationEdit::Connect, EntityKind::Project)
            .await
    }

    pub async fn remove_projects(
        &self,
        session: &Session,
        request: ContactAssociationRequest,
    ) -> DomainResult<Contact> {
        self.edit_associations(session, request, AssociationEdit::Disconnect, EntityKind::Project)
            .await
    }

    #[instrument(skip(self, session, request), fields(user_id = %session.user_id, contact_id = %request.contact_id, related = related_kind.as_str()))]
    async fn edit_associations(
        &self,
        session: &Session,
        request: ContactAssociationRequest,
        edit: AssociationEdit,
        related_kind: EntityKind,
    ) -> DomainResult<Contact> {
        common::garde::validate_struct(&request)?;
        self.access
            .edit_associations(
                session,
                edit,
                EntityKind::Contact,
                &request.contact_id,
                related_kind,
                request.related_ids,
            )
            .await?;

        self.repositories
            .contacts
            .get_contact(GetContactRepoInput {
                contact_id: request.contact_id.clone(),
                scope: self.access.scope(session, EntityKind::Contact, Operation::Edit),
            })
            .await?
            .ok_or(DomainError::ContactNotFound(request.contact_id))
    }

    async fn load_includes(
        &self,
        session: &Session,
        contacts: Vec<Contact>,
        include: ContactIncludes,
    ) -> DomainResult<Vec<ContactDetails>> {
        let ids: Vec<String> = contacts.iter().map(|c| c.id.clone()).collect();
        let loader = RelatedLoader::new(&self.repositories, &self.access, session);

        let users = if include.user {
            let mut user_ids: Vec<String> =
                contacts.iter().filter_map(|c| c.user_id.clone()).collect();
            user_ids.sort();
            user_ids.dedup();
            loader.users(user_ids).await?
        } else {
            HashMap::new()
        };
        let mut companies = if include.companies {
            loader.readable_companies(EntityKind::Contact, &ids).await?
        } else {
            HashMap::new()
        };
        let mut activities = if include.activities {
            loader.activities(EntityKind::Contact, &ids, None).await?
        } else {
            HashMap::new()
        };
        let mut projects = if include.projects {
            loader.projects(EntityKind::Contact, &ids).await?
        } else {
            HashMap::new()
        };
        let mut policies = if include.policies {
            loader.own_policies(EntityKind::Contact, &ids).await?
        } else {
            HashMap::new()
        };
        let relations = if include.relations {
            self.repositories
                .relations
                .list_relations(ListRelatedRepoInput {
                    owner_kind: EntityKind::Contact,
                    owner_ids: ids.clone(),
                    scope: RecordScope::head(session.head_id()),
                    limit_per_owner: None,
                })
                .await?
        } else {
            Vec::new()
        };

        let mut incoming: HashMap<String, Vec<Contact>> = HashMap::new();
        let mut outgoing: HashMap<String, Vec<Contact>> = HashMap::new();
        for relation in relations {
            let side = match relation.side {
                RelationSide::Incoming => &mut incoming,
                RelationSide::Outgoing => &mut outgoing,
            };
            side.entry(relation.contact_id).or_default().push(relation.contact);
        }

        let details = contacts
            .into_iter()
            .map(|contact| {
                let id = contact.id.clone();
                let mut details = ContactDetails::new(contact);
                if include.user {
                    details.user = Some(
                        details
                            .contact
                            .user_id
                            .as_ref()
                            .and_then(|user_id| users.get(user_id).cloned()),
                    );
                }
                if include.companies {
                    details.companies = Some(
                        companies
                            .remove(&id)
                            .unwrap_or_default()
                            .into_iter()
                            .map(CompanyDetails::new)
                            .collect(),
                    );
                }
                if include.activities {
                    details.activities = Some(activities.remove(&id).unwrap_or_default());
                }
                if include.projects {
                    details.projects = Some(
                        projects
                            .remove(&id)
                            .unwrap_or_default()
                            .into_iter()
                            .map(ProjectDetails::new)
                            .collect(),
                    );
                }
                if include.policies {
                    details.policies = Some(policies.remove(&id).unwrap_or_default());
                }
                if include.relations {
                    details.incoming_relations = Some(incoming.remove(&id).unwrap_or_default());
                    details.outgoing_relations = Some(outgoing.remove(&id).unwrap_or_default());
                }
                details
            })
            .collect();

        Ok(details)
    }
}

/// Companies of a contact with counts and the company activities that are
/// linked neither to the contact nor to one of its projects
async fn enrich_companies(
    loader: &RelatedLoader<'_>,
    contact_id: &str,
    companies: Vec<CompanyDetails>,
) -> DomainResult<Vec<CompanyDetails>> {
    let ids: Vec<String> = companies.iter().map(|c| c.company.id.clone()).collect();
    let contact_counts = loader
        .counts(EntityKind::Company, &ids, EntityKind::Contact)
        .await?;
    let project_counts = loader
        .counts(EntityKind::Company, &ids, EntityKind::Project)
        .await?;
    let mut activities = loader
        .activities(
            EntityKind::Company,
            &ids,
            Some(ActivityExclusion {
                contact_id: contact_id.to_string(),
                include_contact_projects: true,
            }),
        )
        .await?;

    Ok(companies
        .into_iter()
        .map(|mut details| {
            let id = &details.company.id;
            details.contact_count = Some(contact_counts.get(id).copied().unwrap_or(0));
            details.project_count = Some(project_counts.get(id).copied().unwrap_or(0));
            details.activities = Some(activities.remove(id).unwrap_or_default());
            details
        })
        .collect())
}

/// Projects of a contact with counts and the project activities not linked
/// to the contact
async fn enrich_projects(
    loader: &RelatedLoader<'_>,
    contact_id: &str,
    projects: Vec<ProjectDetails>,
) -> DomainResult<Vec<ProjectDetails>> {
    let ids: Vec<String> = projects.iter().map(|p| p.project.id.clone()).collect();
    let contact_counts = loader
        .counts(EntityKind::Project, &ids, EntityKind::Contact)
        .await?;
    let company_counts = loader
        .counts(EntityKind::Project, &ids, EntityKind::Company)
        .await?;
    let mut activities = loader
        .activities(
            EntityKind::Project,
            &ids,
            Some(ActivityExclusion {
                contact_id: contact_id.to_string(),
                include_contact_projects: false,
            }),
        )
        .await?;

    Ok(projects
        .into_iter()
        .map(|mut details| {
            let id = &details.project.id;
            details.contact_count = Some(contact_counts.get(id).copied().unwrap_or(0));
            details.company_count = Some(company_counts.get(id).copied().unwrap_or(0));
            details.activities = Some(activities.remove(id).unwrap_or_default());
            details
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{
        sample_activity, sample_company, sample_contact, sample_project, session_with,
        MockRepositories,
    };
    use common::auth::RoleAuthorizationService;
    use common::domain::{
        AccessFilter, AssociationCount, ContactRelation, PolicyGrant, Related, RoleCapabilities,
    };
    use std::sync::Arc;

    fn service(mocks: MockRepositories) -> ContactService {
        let repositories = mocks.into_repositories();
        let access = RecordAccess::new(
            repositories.clone(),
            Arc::new(RoleAuthorizationService::new()),
        );
        ContactService::new(repositories, access)
    }

    fn full_access() -> Session {
        session_with(RoleCapabilities::all())
    }

    fn related<T>(owner_id: &str, record: T) -> Related<T> {
        Related {
            owner_id: owner_id.to_string(),
            record,
        }
    }

    fn link_request(mode: i32) -> ContactLinkRequest {
        ContactLinkRequest {
            contact_one: "c1".to_string(),
            contact_two: "c2".to_string(),
            mode,
        }
    }

    fn expect_editable(mocks: &mut MockRepositories, contact_id: &'static str) {
        mocks
            .contacts
            .expect_get_contact()
            .withf(move |input| input.contact_id == contact_id)
            .returning(move |_| Ok(Some(sample_contact(contact_id))));
        mocks.policies.expect_list_policies().returning(move |_| {
            Ok(vec![PolicyGrant {
                user_id: "user-1".to_string(),
                record_id: contact_id.to_string(),
                can_edit: true,
                can_delete: false,
            }])
        });
    }

    #[tokio::test]
    async fn test_create_contact_requires_create_capability() {
        let mut mocks = MockRepositories::new();
        mocks.contacts.expect_create_contact().times(0);

        let result = service(mocks)
            .create_contact(
                &session_with(RoleCapabilities::default()),
                CreateContactRequest {
                    name: "Ada Lovelace".to_string(),
                    email: None,
                    info: None,
                    mobile: None,
                    company_ids: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_create_contact_success() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_create_contact()
            .withf(|input| {
                !input.id.is_empty()
                    && input.head_id == "head-1"
                    && input.created_by == "user-1"
                    && input.name == "Ada Lovelace"
                    && input.email.is_none()
                    && input.company_ids == vec!["co1".to_string()]
            })
            .times(1)
            .return_once(|input| {
                let mut contact = sample_contact(&input.id);
                contact.name = input.name;
                Ok(contact)
            });

        let contact = service(mocks)
            .create_contact(
                &session_with(RoleCapabilities {
                    can_create_contact: true,
                    ..Default::default()
                }),
                CreateContactRequest {
                    name: "Ada Lovelace".to_string(),
                    email: Some(String::new()),
                    info: None,
                    mobile: None,
                    company_ids: vec!["co1".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(contact.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_create_contact_rejects_bad_input() {
        let mocks = MockRepositories::new();

        let result = service(mocks)
            .create_contact(
                &full_access(),
                CreateContactRequest {
                    name: "A".to_string(),
                    email: Some("not-an-email".to_string()),
                    info: None,
                    mobile: None,
                    company_ids: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_contact_without_policy_is_forbidden() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .return_once(|_| Ok(Some(sample_contact("c1"))));
        mocks
            .policies
            .expect_list_policies()
            .return_once(|_| Ok(vec![]));
        mocks.contacts.expect_delete_contact().times(0);

        let result = service(mocks)
            .delete_contact(
                &session_with(RoleCapabilities {
                    can_read_all_contact: true,
                    can_edit_all_contact: true,
                    ..Default::default()
                }),
                DeleteContactRequest {
                    contact_id: "c1".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_update_contact_with_edit_policy_uses_policy_scope() {
        let mut mocks = MockRepositories::new();
        expect_editable(&mut mocks, "c1");
        mocks
            .contacts
            .expect_update_contact()
            .withf(|input| {
                input.contact_id == "c1"
                    && input.name == "Grace Hopper"
                    && matches!(input.scope.access, AccessFilter::AnyOf(ref rules) if rules.len() == 1)
            })
            .times(1)
            .return_once(|_| Ok(sample_contact("c1")));

        let result = service(mocks)
            .update_contact(
                &session_with(RoleCapabilities::default()),
                UpdateContactRequest {
                    contact_id: "c1".to_string(),
                    name: "Grace Hopper".to_string(),
                    email: Some("grace@example.com".to_string()),
                    info: None,
                    mobile: None,
                    company_ids: vec![],
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_link_rejects_self_link() {
        let mut mocks = MockRepositories::new();
        mocks.relations.expect_add_links().times(0);

        let result = service(mocks)
            .add_link(
                &full_access(),
                ContactLinkRequest {
                    contact_one: "c1".to_string(),
                    contact_two: "c1".to_string(),
                    mode: 0,
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::SelfLink(id)) if id == "c1"));
    }

    #[tokio::test]
    async fn test_add_link_rejects_unknown_mode() {
        let mocks = MockRepositories::new();

        let result = service(mocks).add_link(&full_access(), link_request(3)).await;

        assert!(matches!(result, Err(DomainError::InvalidLinkMode(3))));
    }

    #[tokio::test]
    async fn test_add_link_outgoing_scopes_target() {
        let mut mocks = MockRepositories::new();
        expect_editable(&mut mocks, "c1");
        mocks
            .relations
            .expect_add_links()
            .withf(|input| {
                input.source_id == "c1"
                    && input.target_id == "c2"
                    && input.direction == LinkDirection::Outgoing
                    && input.target_scope.as_ref() == Some(&input.source_scope)
            })
            .times(1)
            .return_once(|_| Ok(sample_contact("c1")));

        let result = service(mocks)
            .add_link(&session_with(RoleCapabilities::default()), link_request(1))
            .await;

        assert_eq!(result.unwrap().id, "c1");
    }

    #[tokio::test]
    async fn test_delete_link_leaves_target_unscoped() {
        let mut mocks = MockRepositories::new();
        expect_editable(&mut mocks, "c1");
        mocks
            .relations
            .expect_remove_links()
            .withf(|input| input.direction == LinkDirection::Incoming && input.target_scope.is_none())
            .times(1)
            .return_once(|_| Ok(sample_contact("c1")));

        let result = service(mocks)
            .delete_link(&session_with(RoleCapabilities::default()), link_request(2))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_link_without_edit_permission_is_forbidden() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .return_once(|_| Ok(Some(sample_contact("c1"))));
        mocks
            .policies
            .expect_list_policies()
            .return_once(|_| Ok(vec![]));
        mocks.relations.expect_add_links().times(0);

        let result = service(mocks)
            .add_link(
                &session_with(RoleCapabilities {
                    can_read_all_contact: true,
                    ..Default::default()
                }),
                link_request(0),
            )
            .await;

        assert!(matches!(result, Err(DomainError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_list_contacts_with_relations_splits_sides() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_list_contacts()
            .return_once(|_| Ok(vec![sample_contact("c1"), sample_contact("c2")]));
        mocks
            .relations
            .expect_list_relations()
            .withf(|input| input.owner_ids == vec!["c1".to_string(), "c2".to_string()])
            .return_once(|_| {
                Ok(vec![
                    ContactRelation {
                        contact_id: "c1".to_string(),
                        side: RelationSide::Outgoing,
                        contact: sample_contact("c2"),
                    },
                    ContactRelation {
                        contact_id: "c2".to_string(),
                        side: RelationSide::Incoming,
                        contact: sample_contact("c1"),
                    },
                ])
            });

        let contacts = service(mocks)
            .list_contacts(
                &full_access(),
                ListContactsRequest {
                    include: ContactIncludes {
                        relations: true,
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].outgoing_relations.as_ref().unwrap().len(), 1);
        assert!(contacts[0].incoming_relations.as_ref().unwrap().is_empty());
        assert_eq!(contacts[1].incoming_relations.as_ref().unwrap()[0].id, "c1");
        assert!(contacts[1].outgoing_relations.as_ref().unwrap().is_empty());
        assert!(contacts[0].companies.is_none());
    }

    #[tokio::test]
    async fn test_list_contacts_companies_use_company_read_scope() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_list_contacts()
            .return_once(|_| Ok(vec![sample_contact("c1")]));
        mocks
            .companies
            .expect_list_related_companies()
            .withf(|input| {
                input.owner_kind == EntityKind::Contact
                    && matches!(input.scope.access, AccessFilter::AnyOf(_))
            })
            .return_once(|_| Ok(vec![related("c1", sample_company("co1"))]));

        let contacts = service(mocks)
            .list_contacts(
                &session_with(RoleCapabilities {
                    can_read_all_contact: true,
                    ..Default::default()
                }),
                ListContactsRequest {
                    include: ContactIncludes {
                        companies: true,
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        let companies = contacts[0].companies.as_ref().unwrap();
        assert_eq!(companies[0].company.id, "co1");
    }

    #[tokio::test]
    async fn test_get_contact_missing_is_not_found() {
        let mut mocks = MockRepositories::new();
        mocks.contacts.expect_get_contact().return_once(|_| Ok(None));

        let result = service(mocks)
            .get_contact(
                &full_access(),
                GetContactRequest {
                    contact_id: "c-404".to_string(),
                    include: ContactIncludes::default(),
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::ContactNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_contact_enriches_companies_when_activities_requested() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .return_once(|_| Ok(Some(sample_contact("c1"))));
        mocks
            .relations
            .expect_list_relations()
            .return_once(|_| Ok(vec![]));
        mocks
            .companies
            .expect_list_related_companies()
            .return_once(|_| Ok(vec![related("c1", sample_company("co1"))]));
        mocks
            .activities
            .expect_list_related_activities()
            .withf(|input| input.related.owner_kind == EntityKind::Contact)
            .return_once(|_| Ok(vec![related("c1", sample_activity("a1"))]));
        mocks
            .activities
            .expect_list_related_activities()
            .withf(|input| {
                input.related.owner_kind == EntityKind::Company
                    && input.exclusion
                        == Some(ActivityExclusion {
                            contact_id: "c1".to_string(),
                            include_contact_projects: true,
                        })
            })
            .return_once(|_| Ok(vec![related("co1", sample_activity("a2"))]));
        mocks
            .associations
            .expect_count_associations()
            .withf(|input| input.related_kind == EntityKind::Contact)
            .return_once(|_| {
                Ok(vec![AssociationCount {
                    owner_id: "co1".to_string(),
                    count: 3,
                }])
            });
        mocks
            .associations
            .expect_count_associations()
            .withf(|input| input.related_kind == EntityKind::Project)
            .return_once(|_| Ok(vec![]));

        let details = service(mocks)
            .get_contact(
                &full_access(),
                GetContactRequest {
                    contact_id: "c1".to_string(),
                    include: ContactIncludes {
                        companies: true,
                        activities: true,
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(details.activities.as_ref().unwrap()[0].id, "a1");
        let company = &details.companies.as_ref().unwrap()[0];
        assert_eq!(company.contact_count, Some(3));
        assert_eq!(company.project_count, Some(0));
        assert_eq!(company.activities.as_ref().unwrap()[0].id, "a2");
        assert!(details.incoming_relations.is_some());
    }

    #[tokio::test]
    async fn test_get_contact_projects_without_activities_are_plain() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .return_once(|_| Ok(Some(sample_contact("c1"))));
        mocks
            .relations
            .expect_list_relations()
            .return_once(|_| Ok(vec![]));
        mocks
            .projects
            .expect_list_related_projects()
            .return_once(|_| Ok(vec![related("c1", sample_project("p1"))]));
        mocks.associations.expect_count_associations().times(0);

        let details = service(mocks)
            .get_contact(
                &full_access(),
                GetContactRequest {
                    contact_id: "c1".to_string(),
                    include: ContactIncludes {
                        projects: true,
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        let project = &details.projects.as_ref().unwrap()[0];
        assert_eq!(project.project.id, "p1");
        assert!(project.contact_count.is_none());
    }

    #[tokio::test]
    async fn test_add_companies_connects_and_returns_contact() {
        let mut mocks = MockRepositories::new();
        expect_editable(&mut mocks, "c1");
        mocks
            .associations
            .expect_connect()
            .withf(|input| {
                input.owner_id == "c1"
                    && input.related_kind == EntityKind::Company
                    && input.related_ids == vec!["co1".to_string()]
            })
            .times(1)
            .return_once(|_| Ok(()));

        let contact = service(mocks)
            .add_companies(
                &session_with(RoleCapabilities::default()),
                ContactAssociationRequest {
                    contact_id: "c1".to_string(),
                    related_ids: vec!["co1".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(contact.id, "c1");
    }

    #[tokio::test]
    async fn test_contact_reader_sees_linked_activities_projects_and_relations() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .return_once(|_| Ok(Some(sample_contact("c1"))));
        mocks
            .relations
            .expect_list_relations()
            .withf(|input| input.scope == RecordScope::head("head-1"))
            .return_once(|_| {
                Ok(vec![ContactRelation {
                    contact_id: "c1".to_string(),
                    side: RelationSide::Outgoing,
                    contact: sample_contact("c2"),
                }])
            });
        mocks
            .projects
            .expect_list_related_projects()
            .withf(|input| input.scope == RecordScope::head("head-1"))
            .return_once(|_| Ok(vec![related("c1", sample_project("p1"))]));
        mocks
            .activities
            .expect_list_related_activities()
            .withf(|input| input.related.scope == RecordScope::head("head-1"))
            .times(2)
            .returning(|input| match input.related.owner_kind {
                EntityKind::Contact => Ok(vec![related("c1", sample_activity("a1"))]),
                _ => Ok(vec![]),
            });
        mocks
            .associations
            .expect_count_associations()
            .returning(|_| Ok(vec![]));

        let details = service(mocks)
            .get_contact(
                &session_with(RoleCapabilities {
                    can_read_all_contact: true,
                    ..Default::default()
                }),
                GetContactRequest {
                    contact_id: "c1".to_string(),
                    include: ContactIncludes {
                        activities: true,
                        projects: true,
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(details.activities.as_ref().unwrap().len(), 1);
        assert_eq!(details.projects.as_ref().unwrap()[0].project.id, "p1");
        assert_eq!(details.outgoing_relations.as_ref().unwrap()[0].id, "c2");
    }
}
