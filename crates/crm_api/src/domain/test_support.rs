use chrono::{TimeZone, Utc};
use common::domain::{
    Activity, ActivityType, Company, Contact, CrmRepositories, Head, MockActivityRepository,
    MockAssociationRepository, MockCompanyRepository, MockContactRelationRepository,
    MockContactRepository, MockPolicyRepository, MockProjectRepository, MockUserRepository,
    Project, ProjectStatus, Role, RoleCapabilities, Session,
};
use std::sync::Arc;

pub(crate) struct MockRepositories {
    pub contacts: MockContactRepository,
    pub companies: MockCompanyRepository,
    pub projects: MockProjectRepository,
    pub activities: MockActivityRepository,
    pub policies: MockPolicyRepository,
    pub associations: MockAssociationRepository,
    pub relations: MockContactRelationRepository,
    pub users: MockUserRepository,
}

impl MockRepositories {
    pub fn new() -> Self {
        Self {
            contacts: MockContactRepository::new(),
            companies: MockCompanyRepository::new(),
            projects: MockProjectRepository::new(),
            activities: MockActivityRepository::new(),
            policies: MockPolicyRepository::new(),
            associations: MockAssociationRepository::new(),
            relations: MockContactRelationRepository::new(),
            users: MockUserRepository::new(),
        }
    }

    pub fn into_repositories(self) -> CrmRepositories {
        CrmRepositories {
            contacts: Arc::new(self.contacts),
            companies: Arc::new(self.companies),
            projects: Arc::new(self.projects),
            activities: Arc::new(self.activities),
            policies: Arc::new(self.policies),
            associations: Arc::new(self.associations),
            relations: Arc::new(self.relations),
            users: Arc::new(self.users),
        }
    }
}

pub(crate) fn session_with(capabilities: RoleCapabilities) -> Session {
    Session {
        user_id: "user-1".to_string(),
        email: "user@example.com".to_string(),
        name: "Test User".to_string(),
        head: Head {
            id: "head-1".to_string(),
            name: "Acme".to_string(),
        },
        role: Role {
            id: "role-1".to_string(),
            name: "member".to_string(),
            capabilities,
        },
    }
}

pub(crate) fn sample_contact(id: &str) -> Contact {
    Contact {
        id: id.to_string(),
        head_id: "head-1".to_string(),
        user_id: None,
        name: format!("Contact {}", id),
        email: None,
        info: None,
        mobile: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

pub(crate) fn sample_company(id: &str) -> Company {
    Company {
        id: id.to_string(),
        head_id: "head-1".to_string(),
        name: format!("Company {}", id),
        info: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

pub(crate) fn sample_project(id: &str) -> Project {
    Project {
        id: id.to_string(),
        head_id: "head-1".to_string(),
        name: format!("Project {}", id),
        info: None,
        status: ProjectStatus::Planned,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

pub(crate) fn sample_activity(id: &str) -> Activity {
    Activity {
        id: id.to_string(),
        head_id: "head-1".to_string(),
        description: Some("Intro call".to_string()),
        activity_type: ActivityType::Call,
        date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}
