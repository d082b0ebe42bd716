use std::sync::Arc;

use crate::domain::CrmRepositories;
use crate::postgres::{
    PostgresActivityRepository, PostgresAssociationRepository, PostgresClient,
    PostgresCompanyRepository, PostgresContactRelationRepository, PostgresContactRepository,
    PostgresPolicyRepository, PostgresProjectRepository, PostgresUserRepository,
};

/// Build every repository over one connection pool
pub fn postgres_repositories(client: PostgresClient) -> CrmRepositories {
    CrmRepositories {
        contacts: Arc::new(PostgresContactRepository::new(client.clone())),
        companies: Arc::new(PostgresCompanyRepository::new(client.clone())),
        projects: Arc::new(PostgresProjectRepository::new(client.clone())),
        activities: Arc::new(PostgresActivityRepository::new(client.clone())),
        policies: Arc::new(PostgresPolicyRepository::new(client.clone())),
        associations: Arc::new(PostgresAssociationRepository::new(client.clone())),
        relations: Arc::new(PostgresContactRelationRepository::new(client.clone())),
        users: Arc::new(PostgresUserRepository::new(client)),
    }
}
