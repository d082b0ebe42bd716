#![allow(dead_code)]

use common::auth::{AuthorizationProvider, EntityKind, Operation, RoleAuthorizationService};
use common::domain::{
    CreateCompanyRepoInputWithId, CreateContactRepoInputWithId, CrmRepositories, Head,
    RecordScope, Role, RoleCapabilities, Session,
};
use common::postgres::{postgres_repositories, PostgresClient, PostgresConfig};
use goose::MigrationRunner;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

pub const HEAD_A: &str = "head-a";
pub const HEAD_B: &str = "head-b";

/// Owner of every record created by `create_contact` and `create_company`
pub const OWNER: &str = "user-owner";
/// Member of head A without policy rows
pub const PEER: &str = "user-peer";
/// Member of head B with every capability
pub const OUTSIDER: &str = "user-outsider";

pub struct TestDb {
    _container: ContainerAsync<Postgres>,
    pub client: PostgresClient,
    pub repositories: CrmRepositories,
}

pub async fn setup_test_db() -> TestDb {
    let container = Postgres::default()
        .with_tag("16-alpine")
        .start()
        .await
        .unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();

    let config = PostgresConfig {
        host: host.to_string(),
        port,
        database: "postgres".to_string(),
        username: "postgres".to_string(),
        password: "postgres".to_string(),
        max_pool_size: 5,
        migrations_dir: format!(
            "{}/../crm_all_in_one/migrations/postgres",
            env!("CARGO_MANIFEST_DIR")
        ),
        goose_binary_path: which::which("goose")
            .expect("goose binary not found")
            .to_string_lossy()
            .to_string(),
    };

    MigrationRunner::postgres(
        config.goose_binary_path.clone(),
        config.migrations_dir.clone(),
        config.dsn(),
    )
    .run_migrations()
    .await
    .expect("Migrations failed");

    let client = PostgresClient::new(&config).expect("Failed to create client");
    seed_heads_and_users(&client).await;

    TestDb {
        _container: container,
        repositories: postgres_repositories(client.clone()),
        client,
    }
}

async fn seed_heads_and_users(client: &PostgresClient) {
    let conn = client.get_connection().await.unwrap();
    conn.batch_execute(
        "INSERT INTO heads (id, name) VALUES ('head-a', 'Acme'), ('head-b', 'Globex');

         INSERT INTO roles (id, head_id, name) VALUES ('role-a', 'head-a', 'member');
         INSERT INTO roles (id, head_id, name,
                            can_create_contact, can_read_all_contact, can_edit_all_contact, can_delete_all_contact,
                            can_create_company, can_read_all_company, can_edit_all_company, can_delete_all_company)
         VALUES ('role-b', 'head-b', 'admin', TRUE, TRUE, TRUE, TRUE, TRUE, TRUE, TRUE, TRUE);

         INSERT INTO users (id, head_id, role_id, email, name) VALUES
             ('user-owner', 'head-a', 'role-a', 'owner@acme.test', 'Owner'),
             ('user-peer', 'head-a', 'role-a', 'peer@acme.test', 'Peer'),
             ('user-outsider', 'head-b', 'role-b', 'admin@globex.test', 'Outsider');",
    )
    .await
    .unwrap();
}

pub fn session(user_id: &str, head_id: &str, capabilities: RoleCapabilities) -> Session {
    Session {
        user_id: user_id.to_string(),
        email: format!("{}@test", user_id),
        name: user_id.to_string(),
        head: Head {
            id: head_id.to_string(),
            name: head_id.to_string(),
        },
        role: Role {
            id: format!("role-{}", head_id),
            name: "test".to_string(),
            capabilities,
        },
    }
}

pub fn all_capabilities() -> RoleCapabilities {
    RoleCapabilities {
        can_create_contact: true,
        can_read_all_contact: true,
        can_edit_all_contact: true,
        can_delete_all_contact: true,
        can_create_company: true,
        can_read_all_company: true,
        can_edit_all_company: true,
        can_delete_all_company: true,
        can_create_project: true,
        can_read_all_project: true,
        can_edit_all_project: true,
        can_delete_all_project: true,
        can_create_activity: true,
        can_read_all_activity: true,
        can_edit_all_activity: true,
        can_delete_all_activity: true,
        can_delete_connected_activity: true,
    }
}

pub fn scope(session: &Session, entity: EntityKind, operation: Operation) -> RecordScope {
    RoleAuthorizationService::new().scope(session, entity, operation)
}

pub fn contact_input(id: &str, head_id: &str, created_by: &str) -> CreateContactRepoInputWithId {
    CreateContactRepoInputWithId {
        id: id.to_string(),
        head_id: head_id.to_string(),
        created_by: created_by.to_string(),
        name: format!("Contact {}", id),
        email: Some(format!("{}@example.com", id)),
        info: None,
        mobile: None,
        company_ids: vec![],
    }
}

pub fn company_input(id: &str, head_id: &str, created_by: &str) -> CreateCompanyRepoInputWithId {
    CreateCompanyRepoInputWithId {
        id: id.to_string(),
        head_id: head_id.to_string(),
        created_by: created_by.to_string(),
        name: format!("Company {}", id),
        info: None,
    }
}
