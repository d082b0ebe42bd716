mod config;

use common::auth::{JwtAuthTokenProvider, JwtConfig, RoleAuthorizationService};
use common::postgres::{postgres_repositories, PostgresClient, PostgresConfig};
use common::rpc::{CorsConfig, RpcLoggingConfig, RpcServerConfig, RpcTracingConfig};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use crate::config::ServiceConfig;
use crm_api::crm_api::CrmApi;
use crm_api::domain::{
    ActivityService, CompanyService, ContactService, ProjectService, RecordAccess, SessionService,
};
use crm_api::rpc::CrmApiState;
use crm_runner::Runner;
use goose::MigrationRunner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
        json_logs: config.json_logs,
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        http_port = config.http_port,
        "Starting crm-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let postgres_client = match initialize_postgres(&config.postgres()).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize PostgreSQL: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = build_state(&config, postgres_client);

    let ignored_paths = config.ignored_paths();
    let rpc_config = RpcServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
        logging_config: RpcLoggingConfig::new(ignored_paths.clone()),
        tracing_config: RpcTracingConfig::new(ignored_paths),
        cors_config: Some(CorsConfig::from_comma_separated(
            &config.cors_allowed_origins,
        )),
    };

    let crm_api = CrmApi::new(state, rpc_config);

    Runner::new()
        .with_named_process("crm_api", crm_api.into_runner_process())
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            shutdown_telemetry(telemetry_providers);
            info!("Cleanup complete");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}

async fn initialize_postgres(config: &PostgresConfig) -> anyhow::Result<PostgresClient> {
    info!("Running PostgreSQL migrations...");
    MigrationRunner::postgres(
        config.goose_binary_path.clone(),
        config.migrations_dir.clone(),
        config.dsn(),
    )
    .run_migrations()
    .await?;

    let client = PostgresClient::new(config)?;
    client.ping().await?;
    Ok(client)
}

fn build_state(config: &ServiceConfig, postgres_client: PostgresClient) -> CrmApiState {
    let repositories = postgres_repositories(postgres_client);
    let access = RecordAccess::new(
        repositories.clone(),
        Arc::new(RoleAuthorizationService::new()),
    );

    let mut jwt_config = JwtConfig::new(config.jwt_secret.clone());
    if !config.jwt_issuer.is_empty() {
        jwt_config = jwt_config.with_issuer(config.jwt_issuer.clone());
    }

    CrmApiState {
        contact_service: Arc::new(ContactService::new(repositories.clone(), access.clone())),
        company_service: Arc::new(CompanyService::new(repositories.clone(), access.clone())),
        project_service: Arc::new(ProjectService::new(repositories.clone(), access.clone())),
        activity_service: Arc::new(ActivityService::new(repositories.clone(), access)),
        session_service: Arc::new(SessionService::new(repositories.users.clone())),
        auth_token_provider: Arc::new(JwtAuthTokenProvider::new(jwt_config)),
    }
}
