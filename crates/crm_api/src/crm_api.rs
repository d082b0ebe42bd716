use crate::rpc::{build_crm_api_router, CrmApiState};
use common::rpc::{run_rpc_server, RpcServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct CrmApi {
    state: CrmApiState,
    config: RpcServerConfig,
}

impl CrmApi {
    pub fn new(state: CrmApiState, config: RpcServerConfig) -> Self {
        debug!("Initializing CRM API module");
        Self { state, config }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| {
            Box::pin(async move {
                run_rpc_server(self.config, build_crm_api_router(self.state), ctx).await
            })
        }
    }
}
