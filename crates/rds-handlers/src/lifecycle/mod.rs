//! # System Lifecycle
//!
//! [`RdsSystem`] starts one [`HandlerService`](reconcile_framework::HandlerService) per resource
//! type and hands out their clients.
//!
//! The services are built without a provisioning client; the shared [`RdsClient`] is injected
//! when each service is started (`run(client)`). Dropping every [`HandlerClient`] closes the
//! services' channels, which is how [`RdsSystem::shutdown`] stops them.
//!
//! ```rust
//! use rds_handlers::clients::InMemoryRds;
//! use rds_handlers::lifecycle::RdsSystem;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let system = RdsSystem::new(Arc::new(InMemoryRds::new()));
//! // system.cluster_client.handle(..).await
//! system.shutdown().await.unwrap();
//! # }
//! ```

use crate::clients::RdsClient;
use crate::model::{CustomDbEngineVersion, DbCluster, DbClusterParameterGroup};
use crate::{cluster, engine_version, parameter_group};
use reconcile_framework::HandlerClient;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct RdsSystem {
    pub parameter_group_client: HandlerClient<DbClusterParameterGroup>,
    pub engine_version_client: HandlerClient<CustomDbEngineVersion>,
    pub cluster_client: HandlerClient<DbCluster>,
    handles: Vec<JoinHandle<()>>,
}

impl RdsSystem {
    /// Spawns the handler services on the current Tokio runtime.
    pub fn new(client: Arc<dyn RdsClient>) -> Self {
        let (parameter_group_service, parameter_group_client) = parameter_group::new();
        let (engine_version_service, engine_version_client) = engine_version::new();
        let (cluster_service, cluster_client) = cluster::new();

        let handles = vec![
            tokio::spawn(parameter_group_service.run(client.clone())),
            tokio::spawn(engine_version_service.run(client.clone())),
            tokio::spawn(cluster_service.run(client)),
        ];
        info!(services = handles.len(), "RDS handler services started");

        Self {
            parameter_group_client,
            engine_version_client,
            cluster_client,
            handles,
        }
    }

    /// Drops the clients and waits for every service to drain its queue.
    pub async fn shutdown(self) -> Result<(), String> {
        let RdsSystem {
            parameter_group_client,
            engine_version_client,
            cluster_client,
            handles,
        } = self;
        drop(parameter_group_client);
        drop(engine_version_client);
        drop(cluster_client);

        let mut failures = 0usize;
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Handler service task failed");
                failures += 1;
            }
        }
        if failures > 0 {
            return Err(format!("{failures} handler service(s) failed during shutdown"));
        }
        info!("RDS handler services stopped");
        Ok(())
    }
}
