//! Cluster credential resolution.

use std::path::Path;

use anyhow::{Context, anyhow};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

/// Build a cluster client.
///
/// In-cluster service-account credentials win; otherwise the kubeconfig
/// at `kubeconfig` is required.
pub async fn resolve_client(kubeconfig: Option<&Path>) -> anyhow::Result<Client> {
    let config = match Config::incluster() {
        Ok(config) => {
            info!("using in-cluster credentials");
            config
        }
        Err(e) => {
            debug!(error = %e, "in-cluster credentials unavailable");
            let path = kubeconfig.ok_or_else(|| {
                anyhow!("no kubeconfig found! Make sure $KUBECONFIG points to a valid kubeconfig file")
            })?;
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .with_context(|| format!("invalid kubeconfig {}", path.display()))?;
            info!(path = %path.display(), "using kubeconfig credentials");
            config
        }
    };

    Client::try_from(config).context("failed to build cluster client")
}
