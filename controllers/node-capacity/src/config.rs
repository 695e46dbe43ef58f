//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or an environment variable; flags win.

use crate::error::ControllerError;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Node Capacity Controller - advertises a per-group capacity resource on nodes
#[derive(Parser, Debug, Clone)]
#[command(name = "node-capacity-controller", version, about, long_about = None)]
pub struct Cli {
    /// Kubeconfig path (in-cluster or default kubeconfig when unset)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Resource name
    #[arg(long, env = "RESOURCE_NAME", default_value = "pxfd.tech/pod-count")]
    pub resource_name: String,

    /// Absolute path to config file
    #[arg(
        long,
        env = "CONFIG_FILE_PATH",
        default_value = "/etc/pod-as-resource/config.yaml"
    )]
    pub config_file_path: PathBuf,

    /// Dry run mode - no action taken
    #[arg(short = 'd', long, env = "DRYRUN")]
    pub dry_run: bool,

    /// Label to determine node asg
    #[arg(short = 'l', long, env = "LABEL_ASG", default_value = "kops.k8s.io/instancegroup")]
    pub label_asg: String,

    /// Address for binding metrics listener
    #[arg(short = 'b', long, env = "METRICS_BIND_ADDRESS", default_value = ":9898")]
    pub metrics_bind_address: String,

    /// Override already patched nodes when starting
    #[arg(short = 'f', long, env = "FORCE")]
    pub force: bool,

    /// Maximum number of nodes reconciled at the same time
    #[arg(long, env = "MAX_CONCURRENT_RECONCILES", default_value_t = 8)]
    pub max_concurrent_reconciles: usize,
}

/// Validated, immutable controller settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub kubeconfig: Option<PathBuf>,
    pub resource_name: String,
    pub config_file_path: PathBuf,
    pub dry_run: bool,
    pub group_label_key: String,
    pub metrics_bind_address: SocketAddr,
    pub force: bool,
    pub max_concurrent_reconciles: usize,
}

impl TryFrom<Cli> for ControllerConfig {
    type Error = ControllerError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.resource_name.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "resource name must not be empty".to_string(),
            ));
        }
        if cli.label_asg.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "group label key must not be empty".to_string(),
            ));
        }
        if cli.max_concurrent_reconciles == 0 {
            return Err(ControllerError::InvalidConfig(
                "max concurrent reconciles must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            kubeconfig: cli.kubeconfig,
            resource_name: cli.resource_name,
            config_file_path: cli.config_file_path,
            dry_run: cli.dry_run,
            group_label_key: cli.label_asg,
            metrics_bind_address: parse_bind_address(&cli.metrics_bind_address)?,
            force: cli.force,
            max_concurrent_reconciles: cli.max_concurrent_reconciles,
        })
    }
}

/// Parses a listen address; `:PORT` binds every interface.
pub fn parse_bind_address(addr: &str) -> Result<SocketAddr, ControllerError> {
    let addr = addr.trim();
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    full.parse().map_err(|e| {
        ControllerError::InvalidConfig(format!("invalid metrics bind address {addr:?}: {e}"))
    })
}
