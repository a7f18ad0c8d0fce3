//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use clap::error::ErrorKind;

use pgwake_core::{ClassifierConfig, ConfigResult, TargetTemplate};
use pgwake_reconcile::WatchScope;

#[derive(Debug, Parser)]
#[command(
    name = "pgwaked",
    about = "Scales database workloads up and down on KEDA activation events"
)]
pub struct Cli {
    /// Namespaces to watch, comma-separated.
    #[arg(long, env = "TARGET_NAMESPACES", value_delimiter = ',')]
    pub namespaces: Vec<String>,

    /// Watch events in every namespace instead of a fixed list.
    #[arg(long, env = "WATCH_ALL_NAMESPACES", value_parser = BoolishValueParser::new())]
    pub all_namespaces: bool,

    /// Application names to react to, comma-separated. Empty means all.
    #[arg(long, env = "WATCHED_APPS", value_delimiter = ',')]
    pub apps: Vec<String>,

    /// Dependent resources to scale, as `<kind>:<pattern>` with `{base}`.
    #[arg(
        long,
        env = "SCALE_TARGETS",
        value_delimiter = ',',
        default_value = "statefulset:{base}-postgresql"
    )]
    pub targets: Vec<TargetTemplate>,

    /// Suffix stripped from the scaled object's name to get the base name.
    #[arg(long, env = "APP_SUFFIX", default_value = "-core", allow_hyphen_values = true)]
    pub strip_suffix: String,

    /// Source component whose events are trusted.
    #[arg(long, env = "SIGNAL_SOURCE", default_value = "keda-operator")]
    pub source_component: String,

    /// Port for the /health and /ready endpoints.
    #[arg(long, env = "HEALTH_PORT", default_value = "8080")]
    pub health_port: u16,

    /// Timeout for a single patch call, in seconds.
    #[arg(long, env = "PATCH_TIMEOUT_SECS", default_value = "10")]
    pub patch_timeout_secs: u64,

    /// How long to wait for the initial event listing, in seconds.
    #[arg(long, env = "SYNC_TIMEOUT_SECS", default_value = "120")]
    pub sync_timeout_secs: u64,

    /// Kubeconfig used when not running inside the cluster.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, env = "LOG_JSON", value_parser = BoolishValueParser::new())]
    pub log_json: bool,
}

impl Cli {
    /// Watched scopes, validated.
    pub fn scopes(&self) -> ConfigResult<Vec<WatchScope>> {
        WatchScope::from_config(&self.namespaces, self.all_namespaces)
    }

    /// Classifier settings; blank allow-list entries are dropped.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            source_component: self.source_component.clone(),
            strip_suffix: self.strip_suffix.clone(),
            watched_apps: self
                .apps
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            targets: self.targets.clone(),
            ..Default::default()
        }
    }

    pub fn patch_timeout(&self) -> Duration {
        Duration::from_secs(self.patch_timeout_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }
}

/// One-line message for a parse failure, or `None` for help/version
/// output that clap should print and exit on as usual.
pub fn parse_failure(err: &clap::Error) -> Option<String> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            let rendered = err.to_string();
            let line = rendered
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("invalid configuration");
            Some(line.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgwake_core::ResourceKind;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["pgwaked"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_keda_convention() {
        let cli = parse(&["--namespaces", "ns1"]);
        let config = cli.classifier_config();

        assert_eq!(config, ClassifierConfig::default());
        assert_eq!(cli.health_port, 8080);
        assert_eq!(cli.patch_timeout(), Duration::from_secs(10));
        assert_eq!(cli.sync_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn comma_separated_namespaces_become_scopes() {
        let cli = parse(&["--namespaces", "ns1,ns2"]);
        assert_eq!(
            cli.scopes().unwrap(),
            [
                WatchScope::Namespace("ns1".to_string()),
                WatchScope::Namespace("ns2".to_string()),
            ]
        );
    }

    #[test]
    fn all_namespaces_flag() {
        let cli = parse(&["--all-namespaces"]);
        assert_eq!(cli.scopes().unwrap(), [WatchScope::AllNamespaces]);
    }

    #[test]
    fn multiple_targets_and_suffix() {
        let cli = parse(&[
            "--namespaces",
            "ns1",
            "--targets",
            "{base}-database-postgresql,deployment:{base}-minio",
            "--strip-suffix",
            "-api",
            "--apps",
            "shop-api, ,billing-api",
        ]);
        let config = cli.classifier_config();

        assert_eq!(config.strip_suffix, "-api");
        assert_eq!(config.watched_apps, ["shop-api", "billing-api"]);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].render("shop"), "shop-database-postgresql");
        assert_eq!(config.targets[1].kind, ResourceKind::Deployment);
    }

    #[test]
    fn invalid_target_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["pgwaked", "--namespaces", "ns1", "--targets", "postgresql"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_failure_is_a_single_line() {
        let err = Cli::try_parse_from(["pgwaked", "--namespaces", "ns1", "--targets", "postgresql"])
            .unwrap_err();
        let line = parse_failure(&err).expect("invalid target should be reported");

        assert!(!line.contains('\n'));
        assert!(line.starts_with("error:"), "got {line:?}");
        assert!(line.contains("postgresql"), "got {line:?}");
    }

    #[test]
    fn bad_port_is_a_single_line() {
        let err = Cli::try_parse_from(["pgwaked", "--namespaces", "ns1", "--health-port", "http"])
            .unwrap_err();
        let line = parse_failure(&err).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("http"), "got {line:?}");
    }

    #[test]
    fn help_is_left_to_clap() {
        let err = Cli::try_parse_from(["pgwaked", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(parse_failure(&err).is_none());
    }
}
