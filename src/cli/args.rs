use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use plangate::policy::ScanMode;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a rendered terraform plan for security-sensitive resource changes
    Scan(ScanArgs),
    /// Derive the next release version from terraform configuration changes
    Version(VersionArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Path to the terraform plan in JSON format (`terraform show -json`)
    pub plan: PathBuf,

    /// Policy file holding the security resource registry
    #[arg(long, env = "PLANGATE_POLICY")]
    pub policy: Option<PathBuf>,

    /// Security-sensitive resource type to match (repeatable)
    #[arg(long = "security-type", value_name = "TYPE")]
    pub security_types: Vec<String>,

    /// Approval group to require when the scan triggers
    #[arg(long, env = "PLANGATE_APPROVAL_GROUP")]
    pub approval_group: Option<String>,

    /// Stop on the first match or record every match
    #[arg(long, value_enum, default_value_t = ScanModeArg::FailFast)]
    pub mode: ScanModeArg,

    #[arg(long, value_enum, default_value_t = OutputFormatArg::Text)]
    pub format: OutputFormatArg,

    /// CI output file to append `approval_group=<label>` to when triggered
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,

    /// Exit with status 2 when the scan triggers
    #[arg(long)]
    pub fail_on_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanModeArg {
    FailFast,
    Exhaustive,
}

impl From<ScanModeArg> for ScanMode {
    fn from(mode: ScanModeArg) -> Self {
        match mode {
            ScanModeArg::FailFast => ScanMode::FailFast,
            ScanModeArg::Exhaustive => ScanMode::Exhaustive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Table,
    Json,
}

#[derive(clap::Args, Debug)]
pub struct VersionArgs {
    /// Terraform configuration directory, relative to the repository root
    #[arg(long, env = "CONFIG_DIRECTORY", default_value = "terraform")]
    pub config_dir: PathBuf,

    /// Repository root to compare against
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// CI output file to append `new_version=<version>` to
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_args_plan_path() {
        let cli = Cli::parse_from(["plangate", "scan", "tfplan.json"]);

        if let Command::Scan(args) = cli.command {
            assert_eq!(args.plan, PathBuf::from("tfplan.json"));
            assert_eq!(args.mode, ScanModeArg::FailFast);
            assert_eq!(args.format, OutputFormatArg::Text);
            assert!(!args.fail_on_match);
        } else {
            panic!("expected Scan command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_scan_args_repeatable_security_types() {
        let cli = Cli::parse_from([
            "plangate",
            "scan",
            "tfplan.json",
            "--security-type=jamfpro_api_integration",
            "--security-type=jamfpro_disk_encryption_configuration",
        ]);

        if let Command::Scan(args) = cli.command {
            assert_eq!(
                args.security_types,
                vec![
                    "jamfpro_api_integration".to_string(),
                    "jamfpro_disk_encryption_configuration".to_string(),
                ]
            );
        } else {
            panic!("expected Scan command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_scan_args_mode_and_format() {
        let cli = Cli::parse_from([
            "plangate",
            "scan",
            "tfplan.json",
            "--mode=exhaustive",
            "--format=json",
        ]);

        if let Command::Scan(args) = cli.command {
            assert_eq!(args.mode, ScanModeArg::Exhaustive);
            assert_eq!(args.format, OutputFormatArg::Json);
        } else {
            panic!("expected Scan command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_scan_args_missing_plan_is_rejected() {
        let result = Cli::try_parse_from(["plangate", "scan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_mode_arg_conversion() {
        assert_eq!(ScanMode::from(ScanModeArg::FailFast), ScanMode::FailFast);
        assert_eq!(
            ScanMode::from(ScanModeArg::Exhaustive),
            ScanMode::Exhaustive
        );
    }

    #[test]
    fn test_version_args_overrides() {
        let cli = Cli::parse_from([
            "plangate",
            "version",
            "--config-dir=workload/terraform",
            "--repo=/srv/checkout",
        ]);

        if let Command::Version(args) = cli.command {
            assert_eq!(args.config_dir, PathBuf::from("workload/terraform"));
            assert_eq!(args.repo, PathBuf::from("/srv/checkout"));
        } else {
            panic!("expected Version command, got {:?}", cli.command);
        }
    }
}
