mod cli;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, OutputFormatArg, ScanArgs, VersionArgs};
use plangate::plan::Plan;
use plangate::{PlangateError, config, output, version};

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan(args) => run_scan(args)?,
        Command::Version(args) => run_version(args)?,
    }

    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<(), PlangateError> {
    if args.plan.as_os_str().is_empty() {
        return Err(PlangateError::Usage(
            "plan file path must not be empty".to_string(),
        ));
    }

    let policy = config::resolve_policy(
        args.policy.as_deref(),
        &args.security_types,
        args.approval_group.as_deref(),
    )?;

    let plan = Plan::from_path(&args.plan)?;
    tracing::info!(changes = plan.resource_changes.len(), "plan loaded");

    let verdict = policy.scan(&plan, args.mode.into());
    tracing::info!(
        triggered = verdict.triggered(),
        findings = verdict.findings.len(),
        "scan complete"
    );

    match args.format {
        OutputFormatArg::Text => {
            print!("{}", output::render_text(&verdict, policy.approval_group()));
        }
        OutputFormatArg::Table => {
            print!(
                "{}",
                output::render_table(&verdict, policy.approval_group())
            );
        }
        OutputFormatArg::Json => {
            let rendered = output::render_json(&verdict, policy.approval_group())
                .map_err(PlangateError::Encode)?;
            println!("{}", rendered);
        }
    }

    if verdict.triggered() {
        if let Some(path) = &args.github_output {
            output::append_key_value(path, "approval_group", policy.approval_group())?;
            tracing::info!(path = %path.display(), "approval group recorded");
        }
        if args.fail_on_match {
            std::process::exit(2);
        }
    }

    Ok(())
}

fn run_version(args: VersionArgs) -> Result<(), PlangateError> {
    let bump = version::next_version(&args.repo, &args.config_dir)?;
    println!("{}", bump.version);

    if let Some(path) = &args.github_output {
        output::append_key_value(path, "new_version", &bump.version)?;
        tracing::info!(path = %path.display(), "new version recorded");
    }

    Ok(())
}
