//! cfn-changesets CLI entrypoint.
//!
//! This is the main entrypoint for the cfn-changesets command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cfn_changesets::cli::{Cli, Commands, InvocationArgs, OutputFormatter};
use cfn_changesets::config::{
    find_config_file, ConfigParser, ConfigValidator, OptionsRecord, OptionsResolver,
    ServiceConfig, ServiceContext,
};
use cfn_changesets::controller::ChangeSetController;
use cfn_changesets::error::{ChangeSetsError, ConfigError, Result};
use cfn_changesets::gate::DeploymentTarget;
use cfn_changesets::transport::AwsCloudFormationTransport;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Deploy { invocation } => {
            cmd_deploy(cli.config.as_ref(), &invocation, &formatter).await
        }
        Commands::Plan { invocation } => cmd_plan(cli.config.as_ref(), &invocation, &formatter),
        Commands::Hooks { invocation } => cmd_hooks(cli.config.as_ref(), &invocation, &formatter),
    }
}

/// Everything a command needs after loading the service file.
struct Prepared {
    options: OptionsRecord,
    config: ServiceConfig,
}

/// Create the change set.
async fn cmd_deploy(
    config_path: Option<&PathBuf>,
    invocation: &InvocationArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let Prepared { options, config } = prepare(config_path, invocation)?;

    if !options.require_change_set {
        eprintln!("Change sets are not required; no lifecycle hooks registered.");
        return Ok(());
    }

    let service = service_context(&config, &options, invocation)?;
    info!(
        "Deploying {} to stage {} in {}",
        service.service_name, options.stage, options.region
    );

    let transport = AwsCloudFormationTransport::from_env().await;
    let mut controller = ChangeSetController::new(options, service, transport);

    // The direct-apply path is enabled until the gate says otherwise.
    let mut target = DeploymentTarget::new(false);
    if let Some(outcome) = controller.run_gated(&mut target).await? {
        print!("{}", formatter.format_outcome(&outcome));
    }

    Ok(())
}

/// Show the request that would be submitted.
fn cmd_plan(
    config_path: Option<&PathBuf>,
    invocation: &InvocationArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let Prepared { options, config } = prepare(config_path, invocation)?;
    let service = service_context(&config, &options, invocation)?;

    let controller = ChangeSetController::new(options, service, NoTransport);
    let request = controller.preview()?;
    print!("{}", formatter.format_request(&request));

    Ok(())
}

/// List the lifecycle hooks.
fn cmd_hooks(
    config_path: Option<&PathBuf>,
    invocation: &InvocationArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let Prepared { options, config } = prepare(config_path, invocation)?;

    // Hook registration only depends on the options.
    let controller = ChangeSetController::new(options, config.context(String::new()), NoTransport);
    print!("{}", formatter.format_hooks(controller.hooks()));

    Ok(())
}

/// Loads, resolves and validates the service configuration.
fn prepare(config_path: Option<&PathBuf>, invocation: &InvocationArgs) -> Result<Prepared> {
    let config_file = resolve_config_path(config_path)?;

    // Load .env
    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;

    let config = parser.load_with_env(&config_file)?;
    let options = OptionsResolver::for_service(&config).resolve(&invocation.invocation_options());

    let result = ConfigValidator::new().validate(&config, &options)?;
    for warning in &result.warnings {
        eprintln!("Warning: {warning}");
    }

    Ok(Prepared { options, config })
}

/// Builds the request-time service context from the flags.
fn service_context(
    config: &ServiceConfig,
    options: &OptionsRecord,
    invocation: &InvocationArgs,
) -> Result<ServiceContext> {
    let mut service = config.context(invocation.artifact_directory()?);

    if let Some(bucket) = &invocation.bucket {
        service = service.with_deployment_bucket(bucket.as_str());
    }

    if let Some(path) = &invocation.template {
        if !options.reuse_parameters {
            warn!("--template is ignored unless parameter reuse is enabled (--reuse-parameters)");
        }
        debug!("Reading compiled template: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let template: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            ChangeSetsError::Config(ConfigError::ParseError {
                message: format!("Invalid compiled template: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;
        service = service.with_template(&template);
    } else if options.reuse_parameters {
        warn!("Parameter reuse is enabled but no --template was given; no parameters will be reused");
    }

    Ok(service)
}

/// Resolve the service file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(
        || {
            let cwd = std::env::current_dir()?;
            find_config_file(&cwd)
        },
        |path| Ok(path.clone()),
    )
}

/// Transport for commands that never reach the control-plane.
struct NoTransport;

#[async_trait::async_trait]
impl cfn_changesets::transport::ProviderTransport for NoTransport {
    async fn request(
        &self,
        service: &str,
        operation: &str,
        _payload: serde_json::Value,
        _stage: &str,
        _region: &str,
    ) -> std::result::Result<serde_json::Value, cfn_changesets::error::ControlPlaneError> {
        Err(cfn_changesets::error::ControlPlaneError::new(format!(
            "{service}.{operation} is not available offline"
        )))
    }
}
