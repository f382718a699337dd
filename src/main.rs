//! Binary entry point for the `vpc-eip` CLI.

use std::error::Error as _;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vpc_eip::{
    ConfigError, ElasticIpError, ElasticIpResource, ElasticIpState, EndpointError, IdentityError,
    ProviderClient, ProviderConfig, ReadOutcome, VpcClient, http_client, new_vpc_v1,
};

mod cli;

use cli::{Cli, IdArgs, InputError, ResourceArgs, UpdateArgs, read_resource};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("authentication failed")]
    Identity(#[from] IdentityError),
    #[error("endpoint resolution failed")]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Resource(#[from] ElasticIpError),
    #[error("elastic IP {0} no longer exists")]
    Gone(String),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Create(args) => create(&args).await,
        Cli::Read(args) => read(&args).await,
        Cli::Update(args) => update(&args).await,
        Cli::Delete(args) => delete(&args).await,
        Cli::Import(args) => import(&args).await,
    }
}

async fn create(args: &ResourceArgs) -> Result<(), CliError> {
    let config = read_resource(&args.resource)?;
    let resource = connect(config.region.as_deref()).await?;
    let state = resource.create(&config).await?;
    print_json(&state)
}

async fn read(args: &IdArgs) -> Result<(), CliError> {
    let resource = connect(args.region.as_deref()).await?;
    match resource.read(&args.id).await? {
        ReadOutcome::Found(state) => print_json(&state),
        ReadOutcome::Gone => print_json(&Option::<ElasticIpState>::None),
    }
}

async fn update(args: &UpdateArgs) -> Result<(), CliError> {
    let desired = read_resource(&args.resource)?;
    let resource = connect(desired.region.as_deref()).await?;
    let prior = resource
        .read(&args.id)
        .await?
        .found()
        .ok_or_else(|| CliError::Gone(args.id.clone()))?;
    let state = resource.update(&args.id, &prior, &desired).await?;
    print_json(&state)
}

async fn delete(args: &IdArgs) -> Result<(), CliError> {
    let resource = connect(args.region.as_deref()).await?;
    resource.delete(&args.id).await?;
    Ok(())
}

async fn import(args: &IdArgs) -> Result<(), CliError> {
    let resource = connect(args.region.as_deref()).await?;
    let state = resource.import(&args.id).await?;
    print_json(&state)
}

async fn connect(region: Option<&str>) -> Result<ElasticIpResource<VpcClient>, CliError> {
    let config = ProviderConfig::load_without_cli_args()?;
    let auth = config.auth_options()?;
    let endpoint_opts = config.endpoint_opts(region)?;

    let http = http_client(config.http_timeout())?;
    let provider = ProviderClient::authenticate(http, &auth).await?;
    let service = new_vpc_v1(&provider, &endpoint_opts)?;
    debug!(endpoint = service.endpoint(), "resolved VPC endpoint");

    Ok(ElasticIpResource::new(
        VpcClient::new(service),
        config.timeouts(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(io::stdout(), "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        cause = inner.source();
    }
    writeln!(target, "{rendered}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        write_error(&mut buf, &CliError::Gone(String::from("eip-1")));
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("elastic IP eip-1 no longer exists"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn configuration_errors_keep_their_guidance() {
        let err = CliError::from(ConfigError::MissingField(String::from(
            "missing region: set OS_REGION or add region to vpc-eip.toml",
        )));
        let mut buf = Vec::new();
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(rendered.starts_with("configuration error: missing configuration field:"));
        assert!(rendered.contains("OS_REGION"));
    }

    #[test]
    fn each_cause_is_rendered_once() {
        let err = CliError::from(ElasticIpError::WaitActive {
            id: String::from("eip-1"),
            source: vpc_eip::WaitError::Refresh(vpc_eip::ApiError::Transport {
                message: String::from("connection reset"),
            }),
        });
        let mut buf = Vec::new();
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            rendered.trim_end(),
            "error waiting for elastic IP eip-1 to become active: transport error: connection reset"
        );
        assert_eq!(rendered.matches("connection reset").count(), 1);
    }
}
