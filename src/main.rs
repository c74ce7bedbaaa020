use std::{fs::File, io::Write, path::Path, process::ExitCode};

use portainer_to_k8s::{
    Error, Result,
    cli::{
        CliArgs, CliCommands, ConfigCommands, ConfigSaveArgs, ContainersCommands, ConvertArgs,
        EndpointsCommands, GenerateArgs, ManifestArgs, PortainerArgs, parse,
    },
    config::Config,
    docker, manifest,
    portainer::Client,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = &parse();

    let result = match &cli.command {
        CliCommands::Config(config) => match &config.command {
            ConfigCommands::Delete => config_delete(cli),
            ConfigCommands::Save(save) => config_save(cli, save),
            ConfigCommands::Show => config_show(cli),
        },
        CliCommands::Containers(containers) => match &containers.command {
            ContainersCommands::List(list) => containers_list(cli, &list.portainer).await,
        },
        CliCommands::Convert(convert) => convert_file(convert),
        CliCommands::Endpoints(endpoints) => match &endpoints.command {
            EndpointsCommands::List(list) => endpoints_list(cli, &list.portainer).await,
        },
        CliCommands::Generate(generate) => generate_manifest(cli, generate).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

/*
 * ============================================================================
 * Config
 * ============================================================================
 */
fn config_delete(cli: &CliArgs) -> Result<()> {
    if !Config::delete(&cli.config)? {
        eprintln!("no configuration at {}", cli.config.display());
    }

    Ok(())
}

fn config_save(cli: &CliArgs, save: &ConfigSaveArgs) -> Result<()> {
    let existing = load_config(&cli.config).unwrap_or_default().portainer;
    let portainer = &save.portainer;

    let url = portainer
        .url
        .clone()
        .or(existing.url)
        .ok_or(Error::MissingSetting("url"))?;
    let endpoint_id = portainer
        .endpoint
        .or(existing.endpoint_id)
        .ok_or(Error::MissingSetting("endpoint"))?;

    let (api_key, username) = if portainer.api_key.is_some() || portainer.username.is_some() {
        (portainer.api_key.clone(), portainer.username.clone())
    } else {
        (existing.auth.api_key, existing.auth.username)
    };

    Config::new(url, endpoint_id, api_key, username).save(&cli.config)
}

fn config_show(cli: &CliArgs) -> Result<()> {
    match Config::load(&cli.config)? {
        Some(config) => print!("{}", serde_yaml::to_string(&config).map_err(Error::Yaml)?),
        None => eprintln!("no configuration at {}", cli.config.display()),
    }

    Ok(())
}

/// An unreadable configuration file is reported and ignored.
fn load_config(path: &Path) -> Option<Config> {
    Config::load(path).unwrap_or_else(|error| {
        tracing::warn!(error = %error, "ignoring configuration file");
        None
    })
}

/*
 * ============================================================================
 * Portainer
 * ============================================================================
 */
async fn connect(cli: &CliArgs, portainer: &PortainerArgs) -> Result<Client> {
    let config = load_config(&cli.config);
    let connection = portainer.connection(config.as_ref())?;

    Client::connect(&connection.url, connection.endpoint_id, connection.auth).await
}

async fn containers_list(cli: &CliArgs, portainer: &PortainerArgs) -> Result<()> {
    let client = connect(cli, portainer).await?;

    for container in client.containers().await? {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            container.id.get(..12).unwrap_or(&container.id),
            container.names().collect::<Vec<_>>().join(","),
            container.image,
            container.state,
            container.status
        );
    }

    Ok(())
}

async fn endpoints_list(cli: &CliArgs, portainer: &PortainerArgs) -> Result<()> {
    let client = connect(cli, portainer).await?;

    for endpoint in client.endpoints().await? {
        println!("{}\t{}", endpoint.id, endpoint.name);
    }

    Ok(())
}

/*
 * ============================================================================
 * Manifest
 * ============================================================================
 */
fn convert_file(convert: &ConvertArgs) -> Result<()> {
    let input = std::fs::read_to_string(&convert.file)
        .map_err(|error| Error::Io(convert.file.clone(), error))?;
    let inspection = docker::from_json(&input)?;

    write_manifest(
        &manifest::build(&inspection, &convert.manifest.namespace),
        &convert.manifest,
    )
}

async fn generate_manifest(cli: &CliArgs, generate: &GenerateArgs) -> Result<()> {
    let client = connect(cli, &generate.portainer).await?;

    let container_id = client.resolve_container_id(&generate.container).await?;
    let inspection = client.container_details(&container_id).await?;

    write_manifest(
        &manifest::build(&inspection, &generate.manifest.namespace),
        &generate.manifest,
    )
}

fn write_manifest(manifest: &manifest::Manifest, args: &ManifestArgs) -> Result<()> {
    let content = manifest.to_yaml()?;

    if let Some(output) = &args.output {
        File::create(output)
            .and_then(|mut file| file.write_all(content.as_bytes()))
            .map_err(|error| Error::Io(output.clone(), error))?;

        tracing::info!(path = %output.display(), documents = manifest.len(), "manifest written");
    } else {
        print!("{content}");
    }

    Ok(())
}
