use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipstation::config::DEFAULT_CONFIG_PATH;
use shipstation::rate_limit::{REMAINING_HEADER, RESET_HEADER};
use shipstation::{
    publish_template, Endpoint, HttpResponse, RequestOptions, ShipStation, ShipStationConfig,
};

#[derive(Parser)]
#[command(name = "shipstation", version, about = "Call the ShipStation REST API")]
struct Cli {
    /// Config file. Defaults to $SHIPSTATION_CONFIG, then ./shipstation.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config template for first-time setup.
    Publish {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// List the endpoints ShipStation exposes.
    Endpoints,
    Get {
        uri: String,
        /// Query parameter as key=value. Repeatable.
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    Delete {
        uri: String,
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// POST form fields.
    Post {
        uri: String,
        /// Form field as key=value. Repeatable.
        #[arg(short, long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
    },
    /// PUT a JSON document.
    Update { uri: String, body: String },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipstation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Publish { path, force } => {
            let path = path
                .or(cli.config)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
            publish_template(&path, force)?;
            println!("wrote {}", path.display());
            return Ok(());
        }
        Command::Endpoints => {
            for endpoint in Endpoint::iter() {
                println!("{endpoint:<14}{}", endpoint.path());
            }
            return Ok(());
        }
        _ => {}
    }

    let config = ShipStationConfig::load(cli.config.as_deref())?;
    let client = ShipStation::from_config(&config).context("failed to build ShipStation client")?;
    tracing::debug!(base_url = client.base_url(), "client ready");

    run(&client, cli.command)
}

fn run(client: &ShipStation, command: Command) -> anyhow::Result<()> {
    let response = match command {
        Command::Get { uri, query } => client.get(&uri, &options(query))?,
        Command::Delete { uri, query } => client.delete(&uri, &options(query))?,
        Command::Post { uri, fields } => client.post(&uri, &fields)?,
        Command::Update { uri, body } => {
            let body: serde_json::Value =
                serde_json::from_str(&body).context("update body must be JSON")?;
            client.update(&uri, &body)?
        }
        Command::Publish { .. } | Command::Endpoints => return Ok(()),
    };
    print_response(&response);
    Ok(())
}

fn options(query: Vec<(String, String)>) -> RequestOptions {
    RequestOptions {
        query,
        ..RequestOptions::default()
    }
}

fn print_response(response: &HttpResponse) {
    eprintln!("HTTP {}", response.status);
    for name in [REMAINING_HEADER, RESET_HEADER] {
        if let Some(value) = response.header(name) {
            eprintln!("{name}: {value}");
        }
    }
    println!("{}", response.body);
}
