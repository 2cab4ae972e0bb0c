use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use reqwest::{blocking::Client, header};
use serde::{Deserialize, Serialize};
use std::{env, fs::File, io::Read, path::PathBuf};

/// Gateway admin CLI
#[derive(Parser)]
#[command(name = "gwrs")]
#[command(about = "CLI tool for managing the gateway's routes, upstreams, and users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use credentials from OS environment variables (GWRS_USER, GWRS_PASS)
    #[arg(long, global = true)]
    osenv: bool,

    /// Username for API authentication
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Password for API authentication
    #[arg(short, long, global = true)]
    pass: Option<String>,

    /// Admin API base URL
    #[arg(long, global = true, default_value = "http://localhost:30099")]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage dispatchable routes
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },
    /// Manage upstream backends
    Upstream {
        #[command(subcommand)]
        action: UpstreamAction,
    },
}

#[derive(Subcommand)]
enum RouteAction {
    /// List all routes
    List,
    /// Fetch a single route by slug
    Get { slug: String },
    /// Create or replace a route from a JSON file
    Save {
        #[arg(long, required = true)]
        file: PathBuf,
    },
    /// Delete a route by slug
    Delete { slug: String },
}

#[derive(Subcommand)]
enum UpstreamAction {
    /// List all upstreams
    List,
    /// Fetch a single upstream by id
    Get { id: String },
    /// Create or replace an upstream from a JSON file
    Save {
        #[arg(long, required = true)]
        file: PathBuf,
    },
    /// Delete an upstream by id
    Delete { id: String },
}

#[derive(Serialize, Deserialize, Debug)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct LoginResponse {
    token: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let (username, password) = get_credentials(&cli)?;
    debug!("Using API URL: {}", cli.api_url);
    debug!("Using username: {}", username);

    let client = Client::new();
    let token = authenticate(&client, &cli.api_url, &username, &password)?;
    debug!("Authentication successful, token received");

    match &cli.command {
        Commands::Route { action } => dispatch_route(&client, &cli.api_url, &token, action)?,
        Commands::Upstream { action } => dispatch_upstream(&client, &cli.api_url, &token, action)?,
    }

    Ok(())
}

fn get_credentials(cli: &Cli) -> Result<(String, String)> {
    if cli.osenv {
        debug!("Getting credentials from environment variables");
        let username = env::var("GWRS_USER").context("GWRS_USER environment variable not set")?;
        let password = env::var("GWRS_PASS").context("GWRS_PASS environment variable not set")?;
        Ok((username, password))
    } else if let (Some(user), Some(pass)) = (&cli.user, &cli.pass) {
        debug!("Using credentials from command line arguments");
        Ok((user.clone(), pass.clone()))
    } else {
        error!("No credentials provided. Use --osenv or provide --user and --pass");
        anyhow::bail!("No credentials provided. Use --osenv or provide --user and --pass");
    }
}

fn authenticate(client: &Client, base_url: &str, username: &str, password: &str) -> Result<String> {
    info!("Authenticating with username: {}", username);

    let login_url = format!("{}/api/v1/users/login", base_url);
    let login_request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };

    let response = client
        .post(&login_url)
        .json(&login_request)
        .send()
        .context("Failed to send login request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        anyhow::bail!("Authentication failed with status {}: {}", status, body);
    }

    let login_response = response.json::<LoginResponse>().context("Failed to parse login response")?;
    Ok(login_response.token)
}

fn auth_headers(token: &str) -> Result<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))?,
    );
    Ok(headers)
}

fn read_json_file(path: &PathBuf) -> Result<serde_json::Value> {
    let mut file = File::open(path).context("Failed to open request file")?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).context("Failed to read request file")?;
    serde_json::from_str(&contents).context("Request file is not valid JSON")
}

fn print_response(label: &str, response: reqwest::blocking::Response) -> Result<()> {
    let status = response.status();
    let body: serde_json::Value = response.json().unwrap_or(serde_json::Value::Null);
    if !status.is_success() {
        error!("{} failed with status {}: {}", label, status, body);
        anyhow::bail!("{} failed with status {}: {}", label, status, body);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn dispatch_route(client: &Client, base_url: &str, token: &str, action: &RouteAction) -> Result<()> {
    let headers = auth_headers(token)?;
    match action {
        RouteAction::List => {
            let resp = client.get(format!("{}/api/v1/routes", base_url)).headers(headers).send()?;
            print_response("List routes", resp)
        }
        RouteAction::Get { slug } => {
            let resp = client
                .get(format!("{}/api/v1/routes/{}", base_url, slug))
                .headers(headers)
                .send()?;
            print_response("Get route", resp)
        }
        RouteAction::Save { file } => {
            let body = read_json_file(file)?;
            let resp = client
                .post(format!("{}/api/v1/routes", base_url))
                .headers(headers)
                .json(&body)
                .send()?;
            print_response("Save route", resp)
        }
        RouteAction::Delete { slug } => {
            let resp = client
                .delete(format!("{}/api/v1/routes/{}", base_url, slug))
                .headers(headers)
                .send()?;
            print_response("Delete route", resp)
        }
    }
}

fn dispatch_upstream(client: &Client, base_url: &str, token: &str, action: &UpstreamAction) -> Result<()> {
    let headers = auth_headers(token)?;
    match action {
        UpstreamAction::List => {
            let resp = client.get(format!("{}/api/v1/upstreams", base_url)).headers(headers).send()?;
            print_response("List upstreams", resp)
        }
        UpstreamAction::Get { id } => {
            let resp = client
                .get(format!("{}/api/v1/upstreams/{}", base_url, id))
                .headers(headers)
                .send()?;
            print_response("Get upstream", resp)
        }
        UpstreamAction::Save { file } => {
            let body = read_json_file(file)?;
            let resp = client
                .post(format!("{}/api/v1/upstreams", base_url))
                .headers(headers)
                .json(&body)
                .send()?;
            print_response("Save upstream", resp)
        }
        UpstreamAction::Delete { id } => {
            let resp = client
                .delete(format!("{}/api/v1/upstreams/{}", base_url, id))
                .headers(headers)
                .send()?;
            print_response("Delete upstream", resp)
        }
    }
}
