use crate::client::{ClientError, QuoteClient};
use crate::config::{self, Config, ConfigError};
use crate::rate_limit::{FileStore, RateLimiter};
use crate::{cli, output, tools};
use clap::ArgMatches;
use log::{debug, error, info};
use serde_json::Value;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn load_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let mut cfg = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(path) = matches.get_one::<PathBuf>("rate-limit-file") {
        cfg.rate_limit_file = path.clone();
    }
    debug!(
        "api_url={} rate_limit_file={}",
        cfg.api_url,
        cfg.rate_limit_file.display()
    );
    Ok(cfg)
}

// The config never loaded, so the quota is read from wherever it would
// have pointed without a config file.
fn config_failure(matches: &ArgMatches, err: ConfigError) -> ClientError {
    error!("{}", err);
    let path = matches
        .get_one::<PathBuf>("rate-limit-file")
        .cloned()
        .unwrap_or_else(|| config::fallback_rate_limit_file(&|k| env::var(k).ok()));
    ClientError::Config {
        message: err.to_string(),
        rate_limit: RateLimiter::new(FileStore::new(path)).current_status(),
    }
}

fn write_document(doc: &Value) -> anyhow::Result<()> {
    let mut out = io::stdout();
    let payload = serde_json::to_string_pretty(doc)?;
    writeln!(out, "{}", payload)?;
    out.flush()?;
    Ok(())
}

fn write_failure(err: &ClientError) -> anyhow::Result<ExitCode> {
    write_document(&output::failure(err))?;
    Ok(ExitCode::FAILURE)
}

pub async fn run(matches: ArgMatches) -> anyhow::Result<ExitCode> {
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(ExitCode::FAILURE);
    };

    if name == "list-tools" {
        write_document(&serde_json::json!({ "tools": tools::tool_descriptors() }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = match load_config(&matches) {
        Ok(cfg) => cfg,
        Err(e) => return write_failure(&config_failure(&matches, e)),
    };
    if name == "rate-limit" {
        let limiter = RateLimiter::new(FileStore::new(cfg.rate_limit_file));
        write_document(&serde_json::to_value(limiter.current_status())?)?;
        return Ok(ExitCode::SUCCESS);
    }

    let req = cli::quote_request(sub);
    let mut client = match QuoteClient::from_config(cfg) {
        Ok(client) => client,
        Err(e) => return write_failure(&e),
    };
    info!(
        "{} {} -> {} ({})",
        name, req.origin, req.destination, req.loadtype
    );
    let result = match name {
        "get-quote" => client.quote(&req).await,
        "get-estimate" => client.estimate(&req).await,
        "compare-rates" => client.compare(&req).await,
        other => anyhow::bail!("unknown command: {}", other),
    };
    match result {
        Ok(res) => {
            write_document(&output::success(&res))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => write_failure(&e),
    }
}
