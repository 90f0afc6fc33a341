use freight_quote::{app, cli};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")] // one upstream call per invocation
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli::build_cli().get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();

    cli::init_logging(log_level.as_deref());

    app::run(matches).await
}
