use crate::types::QuoteRequest;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

fn quote_args(cmd: Command, with_mode: bool) -> Command {
    let cmd = cmd
        .arg(
            Arg::new("origin")
                .long("origin")
                .required(true)
                .help("Origin port, airport or address"),
        )
        .arg(
            Arg::new("destination")
                .long("destination")
                .required(true)
                .help("Destination port, airport or address"),
        )
        .arg(
            Arg::new("loadtype")
                .long("loadtype")
                .required(true)
                .help("boxes, pallets, container20, container40, container40HC, ..."),
        )
        .arg(Arg::new("weight").long("weight").required(true).value_parser(value_parser!(f64)))
        .arg(Arg::new("weight-unit").long("weight-unit").value_parser(["kg", "lb"]))
        .arg(Arg::new("width").long("width").value_parser(value_parser!(f64)))
        .arg(Arg::new("length").long("length").value_parser(value_parser!(f64)))
        .arg(Arg::new("height").long("height").value_parser(value_parser!(f64)))
        .arg(Arg::new("dimension-unit").long("dimension-unit").value_parser(["cm", "in"]))
        .arg(Arg::new("volume").long("volume").value_parser(value_parser!(f64)))
        .arg(Arg::new("volume-unit").long("volume-unit").value_parser(["cbm", "cft"]))
        .arg(
            Arg::new("quantity")
                .long("quantity")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(Arg::new("haz-code").long("haz-code").help("Hazardous material UN code"));
    if with_mode {
        cmd.arg(Arg::new("mode").long("mode").help("air, LCL, FCL, express, ..."))
    } else {
        cmd
    }
}

pub fn build_cli() -> Command {
    Command::new("freight-quote")
        .about("Freight quotes with a local hourly rate limit")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a JSON config file"),
        )
        .arg(
            Arg::new("rate-limit-file")
                .long("rate-limit-file")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Where call history is persisted"),
        )
        .subcommand(quote_args(
            Command::new("get-quote").about("Get freight rates"),
            true,
        ))
        .subcommand(quote_args(
            Command::new("get-estimate").about("Get a quick rate estimate"),
            true,
        ))
        .subcommand(quote_args(
            Command::new("compare-rates").about("Compare rates across all modes"),
            false,
        ))
        .subcommand(Command::new("list-tools").about("List available commands as JSON"))
        .subcommand(Command::new("rate-limit").about("Show local rate limit usage"))
}

/// Assemble a [`QuoteRequest`] from a quote subcommand's matches.
pub fn quote_request(m: &ArgMatches) -> QuoteRequest {
    let text = |id: &str| m.try_get_one::<String>(id).ok().flatten().cloned();
    let num = |id: &str| m.get_one::<f64>(id).copied();
    QuoteRequest {
        origin: text("origin").unwrap_or_default(),
        destination: text("destination").unwrap_or_default(),
        loadtype: text("loadtype").unwrap_or_default(),
        weight: num("weight").unwrap_or_default(),
        weight_unit: text("weight-unit"),
        width: num("width"),
        length: num("length"),
        height: num("height"),
        dimension_unit: text("dimension-unit"),
        volume: num("volume"),
        volume_unit: text("volume-unit"),
        quantity: m.get_one::<u32>("quantity").copied(),
        mode: text("mode"),
        haz_code: text("haz-code"),
    }
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, then RUST_LOG, then info. Logs go to stderr.
    let mut builder = env_logger::Builder::new();
    match level {
        Some(lvl) => builder.parse_filters(lvl),
        None => builder.parse_env(env_logger::Env::default().default_filter_or("info")),
    };
    builder.target(env_logger::Target::Stderr).init();
}
