//! Command line driver for the midpoint bias optimizer
//!
//! ```text
//! evolve-bias run [--config FILE] [--seed N] [--workers N] [--duration SECS] [--sparse-cache]
//! evolve-bias evaluate VALUE [--config FILE]
//! evolve-bias config
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use bias_core::{BiasConstant, CacheMode, Candidate};
use bias_evolve::{BestReport, EvolutionConfig, LogReporter, Optimizer};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("TOML config file (defaults apply to omitted keys)")
}

fn cli() -> Command {
    Command::new("evolve-bias")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Evolve the bias constant of a cache-friendly binary search")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run the optimizer and report each new best candidate")
                .arg(config_arg())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .short('s')
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .help("Random seed"),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .short('w')
                        .value_name("COUNT")
                        .value_parser(value_parser!(usize))
                        .help("Breeding threads"),
                )
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .short('d')
                        .value_name("SECONDS")
                        .value_parser(value_parser!(u64))
                        .help("Stop after this many seconds (runs until killed otherwise)"),
                )
                .arg(
                    Arg::new("sparse-cache")
                        .long("sparse-cache")
                        .action(ArgAction::SetTrue)
                        .help("Memoize utilities in a hash map instead of a 1 GiB table"),
                ),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Print the utility and per-spec breakdown of one constant")
                .arg(
                    Arg::new("value")
                        .required(true)
                        .value_name("VALUE")
                        .help("Constant in decimal or 0x-prefixed hex"),
                )
                .arg(config_arg()),
        )
        .subcommand(Command::new("config").about("Print the default configuration as TOML"))
}

fn load_config(matches: &ArgMatches) -> Result<EvolutionConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => EvolutionConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(EvolutionConfig::default()),
    }
}

fn parse_constant(text: &str) -> Result<BiasConstant> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    }
    .with_context(|| format!("'{text}' is not a 32-bit integer"))?;

    let constant = BiasConstant::new(value);
    if constant.get() != value {
        bail!("{value:#x} does not fit in 28 bits");
    }
    Ok(constant)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut config = load_config(matches)?;
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if let Some(&workers) = matches.get_one::<usize>("workers") {
        config.workers = workers;
    }
    if matches.get_flag("sparse-cache") {
        config.cache = CacheMode::Sparse;
    }

    let started = Instant::now();
    let handle = Optimizer::new(config)?.reporter(LogReporter).start()?;

    match matches.get_one::<u64>("duration") {
        Some(&seconds) => handle.run_for(Duration::from_secs(seconds)),
        None => handle.wait(),
    }

    let children = handle.children();
    let stats = handle.evaluator().cache_stats();
    if let Some(best) = handle.stop() {
        println!("{best}");
    }
    log::info!(
        "{} children in {:.1?}, cache hit rate {:.1}%",
        children,
        started.elapsed(),
        stats.hit_rate()
    );
    Ok(())
}

fn evaluate(matches: &ArgMatches) -> Result<()> {
    let Some(text) = matches.get_one::<String>("value") else {
        bail!("missing VALUE");
    };
    let constant = parse_constant(text)?;
    let config = load_config(matches)?;
    let evaluator = config.build_evaluator_with(CacheMode::Sparse.build())?;

    let candidate = Candidate::evaluate(constant, &evaluator);
    println!("{}", BestReport::new(&candidate, &evaluator));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("run", sub)) => run(sub),
        Some(("evaluate", sub)) => evaluate(sub),
        Some(("config", _)) => {
            print!("{}", EvolutionConfig::default().to_toml_string()?);
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}
