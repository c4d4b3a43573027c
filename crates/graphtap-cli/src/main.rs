use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use graphtap_classify::Classifier;
use graphtap_cli::{init_tracing, load, replay, ReplayFormat};
use graphtap_model::Category;
use graphtap_pipeline::PipelineConfig;
use graphtap_resolve::EntityResolver;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::new("graphtap")
        .version(graphtap_cli::VERSION)
        .about("Classify, deduplicate and resolve captured graph traffic")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Pipeline configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a recording through the pipeline, printing forwarded events")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSONL or HAR recording"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["jsonl", "har"])
                        .help("Recording format (default: from extension)"),
                )
                .arg(
                    Arg::new("stats")
                        .long("stats")
                        .action(ArgAction::SetTrue)
                        .help("Print counters instead of events"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify an address, optionally with a payload file")
                .arg(Arg::new("address").required(true).help("Request address"))
                .arg(
                    Arg::new("payload")
                        .long("payload")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON payload for the shape heuristic"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a payload file into entities")
                .arg(
                    Arg::new("category")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<Category>().map_err(|e| e.to_string()))
                        .help("Category to resolve as (feed, comments, profile, ...)"),
                )
                .arg(
                    Arg::new("payload")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON payload"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

fn load_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("replay", args)) => {
            let input = args.get_one::<PathBuf>("input").context("input is required")?;
            let format = match args.get_one::<String>("format") {
                Some(name) => ReplayFormat::parse(name)?,
                None => ReplayFormat::detect(input),
            };
            let observations = load(input, format).await?;
            let report = replay(config, observations)?;
            if args.get_flag("stats") {
                print_json(&report.stats)?;
            } else {
                for event in &report.events {
                    print_json(event.as_ref())?;
                }
            }
        }
        Some(("classify", args)) => {
            let address = args.get_one::<String>("address").context("address is required")?;
            let payload = match args.get_one::<PathBuf>("payload") {
                Some(path) => read_json(path).await?,
                None => Value::Null,
            };
            let classifier = Classifier::new(config.classifier)?;
            let classification = classifier.classify(Some(address.as_str()), &payload);
            print_json(&json!({
                "classification": classification,
                "relevant": classifier.is_relevant_address(address),
            }))?;
        }
        Some(("resolve", args)) => {
            let category = args.get_one::<Category>("category").context("category is required")?;
            let path = args.get_one::<PathBuf>("payload").context("payload is required")?;
            let payload = read_json(path).await?;
            let entities = EntityResolver::new().try_resolve(*category, &payload)?;
            print_json(&entities)?;
        }
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
        }
        _ => {
            cli().print_help()?;
        }
    }
    Ok(())
}
