use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use survival_classifiers::encoding::FeatureSchema;
use survival_classifiers::predictor::Predictor;
use survival_cli::batch::run_batch;
use survival_cli::config::AppConfig;
use survival_cli::predict::{passenger_from_matches, run_predict};
use survival_cli::web;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "SURVIVAL_LOG",
            "error,survival=info,survival_cli=info,survival_classifiers=info",
        ))
        .init();

    let matches = Command::new("survival")
        .version(clap::crate_version!())
        .about("\u{1F6A2} Passenger survival prediction from a pre-trained classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Serve the passenger form over HTTP")
                .arg(config_arg())
                .args(model_args())
                .arg(
                    Arg::new("listen")
                        .short('l')
                        .long("listen")
                        .help("Address to listen on. Overrides listen_addr in the configuration file.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Hostname),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict survival for a single passenger")
                .arg(config_arg())
                .args(model_args())
                .arg(
                    Arg::new("pclass")
                        .long("pclass")
                        .help("Passenger class (1, 2 or 3)")
                        .required(true)
                        .value_parser(clap::value_parser!(u8).range(1..=3)),
                )
                .arg(
                    Arg::new("sex")
                        .long("sex")
                        .help("male or female")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("age")
                        .long("age")
                        .help("Age in years [0, 100]")
                        .required(true)
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("fare")
                        .long("fare")
                        .help("Fare in USD [0, 600]")
                        .required(true)
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("sibsp")
                        .long("sibsp")
                        .help("Siblings/spouses aboard [0, 10]")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("parch")
                        .long("parch")
                        .help("Parents/children aboard [0, 10]")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("embarked")
                        .long("embarked")
                        .help("Port of embarkation: C, Q, S or the port name")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Title: Mr, Mrs, Miss, Master or Other")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Full manifest name (\"Surname, Mr. Given\"); used to derive the title")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Score a passenger manifest (CSV or TSV)")
                .arg(
                    Arg::new("input")
                        .help("Path to the passenger file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(config_arg())
                .args(model_args())
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write predictions. Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("columns")
                .about("Print the feature columns a schema produces, in order")
                .arg(
                    Arg::new("schema")
                        .long("schema")
                        .help("Feature schema")
                        .default_value("one_hot")
                        .value_parser(["one_hot", "label_encoded"]),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("batch", sub_m)) => handle_batch(sub_m),
        Some(("columns", sub_m)) => handle_columns(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn config_arg() -> Arg {
    Arg::new("config")
        .value_name("CONFIG")
        .help("Path to JSON configuration file")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn model_args() -> Vec<Arg> {
    vec![
        Arg::new("model_path")
            .short('m')
            .long("model")
            .help("Path to the trained model file. Overrides model.path in the configuration file.")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("model_format")
            .long("format")
            .help("Model artifact format")
            .value_parser(["gbdt", "xgboost", "logistic"]),
        Arg::new("schema")
            .long("schema")
            .help("Feature schema the model was trained on")
            .value_parser(["one_hot", "label_encoded"]),
        Arg::new("label_encoders")
            .long("label-encoders")
            .help("JSON label encoder table for the label_encoded schema")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("threshold")
            .long("threshold")
            .help("Survival probability threshold (default 0.5)")
            .value_parser(clap::value_parser!(f32)),
    ]
}

fn load_config(matches: &ArgMatches) -> Result<AppConfig> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    if let Some(path) = config_path {
        log::info!("[Survival] Using config: {:?}", path);
    }
    AppConfig::from_arguments(config_path, matches)
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(web::serve(&config)) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Server failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let request = passenger_from_matches(matches)?;
    let outcome = Predictor::from_config(&config.model)
        .map_err(anyhow::Error::from)
        .and_then(|predictor| run_predict(&predictor, &request));
    match outcome {
        Ok(verdict) => {
            println!("{}", verdict);
            println!("{}", verdict.message());
            Ok(())
        }
        Err(e) => {
            log::error!("Error during prediction: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_batch(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches
        .get_one("input")
        .expect("input is required by CLI configuration");
    let output: Option<&PathBuf> = matches.get_one("output_file");
    let config = load_config(matches)?;

    let predictor = match Predictor::from_config(&config.model) {
        Ok(predictor) => predictor,
        Err(e) => {
            log::error!("Error loading model: {}", e);
            std::process::exit(1)
        }
    };

    let summary = run_batch(input, output.map(PathBuf::as_path), &predictor)?;
    eprintln!(
        "[Survival::Batch] Completed {} passengers ({} survived, {} failed).",
        summary.total, summary.survived, summary.failed
    );
    Ok(())
}

fn handle_columns(matches: &ArgMatches) -> Result<()> {
    let schema: FeatureSchema = matches
        .get_one::<String>("schema")
        .map(|s| s.parse::<FeatureSchema>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    for column in schema.columns() {
        println!("{}", column);
    }
    Ok(())
}
