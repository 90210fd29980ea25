use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medium_responses::Options;

const USAGE: &str = "usage: medium-responses [options] <post-url>";

enum ParsedArgs {
    Run(Options),
    Handled,
    Invalid(String),
}

#[tokio::main]
async fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        ParsedArgs::Run(options) => options,
        ParsedArgs::Handled => return,
        ParsedArgs::Invalid(message) => {
            eprintln!("{message}\n{USAGE}");
            std::process::exit(2);
        }
    };

    init_tracing();

    if let Err(err) = medium_responses::run(options).await {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> ParsedArgs {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("medium-responses {}", medium_responses::VERSION);
                return ParsedArgs::Handled;
            }
            "--help" | "-h" => {
                println!(
                    "medium-responses — fetch a Medium story's response thread and render it as nested HTML.\n\n{USAGE}\n\n  --output,  -o <path>  Write the rendered page to this path\n  --config <path>       Read configuration from this file\n  --no-open             Do not open the rendered page in a browser\n  --version, -V         Show version and exit\n  --help,    -h         Show this help message"
                );
                return ParsedArgs::Handled;
            }
            "--output" | "-o" => match args.next() {
                Some(path) => options.output = Some(PathBuf::from(path)),
                None => return ParsedArgs::Invalid("--output requires a path".to_string()),
            },
            "--config" => match args.next() {
                Some(path) => options.config_file = Some(PathBuf::from(path)),
                None => return ParsedArgs::Invalid("--config requires a path".to_string()),
            },
            "--no-open" => options.no_open = true,
            _ if arg.starts_with('-') => {
                return ParsedArgs::Invalid(format!("unknown flag {arg}"));
            }
            _ => {
                if !options.post_url.is_empty() {
                    return ParsedArgs::Invalid(format!("unexpected argument {arg}"));
                }
                options.post_url = arg;
            }
        }
    }

    if options.post_url.is_empty() {
        return ParsedArgs::Invalid("a post URL is required".to_string());
    }
    ParsedArgs::Run(options)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,medium_responses=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
