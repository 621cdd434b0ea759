use clap::{Parser, Subcommand};
use imageplus::config::{self, Config};
use imageplus::resolver::{ConfiguredResolver, ResolverOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Per-call overrides of the config `[defaults]`.
#[derive(clap::Args, Clone)]
struct OptionArgs {
    /// Extra generator options in query-string syntax (e.g. "q=80&zc=1")
    #[arg(long)]
    params: Option<String>,

    /// Do not call the thumbnail generator; the URL is left empty
    #[arg(long)]
    no_url: bool,

    /// Render the result through this output template
    #[arg(long)]
    template: Option<String>,
}

#[derive(Parser)]
#[command(name = "imageplus")]
#[command(about = "Resolve Image+ crop payloads into thumbnail URLs")]
#[command(long_about = "\
Resolve Image+ crop payloads into thumbnail URLs

The payload is the JSON stored by an Image+ field:

  {
    \"sourceImg\": {\"source\": 1, \"src\": \"photos/dawn.jpg\", \"width\": 4000, \"height\": 3000},
    \"crop\": {\"x\": 120, \"y\": 40, \"width\": 1600, \"height\": 1200},
    \"targetWidth\": 800,
    \"targetHeight\": 600,
    \"altTag\": \"Dawn over the lake\"
  }

Media sources, the generator URL and output templates come from
imageplus.toml. Run 'imageplus gen-config' to print a documented one.

Set RUST_LOG=info to see why a payload fell back to the default text.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./imageplus.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a payload and print the URL or rendered template
    Resolve {
        /// JSON payload, or "-" to read it from stdin
        #[arg(default_value = "-")]
        payload: String,

        /// Text printed when the payload is empty or invalid
        #[arg(long, default_value = "")]
        default: String,

        #[command(flatten)]
        options: OptionArgs,
    },
    /// Check that the thumbnail generator is usable
    Check,
    /// Print a stock imageplus.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            payload,
            default,
            options,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let payload = read_payload(payload)?;
            let options = resolver_options(&config, options);
            let resolver = ConfiguredResolver::from_config(&config);
            let output = resolver.resolve(&payload, &options, &default)?;
            println!("{output}");
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref())?;
            let resolver = ConfiguredResolver::from_config(&config);
            if resolver.requirements_met() {
                println!("==> Generator: {}", config.generator.base_url);
                println!("==> Sources: {}", config.sources.len());
                println!("==> Templates: {}", config.templates.len());
                println!("==> Ready");
            } else {
                eprintln!("==> Generator is not configured (generator.base_url is empty)");
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so resolved output on stdout stays clean. Level comes from
/// `RUST_LOG`, defaulting to `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit `--config` must exist; the implicit `./imageplus.toml` may not.
fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    match path {
        Some(path) => config::load_config_strict(path),
        None => config::load_config(Path::new(config::CONFIG_FILE_NAME)),
    }
}

fn read_payload(arg: String) -> std::io::Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut payload = String::new();
    std::io::stdin().read_to_string(&mut payload)?;
    Ok(payload)
}

fn resolver_options(config: &Config, args: OptionArgs) -> ResolverOptions {
    let mut options = ResolverOptions::from(&config.defaults);
    if let Some(params) = args.params {
        options.extra_thumb_params = params;
    }
    if args.no_url {
        options.generate_url = false;
    }
    if let Some(template) = args.template {
        options.output_template = Some(template).filter(|t| !t.is_empty());
    }
    options
}
