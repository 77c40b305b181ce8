use clap::Parser;
use kartograf::geo::{GeoResolver, Granularity};

/// kartograf — geographic resolution engine for field-service dashboards.
///
/// Resolves free-text Serbian street addresses and municipality names to
/// map coordinates through a tiered pipeline: cache, local knowledge base,
/// rate-limited external geocoding, Cyrillic transliteration retry, and a
/// deterministic fallback that always succeeds.
///
/// Examples:
///   kartograf "Beograd,BORČA,BORSKA 10"
///   kartograf --granularity municipality Vračar
///   kartograf --offline "Beograd,KOTEŽ,TRAJKA GRKOVIĆA 4"
///   kartograf --serve --port 4280
#[derive(Parser)]
#[command(name = "kartograf", version, about, long_about = None)]
struct Cli {
    /// Location to resolve (positional).
    #[arg(index = 1)]
    location: Option<String>,

    /// Resolution granularity: "street" or "municipality".
    #[arg(long, short = 'g', default_value = "street", value_parser = parse_granularity)]
    granularity: Granularity,

    /// Offline mode: skip the external geocoding tiers.
    #[arg(long)]
    offline: bool,

    /// Run the HTTP server instead of resolving a single location.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 4280)]
    port: u16,
}

fn parse_granularity(s: &str) -> Result<Granularity, String> {
    s.parse()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kartograf=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut resolver = GeoResolver::new();
    if cli.offline {
        resolver.set_offline(true);
    }

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(kartograf::server::start(&cli.host, cli.port, resolver));
        return;
    }

    let location = match &cli.location {
        Some(loc) if !loc.trim().is_empty() => loc.clone(),
        _ => {
            eprintln!("Error: Provide a location to resolve, or --serve.");
            std::process::exit(2);
        }
    };

    let result = resolver.resolve(&location, cli.granularity);
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
