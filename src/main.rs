use clap::Parser;
use geofill::location::Nominatim;

/// geofill: label coordinate tables with city and country
///
/// Rows missing a city or country take the label of the nearest labelled
/// point within 50 km, otherwise a Nominatim reverse lookup. The table is
/// rewritten in place and its path printed on success.
///
/// Examples:
///   geofill measurements.csv
///   RUST_LOG=debug geofill measurements.csv
#[derive(Parser)]
#[command(name = "geofill", version, about, long_about = None)]
struct Cli {
    /// Path to the CSV table (needs latitude and longitude columns).
    path: String,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = geofill::run_file(&cli.path, Nominatim::new()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // The caller reads this line as the result.
    println!("{}", cli.path);
}
