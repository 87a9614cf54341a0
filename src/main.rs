//! Command-line front end: transforms coordinate tuples read from stdin.

use clap::{Parser, ValueEnum};
use simple_proj::{AxisPolicy, ContextBuilder, Direction, Factors, Format, Serializable};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "simple-proj")]
#[command(about = "Transform coordinates between coordinate reference systems", version)]
struct Cli {
    /// Source CRS or operation (PROJ string, AUTHORITY:CODE, WKT or PROJJSON)
    source: String,

    /// Target CRS; without it SOURCE is paired with geographic longitude/latitude
    target: Option<String>,

    /// Apply the pipeline in the inverse direction
    #[arg(short, long)]
    inverse: bool,

    /// Order and unit of the input and output tuples
    #[arg(short, long, value_enum, default_value_t = AxisArg::Lonlat)]
    axis: AxisArg,

    /// Print the distortion factors at each longitude/latitude instead of transforming
    #[arg(long)]
    factors: bool,

    /// Print SOURCE serialized in this format (WKT2_2015, WKT1_ESRI, PROJJSON, PROJ, ...) and exit
    #[arg(short, long)]
    format: Option<String>,

    /// Directory to search for resource files (repeatable)
    #[arg(long)]
    search_path: Vec<PathBuf>,

    /// Allow downloading grids from the PROJ CDN
    #[arg(long)]
    network: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    /// Native axis order and units of the pipeline (radians for angular operations)
    Raw,
    /// Longitude/latitude in degrees, easting/northing
    Lonlat,
    /// Latitude/longitude in degrees, easting/northing
    Latlon,
}

impl From<AxisArg> for AxisPolicy {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::Raw => AxisPolicy::Raw,
            AxisArg::Lonlat => AxisPolicy::LonLat,
            AxisArg::Latlon => AxisPolicy::LatLon,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("simple-proj: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut builder = ContextBuilder::new();
    if !cli.search_path.is_empty() {
        builder.set_search_paths(&cli.search_path)?;
    }
    if cli.network {
        builder.enable_network(true);
    }

    if let Some(name) = &cli.format {
        let format: Format = name.parse()?;
        let crs = builder.crs(&cli.source)?;
        let text = crs
            .serialize(format)?
            .ok_or_else(|| format!("{:?} has no {format} representation", cli.source))?;
        println!("{text}");
        return Ok(());
    }

    let transformer = match &cli.target {
        Some(target) => builder.transformer_known_crs(&cli.source, target)?,
        None => builder.transformer(&cli.source)?,
    };
    log::debug!("{transformer:?}");
    let direction = if cli.inverse {
        Direction::Inverse
    } else {
        Direction::Forward
    };
    let policy = AxisPolicy::from(cli.axis);

    let mut out = io::stdout().lock();
    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_tuple(&line).map_err(|err| format!("line {}: {err}", number + 1))?;
        if cli.factors {
            let factors = transformer.factors(values[0], values[1])?;
            writeln!(out, "{}", format_factors(&factors))?;
            continue;
        }
        let result = match values.as_slice() {
            &[x, y] => {
                let (a, b) = transformer.convert(direction, (x, y), policy)?;
                vec![a, b]
            }
            &[x, y, z] => {
                let (a, b, c) = transformer.convert(direction, (x, y, z), policy)?;
                vec![a, b, c]
            }
            other => return Err(format!("expected 2 or 3 values, found {}", other.len()).into()),
        };
        let fields: Vec<String> = result.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", fields.join(" "))?;
    }
    Ok(())
}

/// Two or three numbers separated by whitespace or commas.
fn parse_tuple(line: &str) -> Result<Vec<f64>, String> {
    let values = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|err| format!("{token:?} is not a number: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values.len() {
        2 | 3 => Ok(values),
        n => Err(format!("expected 2 or 3 values, found {n}")),
    }
}

fn format_factors(factors: &Factors) -> String {
    Factors::FIELD_NAMES
        .iter()
        .zip(factors.to_array())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuple() {
        assert_eq!(parse_tuple("135 35").unwrap(), vec![135.0, 35.0]);
        assert_eq!(parse_tuple(" 1.5,\t2.5, 3 ").unwrap(), vec![1.5, 2.5, 3.0]);
        assert!(parse_tuple("1").is_err());
        assert!(parse_tuple("1 2 3 4").is_err());
        assert!(parse_tuple("1 north").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "simple-proj",
            "EPSG:4326",
            "EPSG:3857",
            "--axis",
            "latlon",
            "--search-path",
            "/a",
            "--search-path",
            "/b",
        ])
        .unwrap();
        assert_eq!(cli.target.as_deref(), Some("EPSG:3857"));
        assert_eq!(AxisPolicy::from(cli.axis), AxisPolicy::LatLon);
        assert_eq!(cli.search_path.len(), 2);
        assert!(!cli.inverse);
    }
}
