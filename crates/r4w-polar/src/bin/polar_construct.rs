//! # polar-construct
//!
//! Builds a polar code construction from a YAML config and prints the
//! channel ordering, frozen set and information set.
//!
//! ## Run
//! ```bash
//! polar-construct                          # search path or defaults
//! polar-construct --config code.yaml
//! polar-construct -n 256 -k 128 --snr -1.0 --method gaussian_approximation
//! polar-construct --example > r4w-polar.yaml
//! ```

use std::path::Path;

use r4w_polar::config::{ConfigError, PolarConfig};
use r4w_polar::observe::init_logging;
use r4w_polar::Method;

fn flag_value<'a>(args: &'a [String], names: &[&str]) -> Option<&'a str> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(
    args: &[String],
    names: &[&str],
) -> Result<Option<T>, ConfigError> {
    match flag_value(args, names) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::ParseError(format!("{}: bad value {:?}", names[0], raw))),
        None => Ok(None),
    }
}

fn format_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", PolarConfig::example_yaml());
        return Ok(());
    }

    let mut config = match flag_value(&args, &["--config", "-c"]) {
        Some(path) => PolarConfig::load_from(Path::new(path))?,
        None => PolarConfig::load()?,
    };

    if let Some(n) = parse_flag(&args, &["-n", "--block-size"])? {
        config.construction.block_size = n;
    }
    if let Some(k) = parse_flag(&args, &["-k", "--info-bits"])? {
        config.construction.info_bits = k;
    }
    if let Some(snr) = parse_flag(&args, &["--snr"])? {
        config.construction.design_snr_db = snr;
    }
    if let Some(method) = flag_value(&args, &["--method", "-m"]) {
        config.construction.method = serde_yaml::from_str::<Method>(method)
            .map_err(|e| ConfigError::ParseError(format!("--method: {}", e)))?;
    }

    config.validate()?;
    init_logging(&config.logging);

    let c = &config.construction;
    tracing::info!(
        n = c.block_size,
        k = c.info_bits,
        snr_db = c.design_snr_db,
        method = %c.method,
        "building construction"
    );

    let cc = c.build()?;
    let frozen = cc.frozen_bit_positions(c.frozen_count())?;

    println!(
        "# N={} K={} snr_db={} method={}",
        c.block_size, c.info_bits, c.design_snr_db, c.method
    );
    if let Some(sel) = cc.selection() {
        println!(
            "# selected={:?} linear_distinct={} log_distinct={}",
            sel.selected, sel.linear_distinct, sel.log_distinct
        );
    }
    println!("sorted: {}", format_indices(cc.sorted_channels().as_slice()));
    println!("frozen: {}", format_indices(&frozen.sorted()));
    println!("information: {}", format_indices(&frozen.information_positions()));

    Ok(())
}
