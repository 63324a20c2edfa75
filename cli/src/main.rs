//! Energy Bill: command-line front end
//!
//! Computes a bill for one consumer and prints the itemized breakdown.
//!
//! ```sh
//! # Residential, 250 kWh, yellow flag, taxes and lighting fee included
//! energy-bill --class residential --kwh 250 --flag yellow
//!
//! # Commercial without taxes, custom fee, municipal contribution
//! energy-bill --class commercial --kwh 1200 --no-taxes --lighting-fee 10 --municipal 3
//!
//! # Override a tariff and print the rate table snapshot
//! energy-bill --class industrial --kwh 3000 --set-rate industrial_base=0.58 --export-rates
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use energy_billing_core::{
    assemble_with_config, create_strategy, rate_table, BillCalculation, BillComponent,
    BillingConfig, BillingError, FlagPricing, PricingContext,
};

#[derive(Parser, Debug)]
#[command(
    name = "energy-bill",
    version,
    about = "Compute an itemized electricity bill"
)]
struct Cli {
    /// Consumer class: residential, commercial or industrial.
    #[arg(short, long)]
    class: String,

    /// Monthly consumption in kWh.
    #[arg(short, long)]
    kwh: f64,

    /// Tariff flag: green, yellow, red-tier-1, red-tier-2.
    /// Overrides the flag from the config file.
    #[arg(short, long)]
    flag: Option<String>,

    /// Path to a JSON billing configuration.
    #[arg(long, env = "ENERGY_BILL_CONFIG")]
    config: Option<PathBuf>,

    /// Leave PIS/COFINS and ICMS out of the bill.
    #[arg(long)]
    no_taxes: bool,

    /// Leave the public lighting fee out of the bill.
    #[arg(long)]
    no_lighting_fee: bool,

    /// Override the public lighting fee.
    #[arg(long)]
    lighting_fee: Option<f64>,

    /// Add a municipal contribution of this percentage of the base amount.
    #[arg(long)]
    municipal: Option<f64>,

    /// Override a tariff before billing, as KEY=PRICE. Repeatable.
    #[arg(long = "set-rate", value_name = "KEY=PRICE")]
    set_rates: Vec<String>,

    /// Price the flag from the rate table instead of its built-in price.
    #[arg(long)]
    table_flag_price: bool,

    /// Print the rate table snapshot as JSON after the bill.
    #[arg(long)]
    export_rates: bool,

    /// Log level (trace, debug, info, warn, error). Defaults to RUST_LOG or warn.
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_rate_override(raw: &str) -> Result<(&str, f64), BillingError> {
    let (key, price) = raw.split_once('=').ok_or_else(|| {
        BillingError::InvalidInput(format!("expected KEY=PRICE, got '{}'", raw))
    })?;
    let price = price.trim().parse::<f64>().map_err(|_| {
        BillingError::InvalidInput(format!("price for '{}' is not a number: '{}'", key, price))
    })?;
    Ok((key.trim(), price))
}

fn load_config(cli: &Cli) -> Result<BillingConfig, BillingError> {
    let mut config = match &cli.config {
        Some(path) => BillingConfig::load(path)?,
        None => BillingConfig::default(),
    };
    if let Some(flag) = &cli.flag {
        config.flag = flag.parse()?;
    }
    if let Some(fee) = cli.lighting_fee {
        config.lighting_fee = fee;
    }
    if let Some(percent) = cli.municipal {
        config.municipal_percentage = Some(percent);
    }
    if cli.table_flag_price {
        config.flag_pricing = FlagPricing::RateTable;
    }
    config.validate()?;
    Ok(config)
}

fn print_bill(cli: &Cli, month: &str, base: &BillCalculation, bill: &BillComponent) {
    let rule = "-".repeat(56);
    println!("Electricity bill - {} ({})", cli.class, month);
    println!("Pricing: {}", base.strategy_label);
    println!("Consumption: {:.2} kWh", cli.kwh);
    println!("{}", rule);
    for entry in &base.breakdown {
        println!("{:<44} {:>11.2}", entry.label, entry.amount);
    }
    println!("{}", rule);
    // First line is the base amount already itemized above
    for entry in bill.breakdown().iter().skip(1) {
        println!("{:<44} {:>11.2}", entry.label, entry.amount);
    }
    println!("{}", rule);
    println!("{:<44} {:>11.2}", "TOTAL", bill.amount());
    println!("Composition: {}", bill.description());
}

fn run(cli: &Cli) -> Result<(), BillingError> {
    let config = load_config(cli)?;

    let table = rate_table();
    config.apply_to(&table)?;
    for raw in &cli.set_rates {
        let (key, price) = parse_rate_override(raw)?;
        table.set_rate(key, price)?;
    }
    debug!(%table, "rate table ready");

    let context = PricingContext::new(create_strategy(&cli.class, &table)?);
    let base = context.calculate_bill(cli.kwh)?;

    let bill = assemble_with_config(
        base.total,
        cli.kwh,
        &config,
        &table,
        !cli.no_taxes,
        !cli.no_lighting_fee,
    )?;
    print_bill(cli, &table.reference_month(), &base, &bill);

    if cli.export_rates {
        println!("{}", table.to_json()?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "billing failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
