use clap::Args;
use nur_core::{CalculationMethod, Config};

use super::CliResult;

#[derive(Args)]
pub struct MethodsArgs {
    /// Show the method recommended for an ISO 3166 country code
    #[arg(long)]
    country: Option<String>,
}

pub fn run(args: MethodsArgs) -> CliResult {
    if let Some(country) = args.country {
        let method = CalculationMethod::recommended(&country);
        println!("{:>2}  {}", method.code(), method.display_name());
        return Ok(());
    }

    let current = Config::load()?.calculation_method;
    for method in CalculationMethod::ALL {
        let marker = if method == current { "*" } else { " " };
        println!(
            "{marker} {:>2}  {:<8} {}",
            method.code(),
            method.short_name(),
            method.display_name()
        );
        println!("             {}", method.description());
    }
    Ok(())
}
