use miette::{IntoDiagnostic, Result};
use vaxstat::ReportConfig;

fn main() -> Result<()> {
    let config = ReportConfig::default();
    vaxstat::run(&config).into_diagnostic()?;
    println!("wrote {}", config.output_path.display());
    Ok(())
}
