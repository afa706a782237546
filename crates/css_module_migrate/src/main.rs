use clap::Parser;
use css_module_migrate::{migrate, Args};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let options = args.into_options()?;
  let report = migrate(&options)?;

  for (path, code) in &report.outputs {
    println!("// {}", path.display());
    println!("{code}");
  }
  report.log_summary();

  if report.has_failures() {
    std::process::exit(1);
  }

  Ok(())
}
