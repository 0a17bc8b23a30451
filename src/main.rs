use clap::Parser;
use headroom::{
    Cli, Config, HeadroomCalculator, HeadroomOutput, KubernetesLoader, OutputFormat, Result,
    display_report, init_logger, print_report,
};
use log::{debug, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logger(cli.verbose, cli.quiet)?;

    // kube and rustls may both enable a crypto backend; pin aws-lc-rs
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = Config::from(&cli);

    info!("Starting Kubernetes Memory Headroom");
    debug!(
        "Additional memory: {} ({} bytes)",
        config.additional,
        config.additional.bytes()
    );

    let loader = KubernetesLoader::new(&config).await?;
    let snapshot = loader.snapshot().await?;

    let report = HeadroomCalculator::new(config.additional.bytes()).calculate(snapshot)?;

    match config.output {
        OutputFormat::Table => print_report(&report, config.additional.label()),
        OutputFormat::Json => {
            let output = HeadroomOutput::new(config.context.clone(), &config.additional, report);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Tui => display_report(&report, config.additional.label())?,
    }

    Ok(())
}
