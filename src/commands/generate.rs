use std::path::Path;

use crate::{
    GenerateArgs,
    build::{Builder, StaleReason, base_path_from_config},
    config::{CONFIG_FILE, RootConfig},
};

pub async fn run(args: &GenerateArgs) -> Result<(), anyhow::Error> {
    // Determine the config file path
    let config_path = args
        .config_file
        .clone()
        .unwrap_or_else(|| CONFIG_FILE.into());
    let config_path = if config_path.is_relative() {
        std::env::current_dir()?.join(&config_path)
    } else {
        config_path
    };

    let config = RootConfig::load_from_arg(Some(config_path.as_path()))?;
    let base_path = base_path_from_config(&config_path);
    let builder = Builder::from_config(&config, &base_path)?;

    if args.check {
        return check(&builder);
    }

    let report = builder.build()?;

    println!(
        "Generated {} location pages in {}",
        report.generated(),
        report.output_dir.display()
    );

    if !report.is_success() {
        for failure in report.failures() {
            eprintln!("  failed: {} ({})", failure.slug(), failure.path().display());
        }
        return Err(anyhow::anyhow!(
            "{} of {} location pages failed",
            report.failed(),
            report.outcomes.len()
        ));
    }

    Ok(())
}

fn check(builder: &Builder) -> Result<(), anyhow::Error> {
    let stale = builder.check()?;
    if stale.is_empty() {
        println!(
            "All {} location pages in {} are up to date",
            builder.dataset().len(),
            builder.output_dir().display()
        );
        return Ok(());
    }

    for output in &stale {
        let reason = match output.reason {
            StaleReason::Missing => "missing",
            StaleReason::Changed => "changed",
        };
        println!("  {reason}: {}", relative(&output.path, builder.output_dir()));
    }

    Err(anyhow::anyhow!(
        "{} location page(s) are out of date; run `fencesite generate`",
        stale.len()
    ))
}

fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
