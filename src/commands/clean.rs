use crate::{
    CleanArgs,
    build::base_path_from_config,
    config::{CONFIG_FILE, RootConfig},
};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
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

    // Delete the generated pages folder
    let output_path = base_path.join(&config.site.output);
    if output_path.exists() {
        if args.dry_run {
            println!("Would delete {}", output_path.display());
        } else {
            tokio::fs::remove_dir_all(&output_path).await?;
            println!("Deleted {}", output_path.display());
        }
    } else {
        println!("Nothing to clean at {}", output_path.display());
    }

    Ok(())
}
