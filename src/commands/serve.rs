use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    ServeArgs,
    build::{Builder, base_path_from_config},
    config::{CONFIG_FILE, RootConfig},
    proxy::{self, ANALYTICS_ROUTE, AppState, PHOTOS_ROUTE, ProxyEnv},
};

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
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

    // Generate pages first so the static fallback has something to serve
    let builder = Builder::from_config(&config, &base_path)?;
    let report = builder.build()?;
    println!(
        "Generated {} location pages in {}",
        report.generated(),
        report.output_dir.display()
    );
    if !report.is_success() {
        eprintln!("Warning: {} location pages failed to generate", report.failed());
    }

    let env = ProxyEnv::from_env();
    if env.pexels_api_key.is_none() {
        warn!("PEXELS_API_KEY is not set; {PHOTOS_ROUTE} will report a configuration error");
    }
    if env.service_account_json.is_none() || env.site_url.is_none() {
        warn!(
            "GOOGLE_SERVICE_ACCOUNT_JSON or GSC_SITE_URL is not set; {ANALYTICS_ROUTE} will report a configuration error"
        );
    }

    let state = Arc::new(AppState::new(
        config.proxy.clone(),
        env,
        proxy::create_http_client()?,
    ));

    let serve_dir = ServeDir::new(builder.output_dir()).append_index_html_on_directories(true);
    let app = proxy::router(state).fallback_service(serve_dir);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}", display_host, args.port);

    println!("\nServing pages and API proxies at {}", url);
    println!("  {url}{PHOTOS_ROUTE}");
    println!("  {url}{ANALYTICS_ROUTE}");
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
