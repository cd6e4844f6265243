use clap::Parser;
use fork_fortune::adapters::{FixedLocation, GooglePlacesClient};
use fork_fortune::config::{Command, LocationArgs};
use fork_fortune::core::locate::{acquire_location, describe};
use fork_fortune::core::workflow::discover_candidates;
use fork_fortune::core::{ConfigProvider, PlacesProvider};
use fork_fortune::domain::model::{Coordinate, PlaceCandidate, SearchRadius};
use fork_fortune::utils::error::{ErrorSeverity, PickerError, Result};
use fork_fortune::utils::{logger, validation::bounded_radius, validation::Validate};
use fork_fortune::{AppConfig, CliConfig, DiscoveryWorkflow};
use std::sync::Arc;

const CARD_PHOTO_WIDTH: u32 = 800;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();
    let loaded = AppConfig::load(cli.config.as_deref());

    // 初始化日誌
    match &cli.command {
        #[cfg(feature = "server")]
        Command::Serve { .. } => logger::init_server_logger(
            loaded.as_ref().map(|config| config.json_logs()).unwrap_or(false),
        ),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting fork-fortune");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let config = match loaded.and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Pick {
            location,
            radius_km,
            rerolls,
            seed,
        } => {
            let coordinate = resolve_coordinate(&location, &config)?;
            let radius = resolve_radius(radius_km, &config)?;
            config.require_api_key()?;
            let places = Arc::new(GooglePlacesClient::from_config(&config)?);

            let here = acquire_location(
                &FixedLocation(coordinate),
                places.as_ref(),
                config.location_timeout(),
            )
            .await?;
            println!("📍 {}", here.address);

            let mut workflow = match seed {
                Some(seed) => DiscoveryWorkflow::with_seed(places.clone(), seed),
                None => DiscoveryWorkflow::new(places.clone()),
            };
            workflow.set_radius(radius);
            workflow.set_location(here);

            let first = workflow.pick_restaurant().await?;
            print_pick(&workflow, &first).await;

            for round in 1..=rerolls {
                println!();
                println!("🔄 Pick again ({}/{})", round, rerolls);
                let next = workflow.pick_again().await?;
                print_pick(&workflow, &next).await;
            }
        }
        Command::Nearby { location, radius_km } => {
            let coordinate = resolve_coordinate(&location, &config)?;
            let radius = resolve_radius(radius_km, &config)?;
            config.require_api_key()?;
            let places = GooglePlacesClient::from_config(&config)?;

            let set = discover_candidates(&places, coordinate, radius).await?;
            println!(
                "🍽️ {} restaurants within {} km of {}",
                set.len(),
                radius.km(),
                coordinate.label()
            );
            for candidate in &set.candidates {
                println!("  - {}", summary_line(candidate));
            }
        }
        Command::Geocode { location } => {
            let coordinate = resolve_coordinate(&location, &config)?;
            let places = GooglePlacesClient::from_config(&config)?;

            println!("📍 {}", describe(&places, coordinate).await);
        }
        Command::Photo {
            reference,
            max_width,
        } => {
            config.require_api_key()?;
            let places = GooglePlacesClient::from_config(&config)?;
            let url = places.photo_url(&reference, max_width).await?;
            println!("{}", url);
        }
        Command::CheckKey => {
            let places = GooglePlacesClient::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&places.key_status())?);
        }
        #[cfg(feature = "server")]
        Command::Serve { host, port } => {
            let mut config = config;
            if host.is_some() {
                config.server.host = host;
            }
            if port.is_some() {
                config.server.port = port;
            }
            fork_fortune::server::serve(config).await?;
        }
    }

    Ok(())
}

/// 命令列座標優先，否則使用設定檔的 [location]
fn resolve_coordinate(args: &LocationArgs, config: &AppConfig) -> Result<Coordinate> {
    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
        (None, None) => match (config.location.latitude, config.location.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => Err(PickerError::invalid_input(
                "location",
                "missing",
                "Pass --lat and --lng or set [location] in the config file",
            )),
        },
        _ => Err(PickerError::invalid_input(
            "location",
            "partial",
            "--lat and --lng must be given together",
        )),
    }
}

fn resolve_radius(radius_km: Option<i64>, config: &AppConfig) -> Result<SearchRadius> {
    bounded_radius(
        radius_km.unwrap_or_else(|| config.default_radius_km()),
        config.radius_bounds(),
    )
}

fn summary_line(candidate: &PlaceCandidate) -> String {
    let rating = candidate
        .rating
        .map(|r| format!("{:.1}★", r))
        .unwrap_or_else(|| "unrated".to_string());
    match candidate.price_label() {
        Some(price) => format!("{} ({}, {}) {}", candidate.name, rating, price, candidate.address),
        None => format!("{} ({}) {}", candidate.name, rating, candidate.address),
    }
}

async fn print_pick(workflow: &DiscoveryWorkflow, candidate: &PlaceCandidate) {
    println!("🎉 {}", summary_line(candidate));
    println!("🗺️ {}", candidate.maps_url());
    if let Some(photo) = workflow.resolve_photo(candidate, CARD_PHOTO_WIDTH).await {
        println!("📷 {}", photo);
    }
}
