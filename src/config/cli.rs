use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "fork-fortune")]
#[command(about = "Spin the fork, taste your fortune: pick a random nearby restaurant")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Pick a random restaurant near a location, with optional re-rolls
    Pick {
        #[command(flatten)]
        location: LocationArgs,

        /// Search distance in kilometres
        #[arg(long)]
        radius_km: Option<i64>,

        /// Number of "pick again" rounds after the first pick
        #[arg(long, default_value = "0")]
        rerolls: u32,

        /// Seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the eligible restaurants near a location
    Nearby {
        #[command(flatten)]
        location: LocationArgs,

        #[arg(long)]
        radius_km: Option<i64>,
    },

    /// Reverse-geocode a coordinate into an address
    Geocode {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Resolve a photo reference into an image URL
    Photo {
        #[arg(long)]
        reference: String,

        #[arg(long, default_value = "400")]
        max_width: u32,
    },

    /// Show whether the Places API key is configured
    CheckKey,

    /// Run the HTTP server
    #[cfg(feature = "server")]
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// Latitude in decimal degrees (falls back to [location] in the config file)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,
}
