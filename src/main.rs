use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

mod application;
mod bots;
mod domain;
mod infrastructure;

use application::services::{
    AnalyticsService, DashboardService, KeyService, PluginService, ScriptCatalog,
    VerificationService,
};
use bots::{AuthRelay, BoostThanks, BotRunner, MeowResponder, StickyResponder};
use domain::traits::Bot;
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::discord::DiscordAdapter;
use infrastructure::config::Config;
use infrastructure::http::{self, AppState};
use infrastructure::image::ImageConverter;
use infrastructure::storage::JsonPluginStore;
use infrastructure::youtube::ChannelFinder;

#[derive(Parser)]
#[command(name = "vadrifts")]
#[command(about = "Script hub site and community bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the site and bots
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run(cli.config);
        }
        Commands::Version => {
            println!("vadrifts v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

fn run(config_path: String) {
    let mut config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.apply_env();

    tracing::info!("Starting {}", config.site.name);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let data_dir = config.server.data_dir.clone();

        let store = JsonPluginStore::new(data_dir.join("plugins.json"));
        if let Err(e) = store.init().await {
            tracing::error!("Failed to load plugin storage: {}", e);
            return;
        }

        let analytics = AnalyticsService::new(data_dir.join("executions.json"));
        if let Err(e) = analytics.init().await {
            tracing::warn!("Failed to load analytics history: {}", e);
        }

        let scripts = match ScriptCatalog::load(data_dir.join("scripts.json")) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Failed to load script catalog: {}", e);
                ScriptCatalog::new(Vec::new())
            }
        };
        if scripts.is_empty() {
            tracing::warn!("Script catalog is empty");
        } else {
            tracing::info!("Loaded {} scripts", scripts.len());
        }

        let state = Arc::new(AppState {
            plugins: PluginService::new(Arc::new(store)),
            keys: KeyService::new(),
            verification: VerificationService::new(
                config.verification.min_seconds,
                config.verification.turnstile_secret.clone(),
            ),
            dashboard: DashboardService::new(),
            analytics,
            scripts,
            channels: ChannelFinder::new(),
            images: ImageConverter::new(),
            config: config.clone(),
        });

        spawn_cleanup_task(Arc::clone(&state));
        if let Some(url) = config.server.public_url.clone() {
            spawn_keep_alive(url);
        }

        let bot_task = if config.discord.enabled {
            spawn_bots(&config).await
        } else {
            tracing::info!("Discord disabled, bots idle");
            None
        };

        if let Err(e) = http::serve(state).await {
            tracing::error!("HTTP server exited: {}", e);
        }
        if let Some(task) = bot_task {
            task.abort();
        }
    });
}

/// Hourly sweep of expired key slugs and verification records. Stale
/// dashboard tests are cleared lazily on read.
fn spawn_cleanup_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let slugs = state.keys.purge();
            let records = state.verification.purge();
            tracing::debug!("Cleanup: {} slugs, {} verification records", slugs, records);
        }
    });
}

/// Ping our own health endpoint every five minutes so free-tier hosts
/// don't put the instance to sleep.
fn spawn_keep_alive(public_url: String) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let url = format!("{}/health", public_url.trim_end_matches('/'));
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            match client.get(&url).send().await {
                Ok(resp) => tracing::debug!("Keep-alive ping: {}", resp.status()),
                Err(e) => tracing::warn!("Keep-alive ping failed: {}", e),
            }
        }
    });
}

async fn spawn_bots(config: &Config) -> Option<tokio::task::JoinHandle<()>> {
    let discord = &config.discord;

    let bot: Arc<dyn Bot> = match &discord.token {
        Some(token) => {
            let mut adapter = DiscordAdapter::new(token.clone());
            if let Err(e) = adapter.fetch_bot_info().await {
                tracing::error!("Failed to fetch bot info: {}", e);
                return None;
            }
            Arc::new(adapter)
        }
        None => {
            tracing::info!("No token configured, using console adapter");
            Arc::new(ConsoleAdapter::new())
        }
    };

    let mut channels = discord.watch_channels.clone();
    if let Some(boost) = &discord.boost_channel {
        if !channels.contains(boost) {
            channels.push(boost.clone());
        }
    }
    if channels.is_empty() {
        channels.push("console".to_string());
    }

    let sticky = StickyResponder::new(config.server.data_dir.join("stickied.json"));
    if let Err(e) = sticky.init().await {
        tracing::warn!("Failed to load stickied messages: {}", e);
    }

    let mut runner = BotRunner::new(
        bot,
        channels,
        Duration::from_secs(discord.poll_interval_secs),
    )
    .with_responder(MeowResponder::new())
    .with_responder(sticky)
    .with_responder(AuthRelay::new(
        discord.auth_log_channel.clone(),
        discord.owner_id.clone(),
    ));
    if let Some(boost_channel) = &discord.boost_channel {
        runner = runner.with_responder(BoostThanks::new(
            boost_channel.clone(),
            Duration::from_secs(2),
        ));
    }

    Some(tokio::spawn(runner.run()))
}

fn init_config(path: &str) {
    if std::path::Path::new(path).exists() {
        tracing::warn!("{} already exists, not overwriting", path);
        return;
    }
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => match std::fs::write(path, yaml) {
            Ok(()) => println!("Wrote default config to {}", path),
            Err(e) => tracing::error!("Failed to write config: {}", e),
        },
        Err(e) => tracing::error!("Failed to serialize config: {}", e),
    }
}
