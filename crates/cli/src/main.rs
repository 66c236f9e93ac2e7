mod transcoder;

use std::sync::Arc;

use {
    clap::Parser,
    secrecy::ExposeSecret,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    tgcord_config::{BridgeConfig, Severity, discover_and_load, has_errors, load_config, validate},
    tgcord_discord::{DiscordHandler, DiscordPortal},
    tgcord_relay::{Bridge, PortalAdapter, PortalMap, ProxyRegistry},
    tgcord_telegram::TelegramPortal,
};

use crate::transcoder::RelayTranscoder;

#[derive(Parser)]
#[command(name = "tgcord", about = "Bidirectional Discord/Telegram chat bridge")]
struct Cli {
    /// Path to the config file (overrides the standard search locations).
    #[arg(long, short)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };

    let diagnostics = validate(&config);
    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => {
                error!(path = %diagnostic.path, "{}", diagnostic.message);
            },
            Severity::Warning => {
                warn!(path = %diagnostic.path, "{}", diagnostic.message);
            },
        }
    }
    if has_errors(&diagnostics) {
        anyhow::bail!("configuration is invalid, refusing to start");
    }

    run(config).await
}

async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    let portal_count = config.portals.len();
    let portals = PortalMap::from_pairs(
        config
            .portals
            .iter()
            .map(|p| (p.discord_channel.clone(), p.telegram_topic.clone())),
    );

    let registry = Arc::new(ProxyRegistry::new());

    let bot = tgcord_telegram::connect(&config.telegram.token)?;
    let telegram: Arc<dyn PortalAdapter> =
        Arc::new(TelegramPortal::new(bot.clone(), config.telegram.chat_id));

    // A standalone Http handle for outbound REST calls; the gateway client
    // below owns its own.
    let http = Arc::new(serenity::http::Http::new(config.discord.token.expose_secret()));
    let discord: Arc<dyn PortalAdapter> = Arc::new(DiscordPortal::new(http, Arc::clone(&registry)));

    let bridge = Arc::new(Bridge::new(
        portals,
        config.log_capacity,
        registry,
        Arc::new(RelayTranscoder),
        discord,
        telegram,
    ));

    let telegram_cancel =
        tgcord_telegram::start_polling(bot, config.telegram.chat_id, Arc::clone(&bridge)).await?;

    let mut client = serenity::Client::builder(
        config.discord.token.expose_secret(),
        DiscordHandler::intents(),
    )
    .event_handler(DiscordHandler::new(bridge))
    .await?;

    info!(portals = portal_count, "bridge running");

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!(error = %e, "discord client stopped");
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        },
    }

    telegram_cancel.cancel();
    Ok(())
}
