use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use oxilinks::application::transforms::{ResolverSet, default_transforms};
use oxilinks::application::use_cases::CheckRequest;
use oxilinks::application::{CheckLinksUseCase, TransformRegistry};
use oxilinks::infrastructure::health;
use oxilinks::infrastructure::{
    AppConfig, CliArgs, Command, ConfigStore, DiscordClient, GatewayClient, HttpRedirectResolver,
    ResolveLimiter, ResolverOptions,
};
use oxilinks::presentation::{Bot, check_text, list_transforms};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match (&args.config, ConfigStore::new()) {
        (Some(path), _) => ConfigStore::load_file(path)?,
        (None, Ok(store)) => store.load_config(None)?,
        (None, Err(_)) => AppConfig::default(),
    };
    config.merge_with_args(args);
    Ok(config)
}

fn build_registry(config: &AppConfig) -> Result<Arc<TransformRegistry>> {
    let limiter = ResolveLimiter::new(config.resolver.max_concurrent);
    let options = |timeout| ResolverOptions {
        timeout,
        user_agent: config.resolver.user_agent.clone(),
    };

    let resolvers = ResolverSet {
        reddit: Arc::new(HttpRedirectResolver::new(
            limiter.clone(),
            &options(config.resolver.reddit_timeout()),
        )?),
        generic: Arc::new(HttpRedirectResolver::new(
            limiter,
            &options(config.resolver.follow_timeout()),
        )?),
    };

    Ok(Arc::new(TransformRegistry::new(default_transforms(
        &resolvers,
    ))))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn run_bot(config: &AppConfig, registry: Arc<TransformRegistry>) -> Result<()> {
    let token = config
        .bot_token()
        .ok_or_else(|| eyre!("no bot token configured, set BOT_TOKEN or pass --bot-token"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let health_task = config.health.enabled.then(|| {
        let addr = config.health.addr;
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let stop = async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            };
            if let Err(e) = health::serve(addr, stop).await {
                error!(error = %e, "Health endpoint failed");
            }
        })
    });
    if health_task.is_none() {
        info!("Health endpoint disabled");
    }

    let chat = Arc::new(DiscordClient::new(token.clone())?);
    let bot = Bot::new(
        Box::new(GatewayClient::with_default_config()),
        chat,
        registry,
        config.dispatcher_config(),
    );

    let result = bot.run(&token, shutdown_signal()).await;

    shutdown_tx.send_replace(true);
    if let Some(task) = health_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Health endpoint task failed to join");
        }
    }

    result.wrap_err("bot stopped")
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    let registry = build_registry(&config)?;

    match args.command() {
        Command::Run => {
            info!(version = oxilinks::VERSION, "Starting oxilinks");
            run_bot(&config, registry).await?;
        }
        Command::Check { transform, text } => {
            let use_case = CheckLinksUseCase::new(registry);
            let request = CheckRequest {
                text: text.join(" "),
                transform,
            };
            check_text(&use_case, request, &mut io::stdout()).await?;
        }
        Command::List => list_transforms(&registry, &mut io::stdout())?,
    }

    Ok(())
}
