use log::{error, info, warn};
use pageshot::cdp::CdpSession;
use pageshot::cli::Cli;
use pageshot::{app, Session};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_normalized();

    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", if cli.verbose { "debug" } else { "info" })
        .write_style_or("RUST_LOG_STYLE", "always");
    env_logger::init_from_env(env);

    info!("{}", app::banner());

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "## will try url: {}, and save screenshot here: {}",
        config.url,
        config.filename.display()
    );

    let session = match CdpSession::new(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let result = app::run(&config, &session, &cancel).await;
    if let Err(e) = session.close() {
        warn!("closing browser: {}", e);
    }

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
