use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tailboard_core::session::{SessionState, StopReason};
use tailboard_core::target::TailTarget;
use tailboard_tail::config::TailConfig;
use tailboard_tail::relay::{RelayClient, RelayError, QUEUE_POLL_INTERVAL};
use tailboard_tail::render;
use tailboard_tail::tailer::Tailer;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // stdout belongs to the log window.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tailboard_tail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = match TailConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        relay_url = %config.relay_url,
        job = %config.job_name,
        trigger = config.trigger,
        "Loaded tail configuration"
    );

    let relay = match RelayClient::new(&config.relay_url, config.credentials.clone()) {
        Ok(relay) => relay,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build relay client");
            return ExitCode::FAILURE;
        }
    };

    // --- Target ---
    let build_number = match resolve_build_number(&relay, &config).await {
        Ok(number) => number,
        Err(e) => {
            tracing::error!(error = %e, "Could not determine which build to tail");
            return ExitCode::FAILURE;
        }
    };
    let target = TailTarget::new(config.jenkins_url.clone(), config.job_name.clone(), build_number);

    // --- Tail ---
    let tailer = Tailer::new(Arc::new(relay), config.settings.clone());
    let mut views = tailer.subscribe();
    tailer.start_session(target.clone()).await;

    let title = target.to_string();
    let mut stdout = std::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        let view = views.borrow_and_update().clone();
        if let Err(e) = render::paint(&mut stdout, &view, &title) {
            tracing::error!(error = %e, "Cannot write to terminal");
            tailer.stop_session().await;
            return ExitCode::FAILURE;
        }

        if let SessionState::Stopped(reason) = view.state {
            tracing::info!(reason = ?reason, "Tail session ended");
            return match reason {
                StopReason::Error => ExitCode::FAILURE,
                StopReason::Manual | StopReason::Complete => ExitCode::SUCCESS,
            };
        }

        tokio::select! {
            result = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                tailer.stop_session().await;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    return ExitCode::FAILURE;
                }
            }
        }
    }
}

/// The configured build, or a freshly triggered one once it leaves the queue.
async fn resolve_build_number(relay: &RelayClient, config: &TailConfig) -> Result<u64, RelayError> {
    if let (false, Some(number)) = (config.trigger, config.build_number) {
        return Ok(number);
    }

    let queue_id = relay.trigger_build(&config.jenkins_url, &config.job_name).await?;
    tracing::info!(queue_id, job = %config.job_name, "Build queued, waiting for an executor");
    relay
        .wait_for_build_number(&config.jenkins_url, queue_id, QUEUE_POLL_INTERVAL, config.queue_wait)
        .await
}
