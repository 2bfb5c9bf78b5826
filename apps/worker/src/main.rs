//! Reclaim retention worker runtime.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use reclaim_application::{SweepScheduler, SweepService};
use reclaim_core::{AppError, AppResult};
use reclaim_infrastructure::{
    AccessTokenProvider, ClientCredentialTokenProvider, CronRecurrenceSchedule,
    GRAPH_BETA_BASE_URL, GraphClient, GraphRecycleBinGateway, GraphStorageGateway,
    SharePointRecycleBinGateway, build_http_client,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let schedule = CronRecurrenceSchedule::parse(config.cron_schedule.as_str())?;
    let service = build_sweep_service(&config)?;

    let policy = service.policy();
    info!(
        tenant_id = %config.tenant_id,
        credential = ?config.credential,
        mode = policy.mode_label(),
        retention_days = policy.retention_days,
        purge_first_stage = policy.purge_first_stage,
        purge_second_stage = config.second_stage_domain().is_some(),
        require_recordings_folder = policy.require_recordings_folder,
        cron_schedule = schedule.expression(),
        run_once = config.run_once,
        "reclaim-worker started"
    );

    if config.sharepoint_domain.is_some() && config.second_stage_domain().is_none() {
        warn!("SHAREPOINT_DOMAIN is set but second-stage purge needs a client certificate");
    }

    if config.run_once {
        service.run_sweep().await;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    SweepScheduler::new(Arc::new(service), Arc::new(schedule))
        .run(cancel)
        .await;

    info!("reclaim-worker stopped");
    Ok(())
}

fn build_sweep_service(config: &WorkerConfig) -> AppResult<SweepService> {
    let http_client = build_http_client()?;
    let token_provider: Arc<dyn AccessTokenProvider> = Arc::new(ClientCredentialTokenProvider::new(
        http_client.clone(),
        config.tenant_id.as_str(),
        config.client_id.clone(),
        config.credential.clone(),
    ));
    let graph = GraphClient::new(http_client.clone(), token_provider.clone());

    let mut service = SweepService::new(
        Arc::new(GraphStorageGateway::new(graph.clone())),
        config.policy.clone(),
    )
    .with_first_stage_recycle_bin(Arc::new(GraphRecycleBinGateway::new(
        graph.with_base_url(GRAPH_BETA_BASE_URL),
    )));

    if let Some(domain) = config.second_stage_domain() {
        service = service.with_second_stage_recycle_bin(Arc::new(
            SharePointRecycleBinGateway::new(http_client, token_provider, domain)?,
        ));
    }

    Ok(service)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, stopping after the current step"),
        () = terminate => info!("received SIGTERM, stopping after the current step"),
    }
}
