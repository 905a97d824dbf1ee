//! Moorage server — notification and event dispatch core.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::Response;
use axum::routing::get;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

use moorage_core::config::AppConfig;
use moorage_core::context::RequestContext;
use moorage_core::error::AppError;
use moorage_core::settings::RuntimeSettings;

use moorage_audit::common::{CommonEventState, DatabaseUserNameLookup, resolve_common_events};
use moorage_audit::common::resolvers::default_registry;
use moorage_audit::{AUDIT_TOPICS, AuditHandler, DatabaseAuditStore, PurgeService, SyslogForwarder};
use moorage_database::DatabasePool;
use moorage_database::repositories::audit::AuditRepository;
use moorage_database::repositories::job::JobRepository;
use moorage_database::repositories::policy::PolicyRepository;
use moorage_database::repositories::project::{ProjectRepository, UserRepository};
use moorage_database::repositories::replication::ReplicationRepository;
use moorage_database::repositories::scan::ScanReportRepository;
use moorage_events::EventBus;
use moorage_events::collector::{CollectorState, collect_events};
use moorage_notifier::dispatcher::WEBHOOK_TOPICS;
use moorage_notifier::formatter::FormatterRegistry;
use moorage_notifier::lookup::{
    DatabaseProjectLookup, DatabaseReplicationLookup, DatabaseScanReportLookup,
};
use moorage_notifier::project::{CachingProjectLookup, ProjectLookup};
use moorage_notifier::{PolicyService, QueueHookSender, WebhookHandler};
use moorage_worker::jobs::{AuditPurgeJobHandler, DeliveryJobHandler};
use moorage_worker::{CronScheduler, JobExecutor, JobQueue, WorkerRunner};

/// Capacity of the in-process project metadata cache.
const PROJECT_CACHE_CAPACITY: u64 = 1024;
/// TTL of cached project metadata.
const PROJECT_CACHE_TTL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let env = std::env::var("MOORAGE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Moorage v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    db.migrate().await?;

    // ── Step 2: Runtime settings ─────────────────────────────────
    let settings = Arc::new(RuntimeSettings::from_config(
        &config.notification,
        &config.audit,
    ));

    // ── Step 3: Repositories ─────────────────────────────────────
    let policy_repo = PolicyRepository::new(db.pool().clone());
    let job_repo = JobRepository::new(db.pool().clone());
    let audit_repo = AuditRepository::new(db.pool().clone());
    let project_repo = ProjectRepository::new(db.pool().clone());
    let user_repo = UserRepository::new(db.pool().clone());
    let scan_repo = ScanReportRepository::new(db.pool().clone());
    let replication_repo = ReplicationRepository::new(db.pool().clone());

    // ── Step 4: Event bus + handlers ─────────────────────────────
    let bus = Arc::new(EventBus::new());
    let notification = Arc::new(config.notification.clone());

    let projects: Arc<dyn ProjectLookup> = Arc::new(CachingProjectLookup::new(
        Arc::new(DatabaseProjectLookup::new(project_repo)),
        PROJECT_CACHE_CAPACITY,
        PROJECT_CACHE_TTL,
    ));
    let webhook_handler = Arc::new(WebhookHandler::new(
        Arc::clone(&settings),
        Arc::clone(&notification),
        projects,
        Arc::new(DatabaseScanReportLookup::new(scan_repo)),
        Arc::new(DatabaseReplicationLookup::new(replication_repo)),
        Arc::new(PolicyService::new(policy_repo.clone(), job_repo.clone())),
        Arc::new(FormatterRegistry::with_defaults()),
        Arc::new(QueueHookSender::new(job_repo.clone())),
    ));
    bus.subscribe_all(WEBHOOK_TOPICS, webhook_handler)?;

    let audit_handler = Arc::new(AuditHandler::new(
        Arc::clone(&settings),
        Arc::new(DatabaseAuditStore::new(audit_repo.clone())),
        Arc::new(SyslogForwarder::new(Arc::clone(&settings))),
    ));
    bus.subscribe_all(AUDIT_TOPICS, audit_handler)?;

    tracing::info!("Event handlers subscribed");

    // ── Step 5: HTTP router ──────────────────────────────────────
    let resolver_registry = Arc::new(default_registry(Arc::new(DatabaseUserNameLookup::new(
        user_repo,
    )))?);
    let common_state = CommonEventState {
        registry: resolver_registry,
        settings: Arc::clone(&settings),
    };
    let collector_state = CollectorState {
        bus: Arc::clone(&bus),
        notification: Arc::clone(&notification),
    };

    let app = Router::new()
        .route("/health", get(health))
        .with_state(db.clone())
        .layer(from_fn_with_state(common_state, resolve_common_events))
        .layer(from_fn_with_state(collector_state, collect_events))
        .layer(from_fn(request_context))
        .layer(TraceLayer::new_for_http());

    // ── Step 6: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 7: Background worker + scheduler ────────────────────
    let (worker_handle, mut scheduler) = if config.worker.enabled {
        let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let job_queue = Arc::new(JobQueue::new(job_repo.clone(), worker_id.clone()));

        let mut executor = JobExecutor::new();
        executor.register(Arc::new(DeliveryJobHandler::webhook()?));
        executor.register(Arc::new(DeliveryJobHandler::slack()?));
        executor.register(Arc::new(DeliveryJobHandler::teams()?));
        executor.register(Arc::new(AuditPurgeJobHandler::new(
            Arc::new(PurgeService::new(audit_repo, &config.audit)),
            &config.audit,
        )));

        let runner = WorkerRunner::new(
            Arc::clone(&job_queue),
            Arc::new(executor),
            config.worker.clone(),
            worker_id,
        );
        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });

        let scheduler = CronScheduler::new(job_queue).await?;
        scheduler
            .register_audit_purge(&config.worker.purge_schedule, &config.audit)
            .await?;
        scheduler.start().await?;

        tracing::info!("Background worker started");
        (Some(handle), Some(scheduler))
    } else {
        tracing::info!("Background worker disabled");
        (None, None)
    };

    // ── Step 8: Serve ────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Moorage server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        let _ = tokio::time::timeout(grace, handle).await;
    }
    db.close().await;

    tracing::info!("Moorage server shut down gracefully");
    Ok(())
}

/// Liveness/readiness probe: answers 200 only when the database responds.
async fn health(State(db): State<DatabasePool>) -> StatusCode {
    match db.health_check().await {
        Ok(true) => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Attach the request-scoped [`RequestContext`] from the edge headers.
/// Authentication happens upstream; the proxy forwards the principal in
/// `X-Remote-User` and the correlation id in `X-Request-Id`.
async fn request_context(mut request: Request, next: Next) -> Response {
    let principal = request
        .headers()
        .get("x-remote-user")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut ctx = match principal {
        Some(p) => RequestContext::new(p),
        None => RequestContext::anonymous(),
    };
    if let Some(id) = request_id {
        ctx = ctx.with_request_id(id);
    }
    request.extensions_mut().insert(ctx);

    next.run(request).await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
