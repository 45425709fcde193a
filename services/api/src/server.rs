use crate::cli::ServeArgs;
use crate::infra::{AppState, EventSink, LoggingEventPublisher};
use crate::routes::with_principle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use principle::config::AppConfig;
use principle::error::AppError;
use principle::telemetry;
use principle::upstream::{HttpEventPublisher, HttpUpstreams};
use principle::workflows::principle::{InMemoryPrincipleRepository, PrincipleService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let upstreams = HttpUpstreams::from_config(&config.upstream)?;
    let events = match config.upstream.event_bus_url.as_deref() {
        Some(url) => EventSink::Bus(HttpEventPublisher::new(
            url,
            config.upstream.timeout(),
            config.upstream.api_token.clone(),
        )?),
        None => {
            warn!("EVENT_BUS_URL not set; principle events will only be logged");
            EventSink::Log(LoggingEventPublisher)
        }
    };

    let repository = Arc::new(InMemoryPrincipleRepository::new());
    let principle_service = Arc::new(PrincipleService::new(
        repository,
        Arc::new(events),
        upstreams,
        config.policy.clone(),
    ));

    let app = with_principle_routes(principle_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "principle orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
