use std::net::SocketAddr;
use std::sync::Arc;

use evaserve::models::{AppState, Config, Error};
use opentelemetry::trace::TracerProvider as _;
use tokio::signal;
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod flags {
    xflags::xflags! {
        /// Job history ledger and response envelope server.
        cmd evaserve {
            /// HTTP port, overrides HTTP_PORT.
            optional -p, --port port: u16
            /// Keep job history in process memory instead of Postgres.
            optional --in-memory
            /// Apply database migrations before serving.
            optional --migrate
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let flags = flags::Evaserve::from_env_or_exit();
    let mut config = Config::from_env()?;
    if let Some(port) = flags.port {
        config.http_port = port;
    }
    let _provider = init_tracing(&config);

    let state = match flags.in_memory {
        true => AppState::in_memory(config),
        false => AppState::new(config, flags.migrate).await?,
    };
    info!({ instance_id = state.instance_id }, "start");
    start_http_server(&state).await?;

    info!("->> SHUTDOWN");
    Ok(())
}

/// The returned provider must outlive the subscriber, its tracers only hold
/// a weak reference to it.
fn init_tracing(config: &Config) -> Option<opentelemetry_sdk::trace::TracerProvider> {
    // OpenTelemetry pipeline that prints spans to stdout
    let provider = config.otel_stdout.then(|| {
        opentelemetry_sdk::trace::TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()
    });
    let otel = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("evaserve")));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evaserve=debug,tower_http=debug".into()),
        )
        .with(otel)
        .with(tracing_subscriber::fmt::layer())
        .init();
    provider
}

async fn start_http_server(state: &Arc<AppState>) -> Result<(), Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let app = evaserve::app(Arc::clone(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!({ instance_id = state.instance_id, %addr }, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::warn!("signal received, starting graceful shutdown");
}
