use departure_board::config::BoardConfig;
use departure_board::darwin::{AnySource, DarwinClient, DarwinConfig, StaticBoardSource};
use departure_board::sensor::{Poller, SensorStore};
use departure_board::web::{AppState, create_router};
use tracing::{error, info};
use tracing_subscriber::fmt;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match BoardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    // Static data takes precedence so development never touches the API
    let source = if let Some(path) = &config.static_data {
        AnySource::Static(StaticBoardSource::new(path).expect("Failed to load static boards"))
    } else if let Some(api_key) = &config.api_key {
        AnySource::Live(
            DarwinClient::new(
                DarwinConfig::new(api_key).with_max_in_flight(config.destinations.len()),
            )
            .expect("Failed to create Darwin client"),
        )
    } else {
        error!("DARWIN_API_KEY or BOARD_STATIC_DATA must be set");
        std::process::exit(2);
    };

    let queries = config.queries();
    let store = SensorStore::new(&queries, chrono::Local::now().naive_local());

    let poller = Poller::new(
        source,
        queries,
        config.window(),
        config.service_hours,
        store.clone(),
    );
    tokio::spawn(poller.run(config.refresh_interval()));

    let app = create_router(AppState::new(store));

    let addr = config.bind_addr;
    info!(%addr, station = %config.station, "departure board listening");
    info!("  GET  /health                              - Health check");
    info!("  GET  /sensors                             - All sensors");
    info!("  GET  /sensors/{{station}}/{{destination}} - One sensor");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
