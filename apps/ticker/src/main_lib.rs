use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use marketpulse_core::charts::{window_result, SeriesSource};
use marketpulse_core::{ChartRenderer, PollSnapshot, PollerConfig, QuotePoller};
use marketpulse_market_data::{HttpTransport, MarketDataClient, RateLimiter, Transport};

use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("MP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_client(config: &Config) -> Arc<MarketDataClient> {
    let transport: Arc<dyn Transport> = match &config.base_url {
        Some(base_url) => Arc::new(HttpTransport::with_base_url(&config.api_key, base_url)),
        None => Arc::new(HttpTransport::new(&config.api_key)),
    };
    let limiter = RateLimiter::shared(config.rate_limit);
    Arc::new(MarketDataClient::new(transport, limiter))
}

/// Render the configured chart, then poll quotes until ctrl-c.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let client = build_client(&config);
    info!(
        "Polling {} every {:?} (provider spacing {:?})",
        config.symbols.join(","),
        config.refresh_interval,
        config.rate_limit
    );

    render_chart(&client, &config).await?;

    let poller = QuotePoller::new(
        client.clone(),
        PollerConfig {
            symbols: config.symbols.clone(),
            refresh_interval: config.refresh_interval,
            enabled: true,
        },
    );
    let mut updates = poller.subscribe();
    poller.start();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
        }
    }

    poller.stop();
    info!("Ticker stopped");
    Ok(())
}

async fn render_chart(client: &MarketDataClient, config: &Config) -> anyhow::Result<()> {
    let symbol = &config.chart_symbol;
    let timeframe = config.chart_timeframe;

    let series = match timeframe.source() {
        SeriesSource::Intraday(interval) => client.get_intraday(symbol, interval).await,
        SeriesSource::Daily => client.get_daily(symbol).await,
    };
    let chart_window = window_result(series, timeframe, Utc::now(), &mut rand::thread_rng());
    if let Some(reason) = chart_window.reason() {
        warn!("{} {} chart is synthetic: {:?}", symbol, timeframe, reason);
    }

    let renderer = ChartRenderer::new(
        &chart_window,
        config.chart_width,
        config.chart_height,
        config.theme.clone(),
    )?;
    let canvas = renderer.render()?;

    let file = File::create(&config.chart_out)
        .with_context(|| format!("Failed to create {}", config.chart_out.display()))?;
    canvas
        .write_ppm(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", config.chart_out.display()))?;

    info!(
        "Wrote {} {} chart ({} points, {}x{}) to {}",
        symbol,
        timeframe,
        chart_window.points().len(),
        canvas.width(),
        canvas.height(),
        config.chart_out.display()
    );
    Ok(())
}

fn log_snapshot(snapshot: &PollSnapshot) {
    if snapshot.is_loading {
        return;
    }
    if let Some(error) = &snapshot.last_error {
        warn!(
            "Quote refresh failed, showing {} stale quotes: {}",
            snapshot.quotes.len(),
            error
        );
        return;
    }

    for quote in &snapshot.quotes {
        let direction = if quote.is_up() { "up" } else { "down" };
        info!(
            "{:<6} {:>10} {:>+8} ({:+}%) {:<4} vol {}",
            quote.symbol, quote.price, quote.change, quote.change_percent, direction, quote.volume
        );
    }
    for failure in &snapshot.failures {
        warn!("{}: {}", failure.symbol, failure.reason);
    }
}
