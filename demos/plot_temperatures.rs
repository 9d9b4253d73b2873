//! demos/plot_temperatures.rs
//!
//! Fetches the latest temperatures of every station on a Netatmo account and
//! plots them, then prints the pipeline log underneath.
//!
//! Needs NETATMO_CLIENT_ID, NETATMO_CLIENT_SECRET and NETATMO_REFRESH_TOKEN.
//!
//! cargo run --example plot_temperatures --features demos

use std::error::Error;
use std::sync::Arc;

use netatmo_temps::{
    Credentials, MemoryLogSink, Netatmo, PipelineConfig, TemperatureFrame, TimeWindow,
    LABEL_COLUMN, TEMPERATURE_COLUMN, TIME_COLUMN,
};
use plotlars::{Plot, Text, TimeSeriesPlot};
use polars::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let log = Arc::new(MemoryLogSink::new());
    let client = Netatmo::builder()
        .credentials(Credentials::from_env()?)
        .log_sink(log.clone())
        .build();

    let series = client
        .temperatures()
        .config(
            PipelineConfig::builder()
                .window(TimeWindow::TrailingDays(7))
                .build(),
        )
        .call()
        .await?;

    let frame = series.to_frame()?;
    if frame.is_empty() {
        println!("No temperature data available.");
    } else {
        println!("{}", frame.frame);
        let (wide, labels) = one_column_per_label(&frame)?;
        plot_temperatures(&wide, &labels);
    }

    println!("\nLog:");
    for line in log.lines() {
        println!("  {}", line);
    }

    Ok(())
}

/// Spreads the temperature column into one column per "device (module)" label,
/// so every sensor is drawn as its own series.
fn one_column_per_label(frame: &TemperatureFrame) -> PolarsResult<(DataFrame, Vec<String>)> {
    let labels = frame.labels()?;
    let mut columns = vec![col(TIME_COLUMN)];
    columns.extend(labels.iter().map(|label| {
        when(col(LABEL_COLUMN).eq(lit(label.as_str())))
            .then(col(TEMPERATURE_COLUMN))
            .otherwise(lit(NULL))
            .alias(label.as_str())
    }));
    let wide = frame.frame.clone().lazy().select(columns).collect()?;
    Ok((wide, labels))
}

fn plot_temperatures(data: &DataFrame, labels: &[String]) {
    let Some((first, rest)) = labels.split_first() else {
        return;
    };
    TimeSeriesPlot::builder()
        .data(data)
        .x(TIME_COLUMN)
        .y(first)
        .additional_series(rest.iter().map(String::as_str).collect())
        .size(8)
        .with_shape(true)
        .plot_title(Text::from("Temperature Over Time").font("Arial").size(18))
        .x_title("Time")
        .y_title("Temperature (°C)")
        .build()
        .plot();
}
