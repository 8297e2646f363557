mod bootstrap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use flight_core::formatting::{format_number, render_frequency_table, render_summaries, render_table};
use flight_core::schema::flights;
use flight_core::settings::Settings;
use flight_core::stats;
use flight_data::aggregator::{group_by_month, resample, Reduction, Resample};
use flight_data::analysis::{export_daily_sum, load_dataset};
use flight_data::query::{Predicate, Query};

fn main() -> Result<()> {
    let settings = Settings::default();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("flight-ops v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Settings: {}",
        serde_json::to_string(&settings).context("serializing settings")?
    );

    run(&settings)
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

/// The full walkthrough: load, describe, combine, index, aggregate, export
/// and filter, printing each result.
fn run(settings: &Settings) -> Result<()> {
    let n = settings.preview_rows;

    let dataset = load_dataset(settings).with_context(|| {
        format!(
            "loading sheets {:?} from {}",
            settings.sheets,
            settings.workbook.display()
        )
    })?;
    tracing::debug!(
        "Load metadata: {}",
        serde_json::to_string(&dataset.metadata).context("serializing load metadata")?
    );

    // ── First month ───────────────────────────────────────────────────────────
    let first = dataset
        .months
        .first()
        .context("no sheets configured")?;
    println!("{}", render_table(&first.head(n)));
    for (name, column_type) in first.schema() {
        println!("{name:<12} {column_type}");
    }

    let summaries = stats::describe(first);
    println!("{}", render_summaries(&summaries));
    tracing::debug!(
        "describe: {}",
        serde_json::to_string(&summaries).context("serializing describe output")?
    );

    let passengers = flights::PASSENGERS;
    let mean = stats::mean(first, passengers).context("passenger mean")?;
    let median = stats::median(first, passengers).context("passenger median")?;
    let std = stats::std_dev(first, passengers, 1).context("passenger std")?;
    let modes = stats::mode(first, passengers).context("passenger mode")?;
    println!("mean   {}", format_number(mean, 2));
    println!("median {}", format_number(median, 2));
    println!("std    {}", format_number(std, 2));
    if let Some(mode) = modes.first() {
        println!("mode   {mode}");
    }

    // ── Combined and indexed ──────────────────────────────────────────────────
    println!("{}", render_table(&dataset.combined.head(n)));
    println!("{}", render_table(&dataset.combined.tail(n)));

    let mut indexed = dataset.combined.clone();
    indexed
        .set_index(&settings.date_column)
        .with_context(|| format!("indexing by '{}'", settings.date_column))?;
    println!("{}", render_table(&indexed.head(n)));

    // ── Aggregation ───────────────────────────────────────────────────────────
    let daily = export_daily_sum(&dataset, settings).with_context(|| {
        format!("exporting daily sums to {}", settings.export_path.display())
    })?;
    println!("{}", render_table(&daily.head(n)));

    let monthly = group_by_month(&indexed, Reduction::Mean).context("monthly mean")?;
    println!("{}", render_table(&monthly.view()));

    let weekly = resample(&indexed, &Resample::weekly(settings.week_anchor, Reduction::Sum))
        .context("weekly sum")?;
    println!("{}", render_table(&weekly.view()));

    // ── Filters ───────────────────────────────────────────────────────────────
    let airport = flights::ARRIVAL_AIRPORT;
    let filters = [
        Predicate::eq(airport, "CTS"),
        Predicate::eq(flights::FLIGHT_NUMBER, "ABC011"),
        Predicate::ge(passengers, 150),
        Predicate::eq(airport, "CTS").or(Predicate::eq(airport, "AKJ")),
        Predicate::eq(airport, "TOY").and(Predicate::ge(passengers, 150)),
        Predicate::eq(airport, "OKA").and(Predicate::ge(flights::CARGO_WEIGHT, 15000)),
        Predicate::eq(airport, "FUK").or(Predicate::eq(airport, "OKA")),
        Predicate::date_between(date(2020, 11, 10)?, date(2020, 12, 10)?),
        Predicate::date_between(date(2020, 11, 25)?, date(2020, 12, 5)?)
            .and(Predicate::eq(airport, "HIJ")),
    ];
    for predicate in &filters {
        let view = indexed
            .filter(predicate)
            .with_context(|| format!("filtering by {predicate:?}"))?;
        tracing::info!("{} rows matched {:?}", view.len(), predicate);
        println!("{}", render_table(&view.head(n)));
    }

    let window = indexed
        .between(date(2020, 11, 25)?, date(2020, 12, 5)?)
        .context("date window")?;
    let hij = (&window)
        .filter(&Predicate::eq(airport, "HIJ"))
        .context("HIJ within date window")?;
    println!("{}", render_table(&hij));

    // ── Frequency table ───────────────────────────────────────────────────────
    let bins = stats::histogram(&daily, passengers, settings.histogram_bins)
        .context("daily passenger histogram")?;
    println!("{}", render_frequency_table(&bins));

    tracing::info!("Done");
    Ok(())
}
