//! Report command implementations

use std::sync::Arc;

use anyhow::{anyhow, Result};
use cadence_core::analytics::{projected_total, SpendingStatistics, TrendAnalysis};
use cadence_core::models::Subscription;
use cadence_core::{Analytics, Database, DateRange, EngineConfig, RangeKind, UnusedWindow};
use chrono::Utc;
use serde::Serialize;

use super::{print_json, truncate};

fn analytics(db: &Database, config: EngineConfig) -> Analytics {
    Analytics::new(Arc::new(db.clone()), config)
}

/// Resolve a --range argument to a range ending today
pub fn resolve_range(range: &str) -> Result<DateRange> {
    let kind: RangeKind = range.parse().map_err(|e: String| anyhow!(e))?;
    if kind == RangeKind::Custom {
        return Err(anyhow!(
            "Custom ranges are not supported here (valid: week, month, quarter, year)"
        ));
    }
    Ok(DateRange::for_kind(kind, Utc::now().date_naive()))
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

#[derive(Serialize)]
struct TrendReport<'a> {
    range: &'a DateRange,
    points: &'a [cadence_core::analytics::SpendingDataPoint],
    statistics: SpendingStatistics,
    trend: TrendAnalysis,
}

pub async fn cmd_trend(db: &Database, config: EngineConfig, range: &str, json: bool) -> Result<()> {
    let range = resolve_range(range)?;
    let mut analytics = analytics(db, config);

    let points = analytics.spending_trend(&range).await?;
    let statistics = analytics.spending_statistics(&range).await?;
    let trend = analytics.linear_trend_analysis(&range).await?;

    if json {
        return print_json(&TrendReport {
            range: &range,
            points: &points,
            statistics,
            trend,
        });
    }

    println!();
    println!(
        "📈 Spending Trend ({}: {} to {}, by {})",
        range.kind.as_str(),
        range.start,
        range.end,
        range.bucket_unit().as_str()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for point in &points {
        let marker = if point.is_significant { " ⚠️" } else { "" };
        println!(
            "   {} │ {:>10} │ {}{}",
            point.date,
            format!("${:.2}", point.total),
            bar(point.total, statistics.peak, 30),
            marker
        );
    }

    println!();
    println!(
        "   Total: ${:.2}   Average: ${:.2}   Peak: ${:.2}",
        statistics.total, statistics.average, statistics.peak
    );
    println!(
        "   Direction: {} ({:+.1}%), next bucket ≈ ${:.2}",
        trend.direction, trend.percentage_change, trend.next_prediction
    );

    Ok(())
}

#[derive(Serialize)]
struct BreakdownReport {
    total_monthly_cost: f64,
    monthly_average: f64,
    categories: Vec<cadence_core::analytics::CategorySpending>,
}

pub async fn cmd_breakdown(db: &Database, config: EngineConfig, json: bool) -> Result<()> {
    let mut analytics = analytics(db, config);
    let categories = analytics.category_breakdown().await?;
    let monthly_average = analytics.monthly_average().await?;
    let total_monthly_cost = analytics.total_monthly_cost().await?;

    if json {
        return print_json(&BreakdownReport {
            total_monthly_cost,
            monthly_average,
            categories,
        });
    }

    println!();
    println!("🗂️  Monthly Spend by Category");
    println!("   ─────────────────────────────────────────────────────────────");

    if categories.is_empty() {
        println!("   No active subscriptions.");
    }
    for cat in &categories {
        println!(
            "   {:14} │ {:>10} │ {:>5.1}% │ {} sub(s)",
            cat.category.as_str(),
            format!("${:.2}", cat.total),
            cat.percentage,
            cat.count
        );
    }

    println!();
    println!("   Subscriptions: ${:.2}/month", total_monthly_cost);
    println!("   Average monthly spend (this year): ${:.2}", monthly_average);
    Ok(())
}

pub async fn cmd_yoy(db: &Database, config: EngineConfig, json: bool) -> Result<()> {
    let comparison = analytics(db, config).year_over_year().await?;

    if json {
        return print_json(&comparison);
    }

    println!();
    println!("📆 Year over Year");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   This year ({} to {}): ${:.2}",
        comparison.this_year_start, comparison.this_year_end, comparison.this_year_total
    );
    println!(
        "   Last year ({} to {}): ${:.2}",
        comparison.last_year_start, comparison.last_year_end, comparison.last_year_total
    );
    println!("   Change: {:+.1}%", comparison.percentage_change);

    if !comparison.growing.is_empty() {
        println!();
        println!("   Growing:");
        for growth in &comparison.growing {
            println!(
                "     📈 {:14} ${:.2} → ${:.2} ({:+.1}%)",
                growth.category.as_str(),
                growth.last_year,
                growth.this_year,
                growth.growth
            );
        }
    }
    if !comparison.declining.is_empty() {
        println!();
        println!("   Declining:");
        for growth in &comparison.declining {
            println!(
                "     📉 {:14} ${:.2} → ${:.2} ({:+.1}%)",
                growth.category.as_str(),
                growth.last_year,
                growth.this_year,
                growth.growth
            );
        }
    }
    Ok(())
}

pub async fn cmd_forecast(
    db: &Database,
    config: EngineConfig,
    months: Option<u32>,
    json: bool,
) -> Result<()> {
    let months = months.unwrap_or(config.forecast_months);
    let forecast = analytics(db, config).forecast(months).await?;

    if json {
        return print_json(&forecast);
    }

    println!();
    println!("🔮 Forecast ({} month(s))", months);
    println!("   ─────────────────────────────────────────────────────────────");
    for value in &forecast {
        println!(
            "   {} │ {:>10} │ ${:.2} to ${:.2} │ {:.0}% confidence",
            value.date.format("%Y-%m"),
            format!("${:.2}", value.predicted),
            value.lower_bound,
            value.upper_bound,
            value.confidence * 100.0
        );
    }
    println!();
    println!("   Projected total: ${:.2}", projected_total(&forecast));
    Ok(())
}

pub async fn cmd_suggestions(db: &Database, config: EngineConfig, json: bool) -> Result<()> {
    let suggestions = analytics(db, config).savings_suggestions().await?;

    if json {
        return print_json(&suggestions);
    }

    if suggestions.is_empty() {
        println!("✨ No savings suggestions right now.");
        return Ok(());
    }

    println!();
    println!("💡 Savings Suggestions");
    println!("   ─────────────────────────────────────────────────────────────");
    for s in &suggestions {
        println!(
            "   [{:6}] {:20} │ {:>9}/yr │ {}",
            s.priority.as_str(),
            truncate(&s.subscription_name, 20),
            format!("${:.2}", s.potential_savings),
            s.reason
        );
    }

    let total: f64 = suggestions.iter().map(|s| s.potential_savings).sum();
    println!();
    println!("   Potential savings: ${:.2}/year", total);
    Ok(())
}

fn print_subscription_list(title: &str, empty: &str, subs: &[Subscription]) {
    if subs.is_empty() {
        println!("{}", empty);
        return;
    }

    println!();
    println!("{}", title);
    println!("   ─────────────────────────────────────────────────────────────");
    for sub in subs {
        let last_used = sub
            .last_used_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "   {:>4} {:20} │ {:>8}/mo │ last used {}",
            sub.id,
            truncate(&sub.name, 20),
            format!("${:.2}", sub.monthly_equivalent()),
            last_used
        );
    }
}

pub async fn cmd_unused(
    db: &Database,
    config: EngineConfig,
    window: &str,
    json: bool,
) -> Result<()> {
    let window: UnusedWindow = window.parse().map_err(|e: String| anyhow!(e))?;
    let unused = analytics(db, config).detect_unused(window).await?;

    if json {
        return print_json(&unused);
    }

    print_subscription_list(
        &format!("💤 Unused for {}+ days", window.days()),
        "✅ Every active subscription has been used recently.",
        &unused,
    );
    Ok(())
}

pub async fn cmd_cancellations(db: &Database, config: EngineConfig, json: bool) -> Result<()> {
    let candidates = analytics(db, config).cancellation_candidates().await?;

    if json {
        return print_json(&candidates);
    }

    print_subscription_list(
        "✂️  Cancellation Candidates",
        "✅ Nothing worth cancelling right now.",
        &candidates,
    );
    Ok(())
}
