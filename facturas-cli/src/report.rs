//! Report rendering and CSV export.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Scalar totals, sorted by descending total for display.
pub fn render_totals(title: &str, totals: &HashMap<String, f64>) {
    println!("{title}");
    let mut rows: Vec<(&String, &f64)> = totals.iter().collect();
    rows.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (group, total) in rows {
        println!("  {:<30} {:>12.2}", group, total);
    }
    if totals.is_empty() {
        println!("  (sin datos)");
    }
}

/// Month-by-month table: one row per group, one column per month.
pub fn render_series(title: &str, series: &BTreeMap<String, BTreeMap<String, f64>>) {
    println!("{title}");
    let months: Vec<&String> = series
        .values()
        .next()
        .map(|row| row.keys().collect())
        .unwrap_or_default();

    print!("  {:<20}", "");
    for m in &months {
        print!(" {:>10}", m);
    }
    println!();

    for (group, row) in series {
        print!("  {:<20}", group);
        for m in &months {
            print!(" {:>10.2}", row.get(*m).copied().unwrap_or(0.0));
        }
        println!();
    }
    if series.is_empty() {
        println!("  (sin datos)");
    }
}

pub fn write_totals_csv(path: &Path, totals: &HashMap<String, f64>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.write_record(["grupo", "total"])?;
    let mut rows: Vec<(&String, &f64)> = totals.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (group, total) in rows {
        wtr.write_record([group.as_str(), &format!("{:.2}", total)])?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn write_series_csv(
    path: &Path,
    series: &BTreeMap<String, BTreeMap<String, f64>>,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    let months: Vec<String> = series
        .values()
        .next()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let mut header = vec!["grupo".to_string()];
    header.extend(months.iter().cloned());
    wtr.write_record(&header)?;

    for (group, row) in series {
        let mut record = vec![group.clone()];
        for m in &months {
            record.push(format!("{:.2}", row.get(m).copied().unwrap_or(0.0)));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}
