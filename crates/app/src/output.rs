//! Conversions from engine values to the JSON/CSV shapes in `api_types`, and
//! the plain text rendering used when neither is requested.

use std::{collections::BTreeMap, io::Write};

use api_types::{
    product::ProductRow,
    report::{CategoryCount, HistoryEntry, MonthlySpend, PriceTrend, Report, Summary, TrendPoint},
};
use engine::{MonthYear, ProductView, PurchaseList, ReportSummary};

use crate::error::Result;

pub fn summary(summary: &ReportSummary) -> Summary {
    Summary {
        total_spent_minor: summary.total_spent.cents(),
        total_spent: summary.total_spent.to_string(),
        average_spent_per_list: summary.average_spent_per_list,
        top_categories: summary
            .top_categories
            .iter()
            .map(|c| CategoryCount {
                category: c.category.as_str().to_string(),
                count: c.count,
            })
            .collect(),
        spend_by_month: summary
            .spend_by_month
            .iter()
            .map(|(month, total)| MonthlySpend {
                month: month.to_string(),
                total_minor: total.cents(),
                total: total.to_string(),
            })
            .collect(),
    }
}

pub fn report(report_summary: &ReportSummary, history: &[&PurchaseList]) -> Report {
    Report {
        summary: summary(report_summary),
        history: history
            .iter()
            .map(|list| HistoryEntry {
                id: list.id,
                store: list.store.clone(),
                created_at: list.created_at,
                products: list.products.len(),
                total: list.total.to_string(),
            })
            .collect(),
    }
}

pub fn trend(product: &str, points: &BTreeMap<MonthYear, f64>) -> PriceTrend {
    PriceTrend {
        product: product.trim().to_string(),
        points: points
            .iter()
            .map(|(month, average)| TrendPoint {
                month: month.to_string(),
                average_price: *average,
            })
            .collect(),
    }
}

pub fn product_row(view: &ProductView) -> ProductRow {
    let product = &view.product;
    ProductRow {
        list_id: view.list_id,
        list_store: view.list_store.clone(),
        month: view.month_year.to_string(),
        purchase_date: product.purchase_date,
        name: product.name.clone(),
        brand: product.brand.clone(),
        category: product.category.as_str().to_string(),
        price: product.price.to_string(),
        quantity: product.quantity.to_string(),
        quantity_unit: product.quantity_unit.as_str().to_string(),
        active: product.active,
    }
}

pub fn print_json<T: serde::Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn print_report(out: &mut impl Write, report: &Report) -> Result<()> {
    let summary = &report.summary;
    writeln!(out, "Total spent:        {}", summary.total_spent)?;
    writeln!(
        out,
        "Average per list:   ${:.2}",
        summary.average_spent_per_list
    )?;

    if !summary.top_categories.is_empty() {
        writeln!(out, "\nTop categories")?;
        for (rank, category) in summary.top_categories.iter().enumerate() {
            writeln!(out, "  {}. {:<20} {}", rank + 1, category.category, category.count)?;
        }
    }

    if !summary.spend_by_month.is_empty() {
        writeln!(out, "\nSpend by month")?;
        for month in &summary.spend_by_month {
            writeln!(out, "  {:<8} {:>12}", month.month, month.total)?;
        }
    }

    writeln!(out, "\nHistory")?;
    if report.history.is_empty() {
        writeln!(out, "  no saved lists")?;
    }
    for entry in &report.history {
        let date = entry
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {date:<10} {:<20} {:>3} products {:>12}  {}",
            entry.store, entry.products, entry.total, entry.id
        )?;
    }
    Ok(())
}

pub fn print_trend(out: &mut impl Write, trend: &PriceTrend) -> Result<()> {
    if trend.points.is_empty() {
        writeln!(out, "No purchases of \"{}\"", trend.product)?;
        return Ok(());
    }
    writeln!(out, "Average price of \"{}\"", trend.product)?;
    for point in &trend.points {
        writeln!(out, "  {:<8} ${:.2}", point.month, point.average_price)?;
    }
    Ok(())
}

pub fn print_products(out: &mut impl Write, rows: &[ProductRow]) -> Result<()> {
    for row in rows {
        writeln!(
            out,
            "{}  {:<24} {:<14} {:<18} {:>10} {:>6} {:<4} {}{}",
            row.purchase_date,
            row.name,
            row.brand.as_deref().unwrap_or("-"),
            row.category,
            row.price,
            row.quantity,
            row.quantity_unit,
            row.list_store,
            if row.active { "" } else { " (hidden)" },
        )?;
    }
    Ok(())
}

pub fn write_csv(out: impl Write, rows: &[ProductRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use engine::{
        Category, Money, Product, Quantity, QuantityUnit, compute_total, flatten_products,
        summarize,
    };
    use uuid::Uuid;

    use super::*;

    fn saved_list() -> PurchaseList {
        let products = vec![Product {
            id: Uuid::new_v4(),
            store: "Mercado".to_string(),
            name: "Rice".to_string(),
            price: Money::new(250),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            quantity: Quantity::from_thousandths(1500),
            quantity_unit: QuantityUnit::Kg,
            category: Category::Pantry,
            brand: Some("Diana".to_string()),
            active: true,
        }];
        PurchaseList {
            id: Uuid::new_v4(),
            owner_id: "alice".to_string(),
            store: "Mercado".to_string(),
            total: compute_total(&products),
            products,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single(),
            updated_at: None,
        }
    }

    #[test]
    fn report_uses_month_labels_and_money_text() {
        let lists = vec![saved_list()];
        let history: Vec<_> = lists.iter().collect();
        let report = report(&summarize(&lists), &history);

        assert_eq!(report.summary.total_spent, "$2.50");
        assert_eq!(report.summary.spend_by_month[0].month, "1/2024");
        assert_eq!(report.summary.top_categories[0].category, "pantry");
        assert_eq!(report.history.len(), 1);

        let mut text = Vec::new();
        print_report(&mut text, &report).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Average per list:   $2.50"));
        assert!(text.contains("1/2024"));
    }

    #[test]
    fn csv_has_header_and_one_row_per_product() {
        let lists = vec![saved_list()];
        let rows: Vec<_> = flatten_products(&lists).iter().map(product_row).collect();

        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let mut lines = csv.lines();

        assert!(lines.next().unwrap().starts_with("list_id,list_store,month"));
        let row = lines.next().unwrap();
        assert!(row.contains("Rice"));
        assert!(row.contains("1.5,kg"));
        assert!(lines.next().is_none());
    }
}
