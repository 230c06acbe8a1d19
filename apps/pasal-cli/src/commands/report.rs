//! `pasal report` - end-of-day figures.

use chrono::{Local, NaiveDate};
use std::fmt;

use super::{money, print_json};
use crate::config::PasalConfig;
use crate::error::CliResult;
use pasal_core::{DailySummary, Money};
use pasal_db::Database;

/// Totals for one local calendar day, today by default.
pub async fn daily(
    config: &PasalConfig,
    db: &Database,
    date: Option<NaiveDate>,
    json: bool,
) -> CliResult<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let summary = db.sales().daily_summary(date, &Local).await?;

    if json {
        return print_json(&summary);
    }

    print!("{}", render_summary(config, &summary));
    Ok(())
}

pub fn render_summary(config: &PasalConfig, summary: &DailySummary) -> String {
    SummaryText { config, summary }.to_string()
}

struct SummaryText<'a> {
    config: &'a PasalConfig,
    summary: &'a DailySummary,
}

impl SummaryText<'_> {
    fn row(&self, f: &mut fmt::Formatter<'_>, label: &str, paisa: i64) -> fmt::Result {
        writeln!(
            f,
            "{:<24}{:>16}",
            label,
            money(self.config, Money::from_paisa(paisa))
        )
    }
}

impl fmt::Display for SummaryText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;

        writeln!(
            f,
            "{} - {}",
            self.config.store_name,
            summary.date.format("%Y-%m-%d")
        )?;
        writeln!(f, "{:<24}{:>16}", "Sales", summary.sale_count)?;
        self.row(f, "Gross", summary.gross_paisa)?;
        self.row(f, "Discounts", -summary.discount_paisa)?;
        self.row(f, "Net", summary.net_paisa)?;
        self.row(f, "  VAT included", summary.tax_paisa)?;
        self.row(f, "  On khata", summary.khata_paisa)?;
        self.row(f, "  Collected", summary.net_paisa - summary.khata_paisa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_config;
    use pasal_db::DbConfig;

    #[test]
    fn test_render_summary() {
        let config = test_config();
        let summary = DailySummary {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            sale_count: 3,
            gross_paisa: 100_000,
            discount_paisa: 10_000,
            tax_paisa: 10_354,
            net_paisa: 90_000,
            khata_paisa: 30_000,
        };

        let text = render_summary(&config, &summary);
        assert!(text.contains("2026-10-19"));
        assert!(text.contains("-Rs. 100.00"));
        assert!(text.contains("Rs. 900.00"));
        assert!(text.contains("Rs. 103.54"));
        assert!(text.contains("Rs. 600.00"));
    }

    #[tokio::test]
    async fn test_daily_on_empty_store() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        let summary = db.sales().daily_summary(date, &Local).await.unwrap();
        assert_eq!(summary.sale_count, 0);
        assert_eq!(summary.net_paisa, 0);

        daily(&config, &db, Some(date), true).await.unwrap();
    }
}
