use super::ui;
use crate::core::{ExchangeRateObservation, GoldPriceObservation};
use chrono::{DateTime, Utc};
use comfy_table::Cell;

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Renders gold prices as a table, newest first as given.
pub fn gold_table(observations: &[GoldPriceObservation], currency: &str, metal: &str) -> String {
    if observations.is_empty() {
        return ui::style_text("No gold prices recorded yet.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell(&format!("{metal} per gram ({currency})")),
        ui::header_cell("Observed at"),
    ]);
    for obs in observations {
        table.add_row(vec![
            ui::number_cell(obs.id),
            ui::number_cell(obs.price_per_gram),
            Cell::new(format_time(obs.observed_at)),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(&format!("{metal}/{currency} history"), ui::StyleType::Title),
        table
    )
}

/// Renders exchange rates as a table, newest first as given.
pub fn rate_table(observations: &[ExchangeRateObservation], currency: &str) -> String {
    if observations.is_empty() {
        return ui::style_text("No exchange rates recorded yet.", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell(&format!("USD/{currency}")),
        ui::header_cell("Observed at"),
    ]);
    for obs in observations {
        table.add_row(vec![
            ui::number_cell(obs.id),
            ui::number_cell(obs.rate),
            Cell::new(format_time(obs.observed_at)),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(&format!("USD/{currency} history"), ui::StyleType::Title),
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_gold_table_contains_rows() {
        let observations = vec![GoldPriceObservation {
            id: 3,
            price_per_gram: Decimal::from_str("4186.4021").unwrap(),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }];

        let output = gold_table(&observations, "EGP", "XAU");
        assert!(output.contains("4186.4021"));
        assert!(output.contains("2025-03-01 12:00:00 UTC"));
        assert!(output.contains("XAU per gram (EGP)"));
    }

    #[test]
    fn test_rate_table_contains_rows() {
        let observations = vec![ExchangeRateObservation {
            id: 1,
            rate: Decimal::from_str("49.5012").unwrap(),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }];

        let output = rate_table(&observations, "EGP");
        assert!(output.contains("49.5012"));
        assert!(output.contains("USD/EGP"));
    }

    #[test]
    fn test_empty_tables() {
        assert!(gold_table(&[], "EGP", "XAU").contains("No gold prices"));
        assert!(rate_table(&[], "EGP").contains("No exchange rates"));
    }
}
