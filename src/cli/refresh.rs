use super::ui;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use anyhow::{Result, bail};
use chrono::Utc;

/// Runs one refresh cycle regardless of staleness and reports the result.
pub async fn run(coordinator: &RefreshCoordinator, currency: &str) -> Result<()> {
    let spinner = ui::new_spinner("Fetching market data...");
    let outcome = coordinator.refresh(Utc::now()).await;
    spinner.finish_and_clear();

    match outcome {
        RefreshOutcome::Refreshed(gold) => {
            println!(
                "Saved gold price: {} {currency} per gram",
                ui::style_text(&gold.price_per_gram.to_string(), ui::StyleType::Value)
            );
            Ok(())
        }
        RefreshOutcome::Fresh => Ok(()),
        RefreshOutcome::Failed => {
            println!(
                "{}",
                ui::style_text("Refresh failed, see log for details", ui::StyleType::Error)
            );
            bail!("Refresh failed")
        }
    }
}
