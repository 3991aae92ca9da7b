//! Fetches a subscriber's rows, runs the accrual engine and renders the
//! position to the terminal.

use crate::config::AppConfig;
use crate::core::identity::{IdentityProvider, Role, SubscriberProfile};
use crate::core::records::{RawRows, RecordProvider};
use crate::core::summary::{self, LedgerEngine, SellerSummary, StockistSummary};
use crate::ui;
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use futures::future::join_all;
use tracing::debug;

pub async fn run_summary(
    config: &AppConfig,
    records: &dyn RecordProvider,
    identity: &dyn IdentityProvider,
    mobile: &str,
    role: Option<Role>,
    as_of: DateTime<Utc>,
) -> Result<()> {
    let profile = identity.lookup(mobile).await?;
    let roles = select_roles(&profile, role)?;

    let mut outputs = Vec::new();
    for role in roles {
        match role {
            Role::Seller => {
                let rows = fetch_seller_rows(config, records, mobile).await?;
                let summary = summary::summarize_seller(&rows, &config.seller.schema);
                let name = profile.seller_name.as_deref().unwrap_or(mobile);
                outputs.push(render_seller_summary(name, &summary));
            }
            Role::Stockist => {
                let (_, ledger) = fetch_stockist_rows(records, &profile).await?;
                let engine = LedgerEngine::new(
                    config.ledger_schema.clone(),
                    config.rates,
                    config.allocation,
                );
                let summary = engine.summarize(&ledger, as_of);
                let tab = profile.stockist_tab.as_deref().unwrap_or(mobile);
                outputs.push(render_stockist_summary(tab, &summary, as_of));
            }
        }
    }

    let count = outputs.len();
    for (index, output) in outputs.into_iter().enumerate() {
        println!("{output}");
        if index + 1 < count {
            ui::print_separator();
        }
    }
    Ok(())
}

pub async fn run_details(
    config: &AppConfig,
    records: &dyn RecordProvider,
    identity: &dyn IdentityProvider,
    mobile: &str,
    role: Option<Role>,
) -> Result<()> {
    let profile = identity.lookup(mobile).await?;
    let roles = select_roles(&profile, role)?;

    for role in roles {
        match role {
            Role::Seller => {
                let header = seller_header(config, records).await;
                let rows = fetch_seller_rows(config, records, mobile).await?;
                let name = profile.seller_name.as_deref().unwrap_or(mobile);
                let date_columns = [
                    config.seller.schema.date,
                    config.seller.schema.payment_date,
                ];
                println!(
                    "{}",
                    render_rows(&format!("Seller: {name}"), header, &rows, &date_columns)
                );
            }
            Role::Stockist => {
                let (header, ledger) = fetch_stockist_rows(records, &profile).await?;
                let tab = profile.stockist_tab.as_deref().unwrap_or(mobile);
                let schema = &config.ledger_schema;
                let date_columns = [
                    schema.date,
                    schema.repayment_date,
                    schema.cash_loan_date,
                    schema.margin_date,
                ];
                println!(
                    "{}",
                    render_rows(&format!("Stockist: {tab}"), header, &ledger, &date_columns)
                );
            }
        }
    }
    Ok(())
}

pub async fn run_tabs(config: &AppConfig, records: &dyn RecordProvider) -> Result<()> {
    let tabs = records.list_tabs().await?;

    let name_column = config.seller.schema.name;
    let mut sellers: Vec<String> = Vec::new();
    for tab in &config.seller.tabs {
        for row in records.fetch_rows(tab).await?.into_iter().skip(1) {
            if let Some(name) = row.get(name_column).map(|cell| cell.trim()) {
                if !name.is_empty() && !sellers.iter().any(|known| known == name) {
                    sellers.push(name.to_string());
                }
            }
        }
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Tabs"), ui::header_cell("Sellers")]);
    let rows = tabs.len().max(sellers.len());
    for index in 0..rows {
        table.add_row(vec![
            Cell::new(tabs.get(index).map(String::as_str).unwrap_or("")),
            Cell::new(sellers.get(index).map(String::as_str).unwrap_or("")),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn select_roles(profile: &SubscriberProfile, requested: Option<Role>) -> Result<Vec<Role>> {
    match requested {
        Some(role) if profile.has_role(role) => Ok(vec![role]),
        Some(role) => bail!("This number has no {role} account"),
        None => Ok(profile.roles()),
    }
}

/// Seller entries are spread across several tabs; fetch them concurrently
/// and keep the rows whose mobile column matches the subscriber.
async fn fetch_seller_rows(
    config: &AppConfig,
    records: &dyn RecordProvider,
    mobile: &str,
) -> Result<RawRows> {
    let pb = ui::new_progress_bar(config.seller.tabs.len() as u64, true);
    pb.set_message("Fetching seller tabs...");

    let fetches = config.seller.tabs.iter().map(|tab| {
        let pb = pb.clone();
        async move {
            let rows = records.fetch_rows(tab).await;
            pb.inc(1);
            rows
        }
    });
    let fetched = join_all(fetches).await;
    pb.finish_and_clear();

    let mobile_column = config.seller.schema.mobile;
    let mut rows = Vec::new();
    for tab_rows in fetched {
        rows.extend(tab_rows?.into_iter().skip(1).filter(|row| {
            row.get(mobile_column)
                .is_some_and(|cell| cell.trim() == mobile)
        }));
    }
    debug!("Matched {} seller rows for {}", rows.len(), mobile);
    Ok(rows)
}

async fn seller_header(config: &AppConfig, records: &dyn RecordProvider) -> Option<Vec<String>> {
    let tab = config.seller.tabs.first()?;
    records
        .fetch_rows(tab)
        .await
        .ok()
        .and_then(|rows| rows.into_iter().next())
}

/// Returns the ledger tab's header row and its data rows.
async fn fetch_stockist_rows(
    records: &dyn RecordProvider,
    profile: &SubscriberProfile,
) -> Result<(Option<Vec<String>>, RawRows)> {
    let Some(tab) = profile.stockist_tab.as_deref() else {
        bail!("Subscriber has no stockist ledger tab");
    };
    let mut rows = records.fetch_rows(tab).await?;
    let header = if rows.is_empty() {
        None
    } else {
        Some(rows.remove(0))
    };
    Ok((header, rows))
}

fn render_seller_summary(name: &str, summary: &SellerSummary) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Total Vehicles"),
        ui::value_cell(&summary.entry_count.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Total Quantity"),
        ui::value_cell(&format!("{:.2}", summary.total_quantity)),
    ]);
    table.add_row(vec![
        Cell::new("Total Payments"),
        ui::value_cell(&ui::format_currency(summary.total_payments)),
    ]);

    format!(
        "Seller: {}\n\n{}",
        ui::style_text(name, ui::StyleType::Title),
        table
    )
}

fn render_stockist_summary(tab: &str, summary: &StockistSummary, as_of: DateTime<Utc>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Total Quantity"),
        ui::value_cell(&ui::format_tons(summary.total_quantity)),
    ]);
    for (commodity, quantity) in &summary.quantity_by_commodity {
        table.add_row(vec![
            Cell::new(format!("Quantity ({commodity})")),
            ui::value_cell(&ui::format_tons(*quantity)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total Cost"),
        ui::value_cell(&ui::format_currency(summary.total_cost)),
    ]);
    table.add_row(vec![
        Cell::new("Total Cash Loan"),
        ui::value_cell(&ui::format_currency(summary.total_cash_loan)),
    ]);
    table.add_row(vec![
        Cell::new("Loan Against Margin"),
        ui::value_cell(&ui::format_currency(summary.net_margin_loan_balance)),
    ]);
    table.add_row(vec![
        Cell::new("Total Loan"),
        ui::value_cell(&ui::format_currency(summary.total_loan)),
    ]);

    let till = as_of.format("%d/%m/%Y");
    format!(
        "Stockist: {}\n\n{}\n\n{} {}\n{} {}",
        ui::style_text(tab, ui::StyleType::Title),
        table,
        ui::style_text(
            &format!("Total Warehouse Rental till {till}:"),
            ui::StyleType::TotalLabel
        ),
        ui::style_text(
            &ui::format_currency(summary.warehouse_rental),
            ui::StyleType::TotalValue
        ),
        ui::style_text(
            &format!("Total Interest till {till}:"),
            ui::StyleType::TotalLabel
        ),
        ui::style_text(
            &ui::format_currency(summary.total_interest),
            ui::StyleType::Accrual
        ),
    )
}

fn render_rows(
    title: &str,
    header: Option<Vec<String>>,
    rows: &RawRows,
    date_columns: &[usize],
) -> String {
    let mut table = ui::new_styled_table();
    if let Some(header) = header {
        table.set_header(
            header
                .iter()
                .map(|label| ui::header_cell(label))
                .collect::<Vec<_>>(),
        );
    }
    for row in rows {
        table.add_row(
            row.iter()
                .enumerate()
                .map(|(index, cell)| {
                    if date_columns.contains(&index) {
                        Cell::new(crate::core::dates::format_dd_mm_yyyy(cell))
                    } else {
                        Cell::new(cell)
                    }
                })
                .collect::<Vec<_>>(),
        );
    }

    format!("{}\n\n{}", ui::style_text(title, ui::StyleType::Title), table)
}
