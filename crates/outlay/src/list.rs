// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `outlay list` command implementation.

use clap::Args;
use outlay_client::ExpenseClient;
use outlay_config::model::OutlayConfig;
use outlay_core::{ExpenseQuery, ExpenseSummary, OutlayError};
use tokio_util::sync::CancellationToken;

use crate::CommandError;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show this category.
    #[arg(long)]
    pub category: Option<String>,

    /// date_desc, date_asc or created_desc.
    #[arg(long)]
    pub sort: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

/// Runs the `outlay list` command.
pub async fn run_list(config: &OutlayConfig, args: ListArgs) -> Result<(), CommandError> {
    let query = ExpenseQuery::from_params(args.category.as_deref(), args.sort.as_deref())?;
    let client = ExpenseClient::new(config)?;
    let summary = client
        .list_expenses(&query, &CancellationToken::new())
        .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| OutlayError::Internal(format!("failed to encode expenses: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", render_table(&summary));
    }
    Ok(())
}

fn render_table(summary: &ExpenseSummary) -> String {
    if summary.expenses.is_empty() {
        return "No expenses recorded.\n".to_string();
    }

    let category_width = summary
        .expenses
        .iter()
        .map(|e| e.category.chars().count())
        .max()
        .unwrap_or(0)
        .max("Category".len());

    let mut out = format!(
        "{:<10}  {:<category_width$}  {:>12}  Description\n",
        "Date", "Category", "Amount"
    );
    for e in &summary.expenses {
        out.push_str(&format!(
            "{:<10}  {:<category_width$}  {:>12}  {}\n",
            e.date.to_string(),
            e.category,
            e.amount.to_string(),
            e.description
        ));
    }
    out.push_str(&format!(
        "\n{} expense(s), total {}\n",
        summary.count, summary.total
    ));
    out
}
