// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `outlay add` command implementation.
//!
//! Without `--key` the expense goes through a [`SubmissionController`],
//! which picks a fresh idempotency key and reports retries as they are
//! scheduled. With `--key` the given key is used as-is, so re-running the
//! same command after an unclear failure cannot record the expense twice.

use std::sync::Arc;

use clap::Args;
use outlay_client::{ExpenseClient, SubmissionController, SubmissionState};
use outlay_config::model::OutlayConfig;
use outlay_core::{CreateOutcome, IdempotencyKey, NewExpense};
use tokio_util::sync::CancellationToken;

use crate::CommandError;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Amount in major units, e.g. 12.50.
    #[arg(long)]
    pub amount: f64,

    #[arg(long)]
    pub category: String,

    #[arg(long)]
    pub description: String,

    /// Calendar date (YYYY-MM-DD); defaults to today in UTC, the day the
    /// server validates against.
    #[arg(long)]
    pub date: Option<String>,

    /// Reuse this idempotency key instead of generating one.
    #[arg(long)]
    pub key: Option<String>,
}

impl AddArgs {
    fn to_expense(&self) -> NewExpense {
        NewExpense {
            amount: self.amount,
            category: self.category.clone(),
            description: self.description.clone(),
            date: self
                .date
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().date_naive().to_string()),
        }
    }
}

/// Runs the `outlay add` command.
///
/// Ctrl-C stops the submission. That is reported as a notice, not an error.
pub async fn run_add(config: &OutlayConfig, args: AddArgs) -> Result<(), CommandError> {
    let client = ExpenseClient::new(config)?;
    let expense = args.to_expense();

    let result = match args.key.as_deref() {
        Some(raw) => {
            let key = IdempotencyKey::parse(raw)?;
            let cancel = CancellationToken::new();
            let on_ctrl_c = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                }
            });
            let result = submit_with_key(&client, &expense, &key, &cancel).await;
            on_ctrl_c.abort();
            result
        }
        None => submit_guarded(client, config, &expense).await,
    };

    match settle(result)? {
        Some(line) => println!("{line}"),
        None => eprintln!("cancelled; the expense may or may not have been recorded"),
    }
    Ok(())
}

/// The line to print for a finished submission, or `None` when it was
/// cancelled.
fn settle(result: Result<CreateOutcome, CommandError>) -> Result<Option<String>, CommandError> {
    match result {
        Ok(outcome) => Ok(Some(describe(&outcome))),
        Err(e) if e.is_cancelled() => Ok(None),
        Err(e) => Err(e),
    }
}

async fn submit_with_key(
    client: &ExpenseClient,
    expense: &NewExpense,
    key: &IdempotencyKey,
    cancel: &CancellationToken,
) -> Result<CreateOutcome, CommandError> {
    let result = client
        .create_expense(expense, key, cancel, |notice| {
            eprintln!(
                "retry {}/{} in {:?}: {}",
                notice.attempt, notice.max_retries, notice.delay, notice.error
            );
        })
        .await;
    Ok(result?)
}

async fn submit_guarded(
    client: ExpenseClient,
    config: &OutlayConfig,
    expense: &NewExpense,
) -> Result<CreateOutcome, CommandError> {
    let controller = Arc::new(SubmissionController::from_config(
        client,
        &config.submission,
    ));

    let mut states = controller.subscribe();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if let SubmissionState::Retrying {
                attempt,
                max_retries,
                delay,
            } = state
            {
                eprintln!("retry {attempt}/{max_retries} in {delay:?}");
            }
        }
    });
    let on_ctrl_c = tokio::spawn({
        let controller = controller.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel().await;
            }
        }
    });

    let result = controller.submit(expense).await;
    on_ctrl_c.abort();
    progress.abort();
    Ok(result?)
}

fn describe(outcome: &CreateOutcome) -> String {
    let e = &outcome.expense;
    let verb = if outcome.replayed {
        "Already recorded"
    } else {
        "Recorded"
    };
    format!(
        "{verb} {} {} ({}) on {} [id {}]",
        e.amount, e.category, e.description, e.date, e.id
    )
}
