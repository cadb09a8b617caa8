//! Replays the transaction log of every stock record and reports snapshots
//! that disagree with it. Prints the report as JSON on stdout and exits with
//! status 1 when any discrepancy is found.

use std::process::ExitCode;

use anyhow::{Context, bail};

use stockledger_infra::{AuditReport, LedgerAuditor, LedgerConfig, PostgresLedgerStore, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    stockledger_observability::init();

    let config = LedgerConfig::from_env().context("invalid ledger configuration")?;
    let report = run(&config).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize audit report")?
    );

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

async fn run(config: &LedgerConfig) -> anyhow::Result<AuditReport> {
    let StoreBackend::Postgres { database_url } = &config.backend else {
        bail!("the audit needs a persistent ledger; set LEDGER_STORE=postgres and DATABASE_URL");
    };

    let store = PostgresLedgerStore::connect(database_url, config.max_connections)
        .await
        .context("failed to connect to Postgres")?
        .with_lock_timeout(config.lock_timeout);
    store.ensure_schema().await.context("failed to prepare ledger schema")?;

    tracing::info!("starting ledger audit");
    let report = LedgerAuditor::new(store)
        .verify_all()
        .await
        .context("ledger audit failed")?;
    Ok(report)
}
