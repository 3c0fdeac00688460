//! Reclaim admin console: list and verify recovery reports from the owner wallet.

mod console;
mod render;

use anyhow::Context;
use clap::Parser;
use reclaim_admin::{
    AdminConfig, AdminContext, AdminError, AmountPrompt, FixedAmount, SyncOutcome,
    VerificationOutcome,
};
use reclaim_types::ReportId;
use reclaim_utils::{init_logging, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::console::LinePrompt;

#[derive(Parser)]
#[command(name = "reclaim-admin", about = "Reclaim report administration console")]
struct Cli {
    /// JSON-RPC endpoint of the wallet node that holds the owner key.
    #[arg(long, env = "RECLAIM_RPC_URL")]
    rpc_url: Option<String>,

    /// Base URL of the reports backend.
    #[arg(long, env = "RECLAIM_BACKEND_URL")]
    backend_url: Option<String>,

    /// Address of the deployed report contract.
    #[arg(long, env = "RECLAIM_CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Address allowed to administer reports.
    #[arg(long, env = "RECLAIM_OWNER_ADDRESS")]
    owner_address: Option<String>,

    /// Seconds to wait for a verification to be included.
    #[arg(long, env = "RECLAIM_CONFIRMATION_TIMEOUT_SECS")]
    confirmation_timeout_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "RECLAIM_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "RECLAIM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Connect, load the report list and print it.
    Reports,
    /// Connect and verify one report, paying its reward.
    Verify {
        /// Report id (e.g. `7` or `#7`).
        #[arg(long)]
        id: ReportId,
        /// Reward in ETH. Asked for on stdin when omitted.
        #[arg(long)]
        amount: Option<String>,
    },
    /// Interactive console.
    Console,
}

impl Cli {
    /// Apply flag and env overrides on top of `base`.
    fn merge_into(&self, base: AdminConfig) -> AdminConfig {
        AdminConfig {
            rpc_url: self.rpc_url.clone().or(base.rpc_url),
            backend_url: self.backend_url.clone().unwrap_or(base.backend_url),
            contract_address: self.contract_address.clone().or(base.contract_address),
            owner_address: self.owner_address.clone().unwrap_or(base.owner_address),
            confirmation_timeout_secs: self
                .confirmation_timeout_secs
                .unwrap_or(base.confirmation_timeout_secs),
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            ..base
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => AdminConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AdminConfig::default(),
    };
    let config = cli.merge_into(base);

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let ctx = Arc::new(AdminContext::from_config(&config).map_err(|e| anyhow::anyhow!(e.notice()))?);
    tracing::info!(
        backend = %config.backend_url,
        wallet = config.rpc_url.as_deref().unwrap_or("none"),
        "admin console starting"
    );

    match cli.command {
        Command::Reports => {
            connect(&ctx).await?.map_err(|e| anyhow::anyhow!(e.notice()))?;
            println!("{}", render::reports(&ctx.reports().await));
        }
        Command::Verify { id, amount } => {
            let outcome = match amount {
                Some(amount) => verify_once(&ctx, id, &mut FixedAmount::new(amount)).await?,
                None => {
                    let mut lines = BufReader::new(tokio::io::stdin()).lines();
                    let mut stdout = tokio::io::stdout();
                    let mut prompt = LinePrompt::new(&mut lines, &mut stdout);
                    verify_once(&ctx, id, &mut prompt).await?
                }
            };
            println!("{}", render::verification(&outcome));
        }
        Command::Console => {
            let input = BufReader::new(tokio::io::stdin());
            console::run(ctx.clone(), input, tokio::io::stdout()).await?;
        }
    }

    tracing::info!("admin console exited");
    Ok(())
}

/// Connect and require an authorized session. The report load result is
/// returned for the caller to judge.
async fn connect(ctx: &AdminContext) -> anyhow::Result<Result<SyncOutcome, AdminError>> {
    let outcome = ctx.connect().await.map_err(|e| anyhow::anyhow!(e.notice()))?;
    eprintln!("{}", render::session(&outcome.session));
    if !outcome.session.is_authorized() {
        anyhow::bail!(AdminError::NotReady.notice());
    }
    Ok(outcome.sync)
}

/// Connect and verify one report. A failed report load does not block the
/// verification.
async fn verify_once(
    ctx: &AdminContext,
    id: ReportId,
    prompt: &mut dyn AmountPrompt,
) -> anyhow::Result<VerificationOutcome> {
    if let Err(e) = connect(ctx).await? {
        eprintln!("{}", e.notice());
    }
    ctx.verify_report(id, prompt)
        .await
        .map_err(|e| anyhow::anyhow!(e.notice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_admin::OWNER_ADDRESS;
    use reclaim_chain::WalletProvider;
    use reclaim_nullables::{NullReportSource, NullWalletProvider};
    use reclaim_types::{Identity, Report};

    fn context(
        account: &str,
        source: Arc<NullReportSource>,
    ) -> (AdminContext, Arc<NullWalletProvider>) {
        let config = AdminConfig {
            contract_address: Some("0x00000000000000000000000000000000000000c0".into()),
            ..AdminConfig::default()
        };
        let wallet = Arc::new(NullWalletProvider::with_account(
            Identity::parse(account).unwrap(),
        ));
        let ctx = AdminContext::with_boundaries(
            &config,
            Some(wallet.clone() as Arc<dyn WalletProvider>),
            source,
        )
        .unwrap();
        (ctx, wallet)
    }

    #[tokio::test]
    async fn verify_runs_when_report_load_fails() {
        let source = Arc::new(NullReportSource::with_reports(vec![Report::pending(1)]));
        source.fail_next("backend unavailable");
        let (ctx, wallet) = context(OWNER_ADDRESS, source.clone());

        let outcome = verify_once(&ctx, ReportId::new(1), &mut FixedAmount::new("0.2"))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            VerificationOutcome::Confirmed { refreshed: true, .. }
        ));
        assert_eq!(wallet.chain().submission_count(), 1);
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(ctx.reports().await.len(), 1);
    }

    #[tokio::test]
    async fn verify_refuses_stranger() {
        let source = Arc::new(NullReportSource::with_reports(vec![Report::pending(1)]));
        let (ctx, wallet) = context("0x1111111111111111111111111111111111111111", source);

        let err = verify_once(&ctx, ReportId::new(1), &mut FixedAmount::new("0.2"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), AdminError::NotReady.notice());
        assert_eq!(wallet.chain().submission_count(), 0);
    }
}
