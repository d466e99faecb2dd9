//! Chalan CLI
//!
//! Binary wiring for the chalan service:
//! - Load configuration from environment/arguments
//! - Initialize the SQLite repository adapter
//! - Create the application service
//! - Dispatch one operation (issue, pay, reads, or the one-shot
//!   repair maintenance run)

mod roster;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chalan_repo::build_repo;
use chalan_service::directory::StaticDirectory;
use chalan_service::{ChalanService, run_repair};
use chalan_types::{IssueBatchRequest, OrgId, RecipientId, RecordPaymentRequest, VoucherId};

#[derive(Parser)]
#[command(name = "chalan")]
#[command(author, version, about = "Chalan issuance service CLI", long_about = None)]
struct Cli {
    /// SQLite database URL
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://chalan.db?mode=rwc"
    )]
    database_url: String,

    /// JSON roster mapping recipient/org ids to display data
    #[arg(long, env = "CHALAN_ROSTER")]
    roster: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue vouchers for a batch of recipients
    Issue {
        /// Issuing organization id (UUID)
        #[arg(long)]
        org: String,
        /// Recipient ids (comma-separated UUIDs)
        #[arg(long, value_delimiter = ',')]
        recipients: Vec<String>,
        /// Amount due per voucher, in smallest currency unit
        #[arg(long)]
        amount: i64,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: String,
        /// Period bucket, e.g. 202401
        #[arg(long)]
        period: String,
        /// Charge line label
        #[arg(long)]
        label: Option<String>,
    },
    /// Record a payment against an unpaid voucher
    Pay {
        /// Voucher id (UUID)
        #[arg(long)]
        voucher: String,
        /// Owning organization id (UUID)
        #[arg(long)]
        org: String,
        /// Payment date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Payment method, e.g. bank, cash
        #[arg(long)]
        method: String,
        /// External payment reference
        #[arg(long)]
        reference: Option<String>,
        /// Amount received; defaults to the voucher's full amount
        #[arg(long)]
        amount: Option<i64>,
    },
    /// Show a voucher by id or number
    Voucher {
        /// Voucher id (UUID)
        #[arg(long, conflicts_with = "number")]
        id: Option<String>,
        /// Voucher number
        #[arg(long)]
        number: Option<String>,
    },
    /// Show a recipient's ledger for a period
    Ledger {
        /// Recipient id (UUID)
        #[arg(long)]
        recipient: String,
        /// Period bucket, e.g. 202401
        #[arg(long)]
        period: String,
    },
    /// List all vouchers issued to a recipient
    Vouchers {
        /// Recipient id (UUID)
        #[arg(long)]
        recipient: String,
    },
    /// Rewrite fallback voucher numbers (one-shot maintenance run)
    Repair,
}

fn parse_recipient_id(s: &str) -> Result<RecipientId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid recipient ID: {}", s))
}

fn parse_org_id(s: &str) -> Result<OrgId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid org ID: {}", s))
}

fn parse_voucher_id(s: &str) -> Result<VoucherId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid voucher ID: {}", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid date (expected YYYY-MM-DD): {}", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chalan_cli=debug,chalan_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let directory = Arc::new(match &cli.roster {
        Some(path) => roster::load(path)?,
        None => StaticDirectory::new(),
    });

    tracing::info!("Using database: {}", cli.database_url);
    let repo = build_repo(&cli.database_url).await?;

    match cli.command {
        Commands::Issue {
            org,
            recipients,
            amount,
            due_date,
            period,
            label,
        } => {
            let recipient_ids = recipients
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| parse_recipient_id(s))
                .collect::<Result<Vec<_>>>()?;

            let service = ChalanService::new(repo, directory.clone(), directory.clone());
            let report = service
                .issue_batch(IssueBatchRequest {
                    org_id: parse_org_id(&org)?,
                    recipient_ids,
                    amount,
                    due_date: parse_date(&due_date)?,
                    period,
                    installment_label: label,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Pay {
            voucher,
            org,
            date,
            method,
            reference,
            amount,
        } => {
            let payment_date = match date {
                Some(s) => parse_date(&s)?,
                None => chrono::Utc::now().date_naive(),
            };

            let service = ChalanService::new(repo, directory.clone(), directory.clone());
            let view = service
                .record_payment(RecordPaymentRequest {
                    voucher_id: parse_voucher_id(&voucher)?,
                    org_id: parse_org_id(&org)?,
                    payment_date,
                    method,
                    reference,
                    amount,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::Voucher { id, number } => {
            let service = ChalanService::new(repo, directory.clone(), directory.clone());
            let view = match (id, number) {
                (Some(id), _) => service.voucher(parse_voucher_id(&id)?).await?,
                (None, Some(number)) => service.voucher_by_number(&number).await?,
                (None, None) => anyhow::bail!("Provide --id or --number"),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::Ledger { recipient, period } => {
            let service = ChalanService::new(repo, directory.clone(), directory.clone());
            let ledger = service
                .ledger(parse_recipient_id(&recipient)?, &period)
                .await?;
            println!("{}", serde_json::to_string_pretty(&ledger)?);
        }

        Commands::Vouchers { recipient } => {
            let service = ChalanService::new(repo, directory.clone(), directory.clone());
            let views = service
                .vouchers_for_recipient(parse_recipient_id(&recipient)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&views)?);
        }

        Commands::Repair => {
            // Per-record failures are logged and reported; only an
            // unreachable store exits nonzero, via the error return.
            let report = run_repair(&repo, directory.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
