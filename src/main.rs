// Church Admin - CLI / TUI entry point

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use church_admin::dues::{self, DuesOptions, DuesSummary};
use church_admin::entities::{Household, Transaction, TransactionQuery};
use church_admin::listing::{ListQuery, Paged, SortDirection};
use church_admin::views::{self, DuesView};
use church_admin::{export, phone, telemetry, ApiClient, AppConfig, StaticToken};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Church administration from the terminal", long_about = None)]
struct Cli {
    /// Backend base URL (overrides CHURCH_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer ID token (overrides CHURCH_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive screens (default)
    Tui,
    /// Member registry
    Members(ListArgs),
    /// Members with their roles
    Roles(ListArgs),
    /// Payments and donations
    Transactions(TransactionArgs),
    /// Monthly dues calendar for a member or household
    Dues(DuesArgs),
    Vendors(ListArgs),
    Employees(ListArgs),
    Voicemails(ListArgs),
    /// Write members and/or transactions to CSV
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    #[arg(long, default_value = "")]
    search: String,

    /// key=value, repeatable (e.g. --filter role=admin)
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// key, or key:desc
    #[arg(long)]
    sort: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Args, Debug)]
struct TransactionArgs {
    #[command(flatten)]
    list: ListArgs,

    /// Read transactions from an exported CSV instead of the backend
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Limit to one calendar year
    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    member: Option<String>,
}

#[derive(Args, Debug)]
struct DuesArgs {
    /// Member id (with --household, any member of the household)
    #[arg(long)]
    member: String,

    #[arg(long)]
    household: bool,

    /// Defaults to the current year
    #[arg(long)]
    year: Option<i32>,

    /// Carry the excess of a large dues payment into later months
    #[arg(long)]
    prorate: bool,

    /// Offline: read transactions from an exported CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Offline: annual pledge (required with --csv)
    #[arg(long)]
    pledge: Option<f64>,

    /// Offline: membership start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    members: Option<PathBuf>,

    #[arg(long)]
    transactions: Option<PathBuf>,

    /// Limit exported transactions to one calendar year
    #[arg(long)]
    year: Option<i32>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

impl ListArgs {
    fn query(&self, default_page_size: usize) -> ListQuery {
        let mut query = ListQuery::default()
            .with_search(self.search.clone())
            .with_page(self.page, self.page_size.unwrap_or(default_page_size));
        for (key, value) in &self.filters {
            query = query.with_filter(key.clone(), value.clone());
        }
        if let Some(sort) = &self.sort {
            let (key, direction) = match sort.split_once(':') {
                Some((key, dir)) => (key, SortDirection::parse(dir)),
                None => (sort.as_str(), SortDirection::Asc),
            };
            query = query.with_sort(key, direction);
        }
        query
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?
        .with_base_url(cli.base_url.clone())
        .with_token(cli.token.clone());
    telemetry::init(config.log_json);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        None | Some(Command::Tui) => run_ui_mode(&runtime, &config),
        Some(command) => runtime.block_on(run_command(command, &config, cli.json)),
    }
}

fn client(config: &AppConfig) -> Result<ApiClient> {
    let token = config
        .api_token
        .clone()
        .context("No ID token: pass --token or set CHURCH_API_TOKEN")?;
    let client = ApiClient::new(config, Arc::new(StaticToken::new(token)))?;
    info!(base_url = client.base_url(), "using backend");
    Ok(client)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn year_range(year: i32) -> (Option<NaiveDate>, Option<NaiveDate>) {
    (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31))
}

async fn run_command(command: Command, config: &AppConfig, json: bool) -> Result<()> {
    match command {
        Command::Tui => bail!("the TUI is started outside the command runner"),
        Command::Members(args) => {
            let members = client(config)?.list_members().await?;
            let paged = views::member_rows(&members, &args.query(config.page_size));
            emit(json, &paged, || print_members(&paged))
        }
        Command::Roles(args) => {
            let members = client(config)?.list_members().await?;
            let paged = views::role_rows(&members, &args.query(config.page_size));
            emit(json, &paged, || {
                for row in &paged.items {
                    let roles: Vec<&str> = row.roles.iter().map(|r| r.label()).collect();
                    println!("{:<8} {:<28} {}", row.member_id, row.name, roles.join(", "));
                }
                print_page_footer(&paged);
            })
        }
        Command::Transactions(args) => run_transactions(args, config, json).await,
        Command::Dues(args) => run_dues(args, config, json).await,
        Command::Vendors(args) => {
            let vendors = client(config)?.list_vendors().await?;
            let paged = views::vendor_rows(&vendors, &args.query(config.page_size));
            emit(json, &paged, || {
                for v in &paged.items {
                    println!(
                        "{:<28} {:<16} {:<24} {}",
                        v.name,
                        v.vendor_type.as_deref().unwrap_or("-"),
                        v.contact_person.as_deref().unwrap_or("-"),
                        if v.active { "active" } else { "inactive" }
                    );
                }
                print_page_footer(&paged);
            })
        }
        Command::Employees(args) => {
            let employees = client(config)?.list_employees().await?;
            let paged = views::employee_rows(&employees, &args.query(config.page_size));
            emit(json, &paged, || {
                for e in &paged.items {
                    println!(
                        "{:<28} {:<20} {:<12} {}",
                        e.full_name(),
                        e.position.as_deref().unwrap_or("-"),
                        e.employment_type.as_deref().unwrap_or("-"),
                        e.email.as_deref().unwrap_or("-")
                    );
                }
                print_page_footer(&paged);
            })
        }
        Command::Voicemails(args) => {
            let voicemails = client(config)?.list_voicemails().await?;
            let paged = views::voicemail_rows(&voicemails, &args.query(config.page_size));
            emit(json, &paged, || {
                println!("📞 {} unheard", views::unheard_count(&voicemails));
                for v in &paged.items {
                    println!(
                        "{} {:<17} {:<16} {:>6}  {}",
                        if v.listened { " " } else { "●" },
                        v.created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                        phone::format_display(&v.from_number).unwrap_or_else(|| v.from_number.clone()),
                        v.duration_label(),
                        v.transcription.as_deref().unwrap_or("")
                    );
                }
                print_page_footer(&paged);
            })
        }
        Command::Export(args) => run_export(args, config).await,
    }
}

async fn run_transactions(args: TransactionArgs, config: &AppConfig, json: bool) -> Result<()> {
    let (start_date, end_date) = args.year.map(year_range).unwrap_or((None, None));
    let server_query = TransactionQuery {
        member_id: args.member.clone(),
        start_date,
        end_date,
        ..Default::default()
    };

    let transactions: Vec<Transaction> = match &args.csv {
        Some(path) => export::load_transactions(path)?
            .into_iter()
            .filter(|tx| server_query.matches(tx))
            .collect(),
        None => client(config)?.list_transactions(&server_query).await?,
    };

    let paged = views::transaction_rows(&transactions, &args.list.query(config.page_size));
    let totals = views::transaction_totals(&transactions);

    #[derive(Serialize)]
    struct Output<'a> {
        totals: &'a views::TransactionTotals,
        #[serde(flatten)]
        page: &'a Paged<Transaction>,
    }

    emit(json, &Output { totals: &totals, page: &paged }, || {
        println!("💵 {} transactions, ${:.2}", totals.count, totals.total);
        for (kind, amount) in &totals.by_type {
            println!("   {kind:<16} ${amount:.2}");
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for tx in &paged.items {
            println!(
                "{} {:<28} {:>10.2} {:<16} {:<12} {}",
                tx.payment_date.format("%Y-%m-%d"),
                tx.display_name(),
                tx.amount,
                tx.payment_type.label(),
                tx.payment_method.as_str(),
                tx.receipt_number.as_deref().unwrap_or("")
            );
        }
        print_page_footer(&paged);
    })
}

async fn run_dues(args: DuesArgs, config: &AppConfig, json: bool) -> Result<()> {
    let year = args.year.unwrap_or_else(|| today().year());

    let (view, transactions) = match &args.csv {
        Some(path) => {
            if args.household {
                bail!("--household needs the backend's member registry; drop --csv");
            }
            let pledge = args
                .pledge
                .context("--pledge is required with --csv")?;
            let own: Vec<Transaction> = export::load_transactions(path)?
                .into_iter()
                .filter(|tx| tx.member_id.as_deref() == Some(args.member.as_str()))
                .collect();
            let options = DuesOptions {
                membership_start: args.start,
                prorate_one_time: args.prorate,
            };
            let view = DuesView {
                subject_id: args.member.clone(),
                name: format!("Member {}", args.member),
                household_size: 1,
                summary: dues::compute_dues(pledge, &own, year, today(), &options),
            };
            (view, own)
        }
        None => {
            let client = client(config)?;
            let member = client.get_member(&args.member).await?;
            if args.household {
                let members = client.list_members().await?;
                let household = Household::of(&member, &members);
                // One request per member, awaited in turn
                let mut transactions = Vec::new();
                for id in household.member_ids() {
                    transactions.extend(client.member_transactions(id, year).await?);
                }
                let view = views::household_dues_view(&household, &transactions, year, today(), args.prorate);
                (view, transactions)
            } else {
                let roster = church_admin::fail_open("members", client.list_members().await);
                let transactions = client.member_transactions(&member.id, year).await?;
                let view = views::member_dues_view(&member, &roster, &transactions, year, today(), args.prorate);
                (view, transactions)
            }
        }
    };

    emit(json, &view, || {
        print_dues(&view);
        let history = views::dues_history(&transactions, year);
        if !history.is_empty() {
            println!("\nDues payments:");
            for tx in history {
                println!(
                    "   {} {:>10.2} {:<12} {}",
                    tx.payment_date.format("%Y-%m-%d"),
                    tx.amount,
                    tx.payment_method.as_str(),
                    tx.receipt_number.as_deref().unwrap_or("")
                );
            }
        }
    })
}

async fn run_export(args: ExportArgs, config: &AppConfig) -> Result<()> {
    if args.members.is_none() && args.transactions.is_none() {
        bail!("nothing to export: pass --members <file> and/or --transactions <file>");
    }
    let client = client(config)?;

    if let Some(path) = &args.members {
        let members = client.list_members().await?;
        let count = export::export_members(path, &members)?;
        println!("✓ {count} members → {}", path.display());
    }

    if let Some(path) = &args.transactions {
        let (start_date, end_date) = args.year.map(year_range).unwrap_or((None, None));
        let query = TransactionQuery {
            start_date,
            end_date,
            ..Default::default()
        };
        let transactions = client.list_transactions(&query).await?;
        let count = export::export_transactions(path, &transactions)?;
        println!("✓ {count} transactions → {}", path.display());
    }

    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table();
    }
    Ok(())
}

fn print_page_footer<T>(paged: &Paged<T>) {
    println!(
        "── page {}/{} · {} total",
        paged.page,
        paged.total_pages.max(1),
        paged.total_items
    );
}

fn print_members(paged: &Paged<church_admin::Member>) {
    for m in &paged.items {
        let phone_label = m
            .phone
            .as_deref()
            .map(|p| phone::format_display(p).unwrap_or_else(|| p.to_string()))
            .unwrap_or_default();
        println!(
            "{:<8} {:<28} {:<30} {:<16} {:>9.2} {}",
            m.id,
            m.full_name(),
            m.email.as_deref().unwrap_or("-"),
            phone_label,
            m.pledge_amount,
            m.role_labels()
        );
    }
    print_page_footer(paged);
}

fn print_dues(view: &DuesView) {
    let s: &DuesSummary = &view.summary;
    println!("📅 {} - dues {}", view.name, s.year);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Pledge ${:.2}/yr · monthly ${:.2} · collected ${:.2} · remaining ${:.2}",
        s.annual_pledge, s.monthly_payment, s.dues_collected, s.remaining
    );

    let filled = usize::from(s.progress) / 5;
    println!("[{}{}] {}%", "█".repeat(filled), "░".repeat(20 - filled), s.progress);

    println!("\n{:<6} {:>10} {:>10} {:>10}  status", "month", "expected", "paid", "due");
    for m in &s.months {
        println!(
            "{:<6} {:>10.2} {:>10.2} {:>10.2}  {}",
            m.label,
            m.expected,
            m.paid,
            m.due,
            m.status.as_str()
        );
    }

    if s.is_current() {
        println!("\n✅ Up to date");
    } else {
        println!("\n⚠️  ${:.2} due over {} month(s)", s.total_due, s.months_due());
    }

    let other = s.contributions.non_zero();
    if !other.is_empty() {
        println!("\nOther giving:");
        for (label, amount) in other {
            println!("   {label:<16} ${amount:.2}");
        }
    }
}

// ============================================================================
// TUI
// ============================================================================

/// Transactions from the backend, fetched on the shared runtime
#[cfg(feature = "tui")]
struct RemoteTransactions {
    client: ApiClient,
    runtime: tokio::runtime::Handle,
}

#[cfg(feature = "tui")]
impl ui::TransactionSource for RemoteTransactions {
    fn fetch(&mut self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        Ok(self.runtime.block_on(self.client.list_transactions(query))?)
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(runtime: &tokio::runtime::Runtime, config: &AppConfig) -> Result<()> {
    println!("🖥️  Loading church admin...\n");

    let client = client(config)?;
    let members = runtime.block_on(client.list_members())?;
    let voicemails = church_admin::fail_open("voicemails", runtime.block_on(client.list_voicemails()));
    println!("✓ Loaded {} members, {} voicemails", members.len(), voicemails.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let source = RemoteTransactions {
        client,
        runtime: runtime.handle().clone(),
    };
    let mut app = ui::App::new(
        members,
        voicemails,
        Box::new(source),
        config.page_size,
        config.search_debounce,
        today(),
    );
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_runtime: &tokio::runtime::Runtime, _config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a subcommand: church-admin --help");
    std::process::exit(1);
}
