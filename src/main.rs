use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use reqwest::Url;
use tracing_subscriber::EnvFilter;

use bill_tracker::{
    connect, resolve_config, Bill, CashFlow, ConfigSource, DateRange, Feedback, HttpApi, Income,
    IncomeFrequency, Month, NewBill, NewIncome, StoreError, UnifiedStore,
};

#[derive(Parser)]
#[command(name = "bill-tracker", version, about = "Track bills, income and cash flow")]
struct Cli {
    /// Runtime configuration file (environment.json)
    #[arg(long, env = "BILL_TRACKER_ENV_FILE", default_value = "env/environment.json", global = true)]
    env_file: PathBuf,

    /// Origin serving /env/environment.json; takes precedence over --env-file
    #[arg(long, env = "BILL_TRACKER_ORIGIN", global = true)]
    origin: Option<Url>,

    /// Hide the progress bar
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the logged-in user
    User,
    /// List bills
    Bills {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show a bill with its monthly paid status
    Bill { id: String },
    /// Create a bill
    AddBill(NewBillArgs),
    /// Change fields of an existing bill
    EditBill(EditArgs),
    /// Mark a bill paid (or unpaid) for a month
    Pay {
        id: String,
        year: i32,
        month: u32,
        /// Due day of the entry; looked up from the bill when omitted
        #[arg(long)]
        day: Option<u32>,
        #[arg(long)]
        unpaid: bool,
    },
    /// List income sources
    Incomes {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show an income source
    Income { id: String },
    /// Create an income source
    AddIncome(NewIncomeArgs),
    /// Change fields of an existing income source
    EditIncome(EditArgs),
    /// Month-by-month bills against income
    Cashflow {
        /// First month (defaults to the current month)
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..=1200))]
        months: u32,
        /// Balance at the start of the first month
        #[arg(long, default_value_t = 0.0)]
        opening: f64,
    },
}

#[derive(Args)]
struct NewBillArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    due_day: u32,
    /// Defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct NewIncomeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: f64,
    /// once, weekly, fortnightly, monthly or yearly
    #[arg(long)]
    frequency: IncomeFrequency,
    /// Defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    amount: Option<f64>,
    /// Bills only
    #[arg(long)]
    due_day: Option<u32>,
    /// Income only
    #[arg(long)]
    frequency: Option<IncomeFrequency>,
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Bills only
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Store errors have already been shown to the user
            if e.downcast_ref::<StoreError>().is_none() {
                eprintln!("❌ {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let source = match cli.origin {
        Some(origin) => ConfigSource::Origin(origin),
        None => ConfigSource::File(cli.env_file),
    };
    let config = resolve_config(&source).await;
    let stores = connect(config.as_ref(), Feedback::console(!cli.quiet))?;
    let store = &stores.unified;
    let today = Utc::now().date_naive();

    match cli.command {
        Command::User => {
            store.get_current_user().await;
            match store.current_user() {
                Some(user) => {
                    println!("👤 {} ({})", user.label(), user.username);
                    if let Some(email) = &user.email {
                        println!("   {}", email);
                    }
                }
                None => bail!("not logged in"),
            }
        }
        Command::Bills { start, end } => {
            store.load_bills(DateRange::new(start, end)).await;
            print_bills(&store.bills_list());
        }
        Command::Bill { id } => {
            let bill = store.load_bill(&id).await?;
            print_bill_detail(&bill);
        }
        Command::AddBill(args) => {
            let mut bill = NewBill::new(args.name, args.amount, args.due_day, args.start.unwrap_or(today));
            bill.end_date = args.end;
            bill.category = args.category;
            bill.notes = args.notes;
            let created = store.new_bill(&bill).await?;
            println!("✓ Created bill {}", created.id().unwrap_or("?"));
        }
        Command::EditBill(args) => {
            let mut bill = store.load_bill(&args.id).await?;
            apply_bill_edits(&mut bill, &args)?;
            let saved = store.save_bill(&bill).await?;
            print_bill_detail(&saved);
        }
        Command::Pay { id, year, month, day, unpaid } => {
            let day = match day {
                Some(day) => day,
                None => due_day_for(store, &id, year, month).await?,
            };
            let entry = Month {
                paid: !unpaid,
                ..Month::new(year, month, day)
            };
            let updated = store.change_paid_status(&id, entry).await?;
            println!(
                "✓ {} {:04}-{:02}-{:02} marked {}",
                id,
                updated.year,
                updated.month,
                updated.day,
                if updated.paid { "paid" } else { "unpaid" }
            );
        }
        Command::Incomes { start, end } => {
            store.load_incomes(DateRange::new(start, end)).await;
            print_incomes(&store.incomes_list());
        }
        Command::Income { id } => {
            let income = store.load_income(&id).await?;
            print_incomes(std::slice::from_ref(&income));
        }
        Command::AddIncome(args) => {
            let mut income = NewIncome::new(args.name, args.amount, args.frequency, args.start.unwrap_or(today));
            income.end_date = args.end;
            income.notes = args.notes;
            let created = store.new_income(&income).await?;
            println!("✓ Created income {}", created.id().unwrap_or("?"));
        }
        Command::EditIncome(args) => {
            let mut income = store.load_income(&args.id).await?;
            apply_income_edits(&mut income, &args)?;
            let saved = store.save_income(&income).await?;
            print_incomes(std::slice::from_ref(&saved));
        }
        Command::Cashflow { from, months, opening } => {
            let from = from.unwrap_or(today);
            store.load_bills(DateRange::all()).await;
            store.load_incomes(DateRange::all()).await;
            print_cash_flow(&store.cash_flow(from, months, opening));
        }
    }

    Ok(())
}

/// Due day of the bill's entry in the given month
async fn due_day_for(store: &UnifiedStore<HttpApi>, id: &str, year: i32, month: u32) -> Result<u32> {
    let bill = store
        .get_bill_by_id(id)
        .await
        .ok_or_else(|| anyhow!("bill {} not available", id))?;
    let entry = bill
        .months_in(year, month)
        .next()
        .ok_or_else(|| anyhow!("bill {} has no entry for {:04}-{:02}", id, year, month))?;
    Ok(entry.day)
}

fn apply_bill_edits(bill: &mut Bill, args: &EditArgs) -> Result<()> {
    if args.frequency.is_some() {
        bail!("--frequency applies to income only");
    }
    if let Some(name) = &args.name {
        bill.name = name.clone();
    }
    if let Some(amount) = args.amount {
        bill.amount = amount;
    }
    if let Some(due_day) = args.due_day {
        bill.due_day = due_day;
    }
    if args.end.is_some() {
        bill.end_date = args.end;
    }
    if args.category.is_some() {
        bill.category = args.category.clone();
    }
    if args.notes.is_some() {
        bill.notes = args.notes.clone();
    }
    Ok(())
}

fn apply_income_edits(income: &mut Income, args: &EditArgs) -> Result<()> {
    if args.due_day.is_some() || args.category.is_some() {
        bail!("--due-day and --category apply to bills only");
    }
    if let Some(name) = &args.name {
        income.name = name.clone();
    }
    if let Some(amount) = args.amount {
        income.amount = amount;
    }
    if let Some(frequency) = args.frequency {
        income.frequency = frequency;
    }
    if args.end.is_some() {
        income.end_date = args.end;
    }
    if args.notes.is_some() {
        income.notes = args.notes.clone();
    }
    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_bills(bills: &[Bill]) {
    if bills.is_empty() {
        println!("No bills.");
        return;
    }
    println!("{:<38} {:<24} {:>10} {:>4} {:>6}", "ID", "NAME", "AMOUNT", "DUE", "PAID");
    for bill in bills {
        let total = bill.months.as_ref().map_or(0, Vec::len);
        println!(
            "{:<38} {:<24} {:>10.2} {:>4} {:>6}",
            bill.id().unwrap_or("-"),
            bill.name,
            bill.amount,
            bill.due_day,
            format!("{}/{}", bill.paid_count(), total)
        );
    }
}

fn print_bill_detail(bill: &Bill) {
    println!("🧾 {} ({})", bill.name, bill.id().unwrap_or("unsaved"));
    println!("   Amount:   {:.2}", bill.amount);
    println!("   Due day:  {}", bill.due_day);
    println!("   Starts:   {}", bill.start_date);
    if let Some(end) = bill.end_date {
        println!("   Ends:     {}", end);
    }
    if let Some(category) = &bill.category {
        println!("   Category: {}", category);
    }
    if let Some(notes) = &bill.notes {
        println!("   Notes:    {}", notes);
    }
    for entry in bill.months.iter().flatten() {
        println!(
            "   {:04}-{:02}-{:02}  {}",
            entry.year,
            entry.month,
            entry.day,
            if entry.paid { "✓ paid" } else { "· due" }
        );
    }
}

fn print_incomes(incomes: &[Income]) {
    if incomes.is_empty() {
        println!("No income sources.");
        return;
    }
    println!("{:<38} {:<24} {:>10} {:<12} {:<10}", "ID", "NAME", "AMOUNT", "FREQUENCY", "START");
    for income in incomes {
        println!(
            "{:<38} {:<24} {:>10.2} {:<12} {:<10}",
            income.id().unwrap_or("-"),
            income.name,
            income.amount,
            income.frequency,
            income.start_date
        );
    }
}

fn print_cash_flow(flow: &CashFlow) {
    println!("📈 Cash flow (opening balance {:.2})", flow.opening_balance);
    println!("{:<8} {:>12} {:>12} {:>12} {:>12}", "MONTH", "INCOME", "BILLS", "NET", "BALANCE");
    for m in &flow.months {
        println!(
            "{:<8} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
            m.label(),
            m.income,
            m.bills_due,
            m.net,
            m.balance
        );
    }
    let totals = flow.totals();
    println!(
        "{:<8} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
        "TOTAL",
        totals.income,
        totals.bills_due,
        totals.net,
        flow.closing_balance()
    );
    if let Some(low) = flow.lowest_point().filter(|m| m.balance < 0.0) {
        println!("⚠ Balance drops to {:.2} in {}", low.balance, low.label());
    }
    let current = Utc::now().date_naive();
    if let Some(m) = flow
        .months
        .iter()
        .find(|m| m.year == current.year() && m.month == current.month())
    {
        println!("   {:.2} of this month's bills still outstanding", m.bills_outstanding());
    }
}
