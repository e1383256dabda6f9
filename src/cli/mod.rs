use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::application::LedgerService;
use crate::config::Settings;
use crate::domain::{format_cents, parse_cents, CustomerId};
use crate::io::{backup_database, Exporter};

/// Fiado - informal store-credit ledger
#[derive(Parser)]
#[command(name = "fiado")]
#[command(about = "A local-first ledger for credit extended to regular customers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "fiado.db")]
    pub database: String,

    /// Settings file path
    #[arg(short, long, default_value = "fiado.json")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Record a sale on credit
    Purchase {
        /// Customer id
        customer_id: CustomerId,

        /// What was sold
        description: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Date of the sale (ISO 8601 format: YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a payment toward a customer's balance
    Payment {
        /// Customer id
        customer_id: CustomerId,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Optional note (e.g., "cash", "partial")
        #[arg(short, long)]
        note: Option<String>,

        /// Date of the payment (ISO 8601 format: YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show a customer's outstanding balance
    Balance {
        /// Customer id
        customer_id: CustomerId,
    },

    /// Show a customer's merged purchase/payment history
    History {
        /// Customer id
        customer_id: CustomerId,
    },

    /// List active customers who currently owe anything
    Debtors,

    /// Show ledger-wide statistics
    Stats,

    /// Export the full credit report as CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Copy the database to the configured backup directory
    Backup,
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Register a new customer
    Add {
        /// Customer name
        name: String,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// Credit limit (e.g., "500.00"; defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<String>,
    },

    /// Edit a customer's name, phone or credit limit
    Edit {
        /// Customer id
        id: CustomerId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New phone number
        #[arg(long)]
        phone: Option<String>,

        /// New credit limit (e.g., "500.00")
        #[arg(long)]
        limit: Option<String>,
    },

    /// Deactivate a customer (their records are kept)
    Remove {
        /// Customer id
        id: CustomerId,
    },

    /// List active customers, optionally filtered by name or phone
    List {
        /// Search term (substring of name or phone)
        term: Option<String>,
    },

    /// Show a customer's details, active or not
    Show {
        /// Customer id
        id: CustomerId,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load_or_create(Path::new(&self.config))?;

        // Back up the database before touching it, the way the original
        // desktop app did on every start. Never fatal.
        if settings.auto_backup && !matches!(self.command, Commands::Init | Commands::Backup) {
            match backup_database(Path::new(&self.database), Path::new(&settings.backup_dir)) {
                Ok(Some(path)) => {
                    if self.verbose {
                        info!("Auto-backup written: {}", path.display());
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("Auto-backup failed: {:#}", err),
            }
        }

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database, settings.default_credit_limit_cents).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Customer(customer_cmd) => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                run_customer_command(&service, customer_cmd).await?;
            }

            Commands::Purchase {
                customer_id,
                description,
                amount,
                date,
            } => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let timestamp = parse_timestamp(date.as_deref())?;

                let purchase = service
                    .add_purchase(customer_id, description, amount_cents, timestamp)
                    .await?;

                println!(
                    "Recorded purchase #{}: {} ({})",
                    purchase.id,
                    format_cents(purchase.amount_cents),
                    purchase.description
                );
            }

            Commands::Payment {
                customer_id,
                amount,
                note,
                date,
            } => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let timestamp = parse_timestamp(date.as_deref())?;

                let payment = service
                    .add_payment(customer_id, amount_cents, note, timestamp)
                    .await?;
                let balance = service.compute_balance(customer_id).await?;

                println!(
                    "Recorded payment #{}: {} (balance now {})",
                    payment.id,
                    format_cents(payment.amount_cents),
                    format_cents(balance)
                );
            }

            Commands::Balance { customer_id } => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                let customer = service.get_customer(customer_id).await?;
                let balance = service.compute_balance(customer_id).await?;
                println!("{}: {}", customer.name, format_cents(balance));
            }

            Commands::History { customer_id } => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                run_history_command(&service, customer_id).await?;
            }

            Commands::Debtors => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                run_debtors_command(&service).await?;
            }

            Commands::Stats => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                run_stats_command(&service).await?;
            }

            Commands::Export { output } => {
                let service =
                    LedgerService::connect(&self.database, settings.default_credit_limit_cents)
                        .await?;
                let exporter = Exporter::new(&service);

                let count = match output {
                    Some(path) => {
                        let file = std::fs::File::create(&path)
                            .with_context(|| format!("Failed to create {}", path))?;
                        let count = exporter.export_report_csv(&settings.company, file).await?;
                        println!("Exported report for {} customer(s) to {}", count, path);
                        count
                    }
                    None => {
                        exporter
                            .export_report_csv(&settings.company, std::io::stdout())
                            .await?
                    }
                };

                if self.verbose {
                    info!("Export covered {} customer(s)", count);
                }
            }

            Commands::Backup => {
                match backup_database(Path::new(&self.database), Path::new(&settings.backup_dir))? {
                    Some(path) => println!("Backup written: {}", path.display()),
                    None => println!("No database file at {} yet, nothing to back up", self.database),
                }
            }
        }

        Ok(())
    }
}

async fn run_customer_command(service: &LedgerService, cmd: CustomerCommands) -> Result<()> {
    match cmd {
        CustomerCommands::Add { name, phone, limit } => {
            let limit_cents = limit
                .map(|l| parse_cents(&l))
                .transpose()
                .context("Invalid limit format. Use '500.00' or '500'")?;

            let customer = service.register_customer(name, phone, limit_cents).await?;
            println!(
                "Registered customer #{}: {} (limit {})",
                customer.id,
                customer.name,
                format_cents(customer.credit_limit_cents)
            );
        }

        CustomerCommands::Edit {
            id,
            name,
            phone,
            limit,
        } => {
            // Full-replace semantics: fetch the current record and fill in
            // whatever the caller didn't override.
            let current = service.get_customer(id).await?;

            let limit_cents = limit
                .map(|l| parse_cents(&l))
                .transpose()
                .context("Invalid limit format. Use '500.00' or '500'")?
                .unwrap_or(current.credit_limit_cents);

            service
                .update_customer(
                    id,
                    name.unwrap_or(current.name),
                    phone.or(current.phone),
                    limit_cents,
                )
                .await?;
            println!("Updated customer #{}", id);
        }

        CustomerCommands::Remove { id } => {
            service.deactivate_customer(id).await?;
            println!("Deactivated customer #{}", id);
        }

        CustomerCommands::List { term } => {
            let customers = service.find_customers(term.as_deref().unwrap_or("")).await?;
            if customers.is_empty() {
                println!("No customers found.");
            } else {
                println!("{:<6} {:<24} {:<16} {:<10}", "ID", "NAME", "PHONE", "LIMIT");
                println!("{}", "-".repeat(58));
                for customer in customers {
                    println!(
                        "{:<6} {:<24} {:<16} {:<10}",
                        customer.id,
                        customer.name,
                        customer.phone.as_deref().unwrap_or("-"),
                        format_cents(customer.credit_limit_cents)
                    );
                }
            }
        }

        CustomerCommands::Show { id } => {
            let customer = service.get_customer(id).await?;
            let balance = service.compute_balance(id).await?;

            println!("Customer: {}", customer.name);
            println!("  ID:           {}", customer.id);
            if let Some(phone) = &customer.phone {
                println!("  Phone:        {}", phone);
            }
            println!(
                "  Credit limit: {}",
                format_cents(customer.credit_limit_cents)
            );
            println!(
                "  Active:       {}",
                if customer.active { "yes" } else { "no" }
            );
            println!(
                "  Registered:   {}",
                customer.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();
            println!("  Balance:      {}", format_cents(balance));
        }
    }
    Ok(())
}

async fn run_history_command(service: &LedgerService, customer_id: CustomerId) -> Result<()> {
    let customer = service.get_customer(customer_id).await?;
    let history = service.get_history(customer_id).await?;

    println!("History for {}:", customer.name);
    if history.is_empty() {
        println!("  (no records)");
        return Ok(());
    }

    for entry in history {
        println!(
            "  {} {:<9} {:>10}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.kind,
            format_cents(entry.amount_cents),
            entry.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn run_debtors_command(service: &LedgerService) -> Result<()> {
    let debtors = service.list_customers_with_debt().await?;
    if debtors.is_empty() {
        println!("Nobody owes anything.");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<16} {:>10}", "ID", "NAME", "PHONE", "OWED");
    println!("{}", "-".repeat(58));
    for entry in debtors {
        println!(
            "{:<6} {:<24} {:<16} {:>10}",
            entry.customer.id,
            entry.customer.name,
            entry.customer.phone.as_deref().unwrap_or("-"),
            format_cents(entry.balance_cents)
        );
    }
    Ok(())
}

async fn run_stats_command(service: &LedgerService) -> Result<()> {
    let stats = service.get_statistics().await?;

    println!("Ledger statistics:");
    println!("  Active customers:  {}", stats.active_customers);
    println!(
        "  Total outstanding: {}",
        format_cents(stats.total_outstanding_cents)
    );
    println!(
        "  Total purchases:   {}",
        format_cents(stats.total_purchases_cents)
    );
    println!(
        "  Total payments:    {}",
        format_cents(stats.total_payments_cents)
    );
    Ok(())
}

fn parse_timestamp(date: Option<&str>) -> Result<DateTime<Utc>> {
    match date {
        Some(date_str) => {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))?;
            Ok(date
                .and_hms_opt(0, 0, 0)
                .context("Invalid time of day")?
                .and_utc())
        }
        None => Ok(Utc::now()),
    }
}
