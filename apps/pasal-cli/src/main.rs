//! Pasal CLI - counter tooling for Pasal POS.
//!
//! # Commands
//!
//! - `pasal price <cart.json>` - Price a cart and print the bill
//! - `pasal checkout <cart.json>` - Record a sale and print the receipt
//! - `pasal product ...` - Catalogue maintenance
//! - `pasal sale show|void <receipt>` - Look up or void a sale
//! - `pasal khata ...` - Customers and credit
//! - `pasal report daily` - End-of-day summary
//! - `pasal config` - Effective configuration
//!
//! # Examples
//!
//! ```bash
//! # Price a cart of catalogue codes
//! pasal price cart.json
//!
//! # Sell it for cash, Rs. 1000 handed over
//! pasal checkout cart.json --method cash --tendered 1000
//!
//! # Sell on credit to a regular
//! pasal checkout cart.json --method khata --customer 9841000001
//!
//! # Yesterday's figures as JSON
//! pasal report daily --date 2026-10-18 --json
//! ```
//!
//! Configuration comes from `PASAL_*` environment variables (see
//! `config.rs`); logging goes to stderr and follows `RUST_LOG` when set.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use commands::sale::{CheckoutOptions, MethodArg};
use commands::{khata, open_database, parse_rupees, price, product, report, sale, show_config};
use config::PasalConfig;
use error::{code_for, CliError};
use pasal_core::Money;

/// Pasal POS - cart pricing, checkout and khata from the terminal
#[derive(Parser)]
#[command(name = "pasal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log what the counter is doing
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results (and errors) as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a cart file and print the bill
    Price {
        /// Cart JSON: catalogue codes or fully priced lines
        cart: PathBuf,
    },

    /// Record a sale from a cart file
    Checkout {
        /// Cart JSON: catalogue codes or fully priced lines
        cart: PathBuf,

        /// How the customer pays
        #[arg(short, long, value_enum, default_value_t = MethodArg::Cash)]
        method: MethodArg,

        /// Customer id or phone (required for khata)
        #[arg(short, long)]
        customer: Option<String>,

        /// Cash handed over, in rupees (default: exact total)
        #[arg(short, long, value_parser = parse_rupees)]
        tendered: Option<Money>,

        /// Card slip or wallet transaction reference
        #[arg(long)]
        reference: Option<String>,

        /// Note printed on the receipt
        #[arg(long)]
        notes: Option<String>,
    },

    /// Catalogue maintenance
    #[command(subcommand)]
    Product(ProductCommand),

    /// Look up or void recorded sales
    #[command(subcommand)]
    Sale(SaleCommand),

    /// Customers and their credit ledger
    #[command(subcommand)]
    Khata(KhataCommand),

    /// Sales reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ProductCommand {
    /// List or search active products
    #[command(alias = "search")]
    List {
        /// Matches name, SKU or barcode
        query: Option<String>,

        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },

    /// Show a product and its variants
    Show { sku: String },

    /// Add a product to the catalogue
    Add {
        #[arg(long)]
        sku: String,

        #[arg(long)]
        name: String,

        /// VAT-inclusive price in rupees
        #[arg(long, value_parser = parse_rupees)]
        price: Money,

        /// Purchase cost in rupees
        #[arg(long, value_parser = parse_rupees)]
        cost: Option<Money>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        barcode: Option<String>,

        /// VAT rate in basis points (default: configured rate; 0 for exempt goods)
        #[arg(long)]
        vat_bps: Option<u32>,

        /// Opening stock; enables stock tracking
        #[arg(long)]
        stock: Option<i64>,
    },

    /// Add a variant (size, plate) to a product
    AddVariant {
        /// SKU of the parent product
        product: String,

        #[arg(long)]
        sku: String,

        #[arg(long)]
        name: String,

        /// Variant price in rupees
        #[arg(long, value_parser = parse_rupees)]
        price: Money,
    },

    /// Restock (positive) or write off (negative) stock
    Stock {
        sku: String,

        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Change a product's price
    SetPrice {
        sku: String,

        /// New price in rupees
        #[arg(value_parser = parse_rupees)]
        price: Money,
    },

    /// Hide a product from the till
    Remove { sku: String },
}

#[derive(Subcommand)]
enum SaleCommand {
    /// Reprint a receipt
    Show {
        /// Receipt number or sale id
        receipt: String,
    },

    /// Void a sale, restoring stock and reversing any khata credit
    Void {
        /// Receipt number or sale id
        receipt: String,
    },
}

#[derive(Subcommand)]
enum KhataCommand {
    /// Register a customer
    AddCustomer {
        name: String,

        #[arg(short, long)]
        phone: Option<String>,
    },

    /// List customers with their balances
    List,

    /// Outstanding balance for a customer
    Balance {
        /// Customer id or phone
        customer: String,
    },

    /// Record money paid back
    Repay {
        /// Customer id or phone
        customer: String,

        /// Amount in rupees
        #[arg(value_parser = parse_rupees)]
        amount: Money,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// Ledger with running balance
    Statement {
        /// Customer id or phone
        customer: String,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Summary of completed sales for a day
    Daily {
        /// Local date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

/// `RUST_LOG` wins; otherwise quiet unless `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,pasal=debug,sqlx=warn")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = PasalConfig::load()
        .map_err(CliError::from)
        .context("Failed to load configuration")?;
    let json = cli.json;

    let db = open_database(&config).await.context("Failed to open database")?;

    let result = match cli.command {
        Commands::Price { cart } => price::execute(&config, &db, &cart, json)
            .await
            .with_context(|| format!("Failed to price {}", cart.display())),

        Commands::Checkout {
            cart,
            method,
            customer,
            tendered,
            reference,
            notes,
        } => {
            let options = CheckoutOptions {
                customer,
                tendered,
                reference,
                notes,
                ..CheckoutOptions::new(method.into())
            };
            sale::checkout(&config, &db, &cart, &options, json)
                .await
                .context("Checkout failed")
        }

        Commands::Product(cmd) => run_product(&config, &db, cmd, json).await,

        Commands::Sale(SaleCommand::Show { receipt }) => sale::show(&config, &db, &receipt, json)
            .await
            .with_context(|| format!("Failed to show sale {receipt}")),

        Commands::Sale(SaleCommand::Void { receipt }) => sale::void(&config, &db, &receipt, json)
            .await
            .with_context(|| format!("Failed to void sale {receipt}")),

        Commands::Khata(cmd) => run_khata(&config, &db, cmd, json).await,

        Commands::Report(ReportCommand::Daily { date }) => report::daily(&config, &db, date, json)
            .await
            .context("Failed to build report"),

        Commands::Config => show_config(&config, json).map_err(anyhow::Error::from),
    };

    db.close().await;
    result
}

async fn run_product(
    config: &PasalConfig,
    db: &pasal_db::Database,
    cmd: ProductCommand,
    json: bool,
) -> anyhow::Result<()> {
    let result = match cmd {
        ProductCommand::List { query, limit } => {
            product::list(config, db, query.as_deref(), limit, json).await
        }
        ProductCommand::Show { sku } => product::show(config, db, &sku, json).await,
        ProductCommand::Add {
            sku,
            name,
            price,
            cost,
            category,
            barcode,
            vat_bps,
            stock,
        } => {
            let new = product::NewProduct {
                sku,
                name,
                price,
                cost,
                category,
                barcode,
                tax_rate_bps: vat_bps.unwrap_or_else(|| config.vat_rate.bps()),
                stock,
            };
            product::add(config, db, new, json).await
        }
        ProductCommand::AddVariant {
            product: parent,
            sku,
            name,
            price,
        } => product::add_variant(config, db, &parent, &sku, &name, price, json).await,
        ProductCommand::Stock { sku, delta } => product::adjust_stock(db, &sku, delta, json).await,
        ProductCommand::SetPrice { sku, price } => {
            product::set_price(config, db, &sku, price, json).await
        }
        ProductCommand::Remove { sku } => product::remove(db, &sku).await,
    };

    result.context("Product command failed")
}

async fn run_khata(
    config: &PasalConfig,
    db: &pasal_db::Database,
    cmd: KhataCommand,
    json: bool,
) -> anyhow::Result<()> {
    let result = match cmd {
        KhataCommand::AddCustomer { name, phone } => {
            khata::add_customer(db, &name, phone.as_deref(), json).await
        }
        KhataCommand::List => khata::list(config, db, json).await,
        KhataCommand::Balance { customer } => khata::balance(config, db, &customer, json).await,
        KhataCommand::Repay {
            customer,
            amount,
            note,
        } => khata::repay(config, db, &customer, amount, note.as_deref(), json).await,
        KhataCommand::Statement { customer } => {
            khata::statement(config, db, &customer, json).await
        }
    };

    result.context("Khata command failed")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = code_for(&err);
            if json {
                let body = serde_json::json!({ "code": code, "message": format!("{err:#}") });
                eprintln!("{body}");
            } else {
                eprintln!("error[{code}]: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
