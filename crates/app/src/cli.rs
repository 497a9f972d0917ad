use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Category, Money};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "shoplist")]
#[command(about = "Track purchase lists and report on what you spend")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, env = "SHOPLIST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account. The password is asked twice.
    Register(RegisterArgs),
    /// Import lists from a JSON file.
    Import(ImportArgs),
    /// Spending summary and purchase history.
    Report(ReportArgs),
    /// Average monthly price of a product.
    Trend(TrendArgs),
    /// Search saved products.
    Products(ProductsArgs),
    /// Delete a product from a saved list.
    RemoveProduct(RemoveProductArgs),
}

#[derive(Args, Debug)]
pub struct Account {
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    /// `YYYY-MM-DD`.
    #[arg(long)]
    pub birthdate: NaiveDate,
    /// `mx`, `co` or `ar`.
    #[arg(long)]
    pub country: String,
    /// Profile picture file.
    #[arg(long)]
    pub picture: PathBuf,
    #[arg(long)]
    pub accept_terms: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub account: Account,
    /// JSON array of lists.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub account: Account,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TrendArgs {
    #[command(flatten)]
    pub account: Account,
    #[arg(long)]
    pub product: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProductsArgs {
    #[command(flatten)]
    pub account: Account,
    /// Part of the product name.
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub min_price: Option<Money>,
    #[arg(long)]
    pub max_price: Option<Money>,
    /// Write CSV to stdout.
    #[arg(long)]
    pub csv: bool,
}

#[derive(Args, Debug)]
pub struct RemoveProductArgs {
    #[command(flatten)]
    pub account: Account,
    #[arg(long)]
    pub list: Uuid,
    #[arg(long)]
    pub product: Uuid,
}
