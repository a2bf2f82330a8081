use clap::{Parser, Subcommand};
use souk_app::database::{self, Db};

mod coupon;
mod db;
mod order;
mod product;

#[derive(Debug, Parser)]
#[command(name = "souk-app", about = "Souk operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Coupon(coupon::CouponCommand),
    Product(product::ProductCommand),
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Coupon(command) => coupon::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Order(command) => order::run(command).await,
        }
    }
}

async fn connect(database_url: &str) -> Result<Db, String> {
    database::connect(database_url)
        .await
        .map(Db::new)
        .map_err(|error| format!("failed to connect to database: {error}"))
}
