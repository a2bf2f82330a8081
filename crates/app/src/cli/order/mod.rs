use clap::{Args, Subcommand, ValueEnum};
use souk_app::domain::orders::{
    OrdersService, PgOrdersService,
    models::{OrderStatus, OrderUuid},
};

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Move an order to its next fulfilment status
    Advance(AdvanceOrderArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Status {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl From<Status> for OrderStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Processing => Self::Processing,
            Status::Shipped => Self::Shipped,
            Status::Delivered => Self::Delivered,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct AdvanceOrderArgs {
    #[arg(long)]
    order_uuid: OrderUuid,

    #[arg(long, value_enum)]
    status: Status,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Advance(args) => advance(args).await,
    }
}

async fn advance(args: AdvanceOrderArgs) -> Result<(), String> {
    let db = super::connect(&args.database_url).await?;

    let order = PgOrdersService::new(db)
        .advance_status(args.order_uuid, args.status.into())
        .await
        .map_err(|error| format!("failed to update order: {error}"))?;

    println!("order {} is now {}", order.order_number, order.status);

    Ok(())
}
