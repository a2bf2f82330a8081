use clap::{Args, Subcommand};
use souk_app::domain::{
    parties::ShopUuid,
    products::{
        PgProductsService, ProductsService,
        models::{NewProduct, ProductUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Register a product with an opening stock level
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    #[arg(long)]
    shop_uuid: ShopUuid,

    /// Price in minor units
    #[arg(long)]
    price: u64,

    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<ProductUuid>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateProductArgs) -> Result<(), String> {
    let db = super::connect(&args.database_url).await?;

    let product = PgProductsService::new(db)
        .create_product(NewProduct {
            uuid: args.product_uuid.unwrap_or_default(),
            shop_uuid: args.shop_uuid,
            price: args.price,
            stock: args.stock,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("price: {}", product.price);
    println!("stock: {}", product.stock);

    Ok(())
}
