use clap::{Args, ValueEnum};
use jiff::Timestamp;
use souk_app::domain::coupons::{
    CouponsService, PgCouponsService,
    models::{CouponUuid, DiscountKind, NewCoupon},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    /// Whole percent of the subtotal
    Percentage,
    /// Flat amount in minor units
    Fixed,
}

impl From<Kind> for DiscountKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Percentage => Self::Percentage,
            Kind::Fixed => Self::Fixed,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CreateCouponArgs {
    /// Coupon code; stored upper-cased
    #[arg(long)]
    code: String,

    #[arg(long, value_enum)]
    kind: Kind,

    /// Percent (0-100) or amount in minor units, depending on kind
    #[arg(long)]
    value: u64,

    /// Minimum pre-discount subtotal in minor units
    #[arg(long, default_value_t = 0)]
    min_order_amount: u64,

    /// Maximum number of redemptions; unlimited when omitted
    #[arg(long)]
    max_uses: Option<u64>,

    /// Start of the validity window (RFC 3339)
    #[arg(long)]
    starts_at: Option<Timestamp>,

    /// End of the validity window (RFC 3339)
    #[arg(long)]
    ends_at: Option<Timestamp>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: CreateCouponArgs) -> Result<(), String> {
    let db = super::super::connect(&args.database_url).await?;

    let coupon = PgCouponsService::new(db)
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            code: args.code,
            kind: args.kind.into(),
            value: args.value,
            min_order_amount: args.min_order_amount,
            max_uses: args.max_uses,
            starts_at: args.starts_at,
            ends_at: args.ends_at,
        })
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    println!("coupon_uuid: {}", coupon.uuid);
    println!("code: {}", coupon.code);
    println!("discount: {} {}", coupon.value, coupon.kind);

    Ok(())
}
