use clap::Args;
use souk_app::domain::coupons::{CouponsService, PgCouponsService, models::CouponUuid};

#[derive(Debug, Args)]
pub(crate) struct DeactivateCouponArgs {
    #[arg(long)]
    coupon_uuid: CouponUuid,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: DeactivateCouponArgs) -> Result<(), String> {
    let db = super::super::connect(&args.database_url).await?;

    let coupon = PgCouponsService::new(db)
        .deactivate_coupon(args.coupon_uuid)
        .await
        .map_err(|error| format!("failed to deactivate coupon: {error}"))?;

    println!("deactivated coupon {} ({})", coupon.code, coupon.uuid);

    Ok(())
}
