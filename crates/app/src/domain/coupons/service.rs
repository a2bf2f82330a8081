//! Coupons service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    database::Db,
    domain::coupons::{
        errors::CouponsServiceError,
        models::{Coupon, CouponUuid, Discount, NewCoupon, normalize_code},
        repository::PgCouponsRepository,
        validator::validate,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    repository: PgCouponsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCouponsRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(name = "coupons.service.create_coupon", skip(self, coupon), fields(code = %coupon.code), err)]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError> {
        let coupon = NewCoupon {
            code: normalize_code(&coupon.code),
            ..coupon
        };

        if coupon.code.is_empty() {
            return Err(CouponsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_coupon(&mut tx, &coupon).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_coupon(&self, coupon: CouponUuid) -> Result<Coupon, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.repository.get_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    #[tracing::instrument(name = "coupons.service.quote", skip(self), err)]
    async fn quote(&self, code: String, subtotal: u64) -> Result<Discount, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self
            .repository
            .find_coupon_by_code(&mut tx, &normalize_code(&code))
            .await?;

        tx.commit().await?;

        Ok(validate(coupon.as_ref(), subtotal, Timestamp::now())?)
    }

    #[tracing::instrument(name = "coupons.service.deactivate_coupon", skip(self), err)]
    async fn deactivate_coupon(&self, coupon: CouponUuid) -> Result<Coupon, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.repository.deactivate_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(coupon)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Create a coupon. Codes are stored upper-cased and must be unique.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError>;

    async fn get_coupon(&self, coupon: CouponUuid) -> Result<Coupon, CouponsServiceError>;

    /// Work out the discount a code would give on `subtotal` without redeeming it.
    async fn quote(&self, code: String, subtotal: u64) -> Result<Discount, CouponsServiceError>;

    /// Stop a coupon from being accepted. Coupons are never deleted.
    async fn deactivate_coupon(&self, coupon: CouponUuid) -> Result<Coupon, CouponsServiceError>;
}
