//! Order construction.
//!
//! Turns reserved, priced lines into an order draft. Nothing here touches
//! storage; the draft is persisted by the orders repository.

use thiserror::Error;

use crate::domain::{
    amounts::line_amount,
    carts::variation::Variation,
    coupons::models::CouponUuid,
    orders::models::{OrderLineUuid, OrderUuid, ShippingAddress},
    parties::{BuyerUuid, ShopUuid},
    products::models::ProductUuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderFactoryError {
    #[error("order has no lines")]
    Empty,

    #[error("order amount overflows")]
    AmountOverflow,
}

/// A line whose unit price was captured when its stock was reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub variation: Option<Variation>,
}

/// A coupon discount to apply to the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub coupon_uuid: CouponUuid,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub uuid: OrderLineUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub variation: Option<Variation>,
    pub position: u32,
}

/// Everything needed to insert an order except its number.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub uuid: OrderUuid,
    pub buyer_uuid: BuyerUuid,
    pub shop_uuid: ShopUuid,
    pub coupon_uuid: Option<CouponUuid>,
    pub subtotal: u64,
    pub discount: u64,
    pub total: u64,
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<NewOrderLine>,
}

/// Sum of `unit_price × quantity` across lines.
pub fn subtotal(lines: &[PricedLine]) -> Result<u64, OrderFactoryError> {
    lines.iter().try_fold(0_u64, |sum, line| {
        line_amount(line.unit_price, line.quantity)
            .and_then(|amount| sum.checked_add(amount))
            .ok_or(OrderFactoryError::AmountOverflow)
    })
}

#[derive(Debug, Clone)]
pub struct OrderFactory {
    pub buyer_uuid: BuyerUuid,
    pub shop_uuid: ShopUuid,
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
}

impl OrderFactory {
    /// Build a draft with the discount clamped to the subtotal.
    ///
    /// Lines keep the order they were given in; `position` records it.
    pub fn build(
        self,
        lines: Vec<PricedLine>,
        discount: Option<AppliedDiscount>,
    ) -> Result<OrderDraft, OrderFactoryError> {
        if lines.is_empty() {
            return Err(OrderFactoryError::Empty);
        }

        let subtotal = subtotal(&lines)?;
        let discount_amount = discount.map_or(0, |discount| discount.amount.min(subtotal));
        let total = subtotal - discount_amount;

        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let position =
                    u32::try_from(index).map_err(|_| OrderFactoryError::AmountOverflow)?;

                Ok(NewOrderLine {
                    uuid: OrderLineUuid::new(),
                    product_uuid: line.product_uuid,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    variation: Variation::normalize(line.variation),
                    position,
                })
            })
            .collect::<Result<Vec<_>, OrderFactoryError>>()?;

        Ok(OrderDraft {
            uuid: OrderUuid::new(),
            buyer_uuid: self.buyer_uuid,
            shop_uuid: self.shop_uuid,
            coupon_uuid: discount.map(|discount| discount.coupon_uuid),
            subtotal,
            discount: discount_amount,
            total,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> OrderFactory {
        OrderFactory {
            buyer_uuid: BuyerUuid::new(),
            shop_uuid: ShopUuid::new(),
            payment_method: "card".to_string(),
            shipping_address: ShippingAddress::default(),
        }
    }

    fn line(unit_price: u64, quantity: u32) -> PricedLine {
        PricedLine {
            product_uuid: ProductUuid::new(),
            quantity,
            unit_price,
            variation: None,
        }
    }

    #[test]
    fn totals_without_discount() -> Result<(), OrderFactoryError> {
        let draft = factory().build(vec![line(10_00, 3), line(2_50, 2)], None)?;

        assert_eq!(draft.subtotal, 35_00);
        assert_eq!(draft.discount, 0);
        assert_eq!(draft.total, 35_00);
        assert_eq!(draft.coupon_uuid, None);

        Ok(())
    }

    #[test]
    fn discount_is_subtracted() -> Result<(), OrderFactoryError> {
        let coupon_uuid = CouponUuid::new();

        let draft = factory().build(
            vec![line(100_00, 1)],
            Some(AppliedDiscount {
                coupon_uuid,
                amount: 10_00,
            }),
        )?;

        assert_eq!(draft.discount, 10_00);
        assert_eq!(draft.total, 90_00);
        assert_eq!(draft.coupon_uuid, Some(coupon_uuid));

        Ok(())
    }

    #[test]
    fn discount_is_clamped_to_subtotal() -> Result<(), OrderFactoryError> {
        let draft = factory().build(
            vec![line(5_00, 1)],
            Some(AppliedDiscount {
                coupon_uuid: CouponUuid::new(),
                amount: 20_00,
            }),
        )?;

        assert_eq!(draft.discount, 5_00);
        assert_eq!(draft.total, 0);

        Ok(())
    }

    #[test]
    fn positions_follow_input_order() -> Result<(), OrderFactoryError> {
        let lines = vec![line(1_00, 1), line(2_00, 1), line(3_00, 1)];
        let products: Vec<ProductUuid> = lines.iter().map(|line| line.product_uuid).collect();

        let draft = factory().build(lines, None)?;

        let positions: Vec<(ProductUuid, u32)> = draft
            .lines
            .iter()
            .map(|line| (line.product_uuid, line.position))
            .collect();

        assert_eq!(
            positions,
            vec![(products[0], 0), (products[1], 1), (products[2], 2)]
        );

        Ok(())
    }

    #[test]
    fn empty_orders_are_rejected() {
        assert_eq!(
            factory().build(Vec::new(), None),
            Err(OrderFactoryError::Empty)
        );
    }

    #[test]
    fn overflow_is_detected() {
        assert_eq!(
            subtotal(&[line(u64::MAX, 1), line(1, 1)]),
            Err(OrderFactoryError::AmountOverflow)
        );
        assert_eq!(
            subtotal(&[line(u64::MAX, 2)]),
            Err(OrderFactoryError::AmountOverflow)
        );
    }
}
