//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::{
        carts::variation::Variation,
        parties::{BuyerUuid, ShopUuid},
        products::models::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLine>;

/// Cart Line Model
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub uuid: CartLineUuid,
    pub buyer_uuid: BuyerUuid,
    pub product_uuid: ProductUuid,
    pub variation: Option<Variation>,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartLine {
    /// Canonical key for this line's variation, `""` when there is none.
    #[must_use]
    pub fn variation_key(&self) -> String {
        Variation::key_for(self.variation.as_ref())
    }
}

/// New Cart Line Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartLine {
    /// Used only when no line with the same product and variation exists yet.
    pub uuid: CartLineUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub variation: Option<Variation>,
}

/// A cart line priced at the product's current catalog price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineView {
    pub line: CartLine,
    pub shop_uuid: ShopUuid,
    pub unit_price: u64,
    pub subtotal: u64,
}

/// The buyer's cart as it stands right now.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub buyer_uuid: BuyerUuid,
    pub lines: Vec<CartLineView>,
    pub total_items: u64,
    pub total_amount: u64,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct shops present in the cart, in first-seen order.
    #[must_use]
    pub fn shops(&self) -> Vec<ShopUuid> {
        let mut shops: Vec<ShopUuid> = Vec::new();

        for view in &self.lines {
            if !shops.contains(&view.shop_uuid) {
                shops.push(view.shop_uuid);
            }
        }

        shops
    }

    /// Lines belonging to a single shop.
    pub fn lines_for_shop(&self, shop: ShopUuid) -> impl Iterator<Item = &CartLineView> {
        self.lines.iter().filter(move |view| view.shop_uuid == shop)
    }
}
