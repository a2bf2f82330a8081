//! Buyer identity middleware.
//!
//! Buyers are authenticated upstream; the gateway forwards the buyer's
//! identifier in the `x-buyer-uuid` header.

use salvo::prelude::*;

use souk_app::domain::parties::BuyerUuid;

use crate::extensions::*;

pub(crate) const BUYER_UUID_HEADER: &str = "x-buyer-uuid";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(buyer) = extract_buyer_uuid(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid buyer identity"));
        ctrl.skip_rest();

        return;
    };

    tracing::Span::current().record("buyer_uuid", tracing::field::display(buyer));

    depot.insert_buyer_uuid(buyer);

    ctrl.call_next(req, depot, res).await;
}

fn extract_buyer_uuid(req: &Request) -> Option<BuyerUuid> {
    let value = req.headers().get(BUYER_UUID_HEADER)?.to_str().ok()?;

    value.trim().parse().ok()
}
