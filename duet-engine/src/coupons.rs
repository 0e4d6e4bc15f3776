//! Love-coupon book.
//!
//! Coupons move through three piles: authored locally, received from the
//! partner, redeemed. Sharing copies an authored coupon into the received
//! pile (the partner-to-partner hop happens out of band); redeeming moves
//! a received coupon into the redeemed pile and stamps when it was spent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ProgressState;

/// One gift coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: u64,
    /// Short pictogram shown on the card.
    #[serde(default)]
    pub icon: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Stamped on the copy dropped into the received pile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    /// Stamped when the coupon is redeemed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

/// Fields the user fills in when authoring a coupon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDraft {
    pub icon: String,
    pub title: String,
    pub note: Option<String>,
}

/// The three coupon piles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponBook {
    pub authored: Vec<Coupon>,
    pub received: Vec<Coupon>,
    pub redeemed: Vec<Coupon>,
}

/// Author a new coupon and return its id. Title validation happens at the
/// action layer before this runs.
pub fn author_coupon(state: &mut ProgressState, draft: CouponDraft, now: DateTime<Utc>) -> u64 {
    let id = state.allocate_entry_id();
    state.coupons.authored.push(Coupon {
        id,
        icon: draft.icon,
        title: draft.title,
        note: draft.note,
        created_at: now,
        received_at: None,
        used_at: None,
    });
    id
}

/// Copy an authored coupon into the received pile, stamping receipt time.
/// Sharing the same coupon again drops another copy; the original stays in
/// the authored pile. Returns false when no authored coupon has this id.
pub fn share_coupon(state: &mut ProgressState, id: u64, now: DateTime<Utc>) -> bool {
    let Some(coupon) = state.coupons.authored.iter().find(|c| c.id == id) else {
        return false;
    };
    let mut copy = coupon.clone();
    copy.received_at = Some(now);
    state.coupons.received.push(copy);
    true
}

/// Move a received coupon to the redeemed pile, stamping when it was
/// spent. Returns false when no received coupon has this id.
pub fn redeem_coupon(state: &mut ProgressState, id: u64, now: DateTime<Utc>) -> bool {
    let Some(index) = state.coupons.received.iter().position(|c| c.id == id) else {
        return false;
    };
    let mut coupon = state.coupons.received.remove(index);
    coupon.used_at = Some(now);
    state.coupons.redeemed.push(coupon);
    true
}
