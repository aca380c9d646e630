//! Per-endpoint stock fetching and normalization
//!
//! One GET per endpoint; the body is scanned for repeated variation items,
//! each exposing a slot label and a stock text. Every failure mode
//! (missing endpoint, non-200, transport error, zero recognizable items)
//! degrades to an empty map so a bad seller page never aborts the cycle.

use crate::html;
use crate::slots::{self, SlotBand};
use kanbai_core::{SlotMap, SlotRules, StockState};
use tracing::{debug, warn};

/// List item carrying one slot's stock line
const VARIATION_ITEM_CLASS: &str = "cot-itemOrder-variationLI";
/// Sub-field with the slot label text
const VARIATION_NAME_CLASS: &str = "cot-itemOrder-variationName";
/// Sub-field with the stock text
const VARIATION_STOCK_CLASS: &str = "cot-itemOrder-variationStock";

/// Sold-out items replace their buy button with this notify link
const RESTOCK_NOTIFY_MARKER: &str = "再入荷お知らせ";
/// Items whose sale has not opened carry this notify link instead
const SALE_START_NOTIFY_MARKER: &str = "販売開始お知らせ";
/// Low-stock marker inside the stock field
const LAST_ONE_MARKER: &str = "残り1点";

/// Fetch one endpoint and normalize its items. Never fails: every error
/// path logs and returns an empty map.
pub async fn fetch_stock(
    client: &reqwest::Client,
    endpoint: Option<&str>,
    rules: &SlotRules,
) -> SlotMap {
    let Some(url) = endpoint else {
        return SlotMap::new();
    };

    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url, error = %e, "stock fetch failed");
            return SlotMap::new();
        }
    };

    if !response.status().is_success() {
        warn!(url, status = %response.status(), "stock fetch returned non-success");
        return SlotMap::new();
    }

    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            warn!(url, error = %e, "stock body read failed");
            return SlotMap::new();
        }
    };

    let slots = parse_stock_page(&body, rules);
    if slots.is_empty() {
        warn!(url, "no recognizable variation items");
    } else {
        debug!(url, slots = slots.len(), "stock fetched");
    }
    slots
}

/// Scan a stock page for variation items and normalize each one.
///
/// The branch order is load-bearing: the early+notify combination must be
/// checked before the generic notify rule, or a gated early slot would
/// read as sold out.
pub fn parse_stock_page(body: &str, rules: &SlotRules) -> SlotMap {
    let mut result = SlotMap::new();
    let mut from = 0;

    while let Some((start, end)) = html::next_block_with_class(body, "li", VARIATION_ITEM_CLASS, from)
    {
        from = end;
        let block = &body[start..end];

        let label = html::class_text(block, VARIATION_NAME_CLASS);
        if label.is_empty() {
            continue;
        }
        let stock_text = html::class_text(block, VARIATION_STOCK_CLASS);
        let item_text = html::text_of(block);

        let state = normalize(&label, &item_text, &stock_text, rules);
        result.insert(label, state);
    }

    result
}

fn normalize(label: &str, item_text: &str, stock_text: &str, rules: &SlotRules) -> StockState {
    let notify = item_text.contains(RESTOCK_NOTIFY_MARKER)
        || item_text.contains(SALE_START_NOTIFY_MARKER);

    if notify && slots::classify(rules, label) == SlotBand::Early {
        StockState::Unreleased
    } else if notify {
        StockState::SoldOut
    } else if stock_text.contains(LAST_ONE_MARKER) {
        StockState::LastOne
    } else {
        StockState::Available
    }
}
