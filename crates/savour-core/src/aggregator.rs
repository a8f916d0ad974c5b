//! # Order VAT Aggregator
//!
//! Walks an order's line items, invokes the engine per item, and accumulates
//! a per-order tax breakdown by classification.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order VAT Aggregation                               │
//! │                                                                         │
//! │  Order                                                                  │
//! │  ├── line item: Fish & Chips (simple, qty 2)                           │
//! │  │        │                                                             │
//! │  │        ▼                                                             │
//! │  │   engine::calculate_item_vat (component-based) → £1.00/unit         │
//! │  │        │ × quantity                                                  │
//! │  │        ▼                                                             │
//! │  ├── line item: Chicken Combo (mixed, qty 1)                           │
//! │  │        │                                                             │
//! │  │        ▼                                                             │
//! │  │   engine::calculate_item_vat (component-based) → £1.33/unit         │
//! │  │        │                                                             │
//! │  │        ▼                                                             │
//! │  └──► classification buckets + per-item breakdowns                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │       OrderVatSummary { total £3.33, hmrc_compliant, ... }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Method Choice
//! The aggregator's method is FIXED to component-based. Cost-apportionment
//! stays reachable only through the single-item engine entry point - it is a
//! manual/reporting tool, not an order-time default.
//!
//! ## Purity
//! Aggregation is a pure function of order + catalog state: no side effects,
//! no hidden counters. Calling it twice on an unchanged order yields
//! bit-identical output, which keeps the calculation replayable for audit.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::compliance;
use crate::engine::{self, CalculationMethod, ComponentVatLine};
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Order, OrderLineItem, VatBreakdown};
use crate::validation::validate_quantity;

// =============================================================================
// Output Types
// =============================================================================

/// Per-line VAT info attached to an order line item by enrichment and
/// persisted as a JSON blob alongside the order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemVat {
    pub is_mixed_item: bool,
    pub method: CalculationMethod,

    /// VAT for ONE unit of the item.
    pub vat_amount: Money,

    /// `vat_amount` multiplied by the line quantity.
    pub line_vat: Money,

    /// Per-unit classification breakdown.
    pub breakdown: VatBreakdown,

    /// Component-level lines (empty for simple items).
    pub components: Vec<ComponentVatLine>,

    /// Rendered data-quality warnings for this line.
    pub warnings: Vec<String>,
}

/// One entry of the order-level per-item breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemVatBreakdown {
    pub item_id: String,
    pub item_name: String,
    pub is_mixed_item: bool,
    pub quantity: i64,

    /// VAT for one unit.
    pub vat_amount: Money,

    /// VAT for the whole line (`vat_amount` × quantity).
    pub line_vat: Money,

    pub components: Vec<ComponentVatLine>,
}

/// The order-level VAT summary persisted alongside the order record and
/// consumed by receipt rendering and HMRC reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderVatSummary {
    pub total_vat: Money,
    pub has_hot_food_vat: bool,
    pub has_mixed_items: bool,
    pub vat_breakdown: VatBreakdown,

    /// True iff every line item's compliance report is clean.
    pub hmrc_compliant: bool,

    pub item_breakdowns: Vec<ItemVatBreakdown>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Computes the order-level VAT summary.
///
/// Per line item: compute per-unit VAT via the engine (component-based),
/// multiply by quantity, accumulate into the classification buckets, and
/// validate compliance.
///
/// ## Errors
/// [`crate::CoreError::InvalidInput`] / validation errors for structural
/// problems (zero or negative quantity, empty item reference, negative
/// amounts). Data-quality issues land in per-line warnings instead.
pub fn compute_order_vat(order: &Order) -> CoreResult<OrderVatSummary> {
    let (summary, _) = compute(order)?;
    Ok(summary)
}

/// Returns a NEW order value with per-line VAT info and the order-level
/// summary attached.
///
/// Never mutates the input: keeping the un-enriched order intact makes the
/// calculation replayable and auditable.
pub fn enrich_order_with_vat(order: &Order) -> CoreResult<Order> {
    let (summary, line_vat) = compute(order)?;

    let mut enriched = order.clone();
    for (line, vat) in enriched.line_items.iter_mut().zip(line_vat) {
        line.vat = Some(vat);
    }
    enriched.vat_summary = Some(summary);
    Ok(enriched)
}

// =============================================================================
// Shared Computation
// =============================================================================

fn compute(order: &Order) -> CoreResult<(OrderVatSummary, Vec<LineItemVat>)> {
    let mut vat_breakdown = VatBreakdown::default();
    let mut item_breakdowns = Vec::with_capacity(order.line_items.len());
    let mut line_vat_infos = Vec::with_capacity(order.line_items.len());
    let mut has_mixed_items = false;
    let mut hmrc_compliant = true;

    for line in &order.line_items {
        let (entry, info, compliant) = compute_line(line)?;

        has_mixed_items |= entry.is_mixed_item;
        // One flagged line marks the whole order for review
        hmrc_compliant &= compliant;
        vat_breakdown.accumulate(&info.breakdown, line.quantity);

        item_breakdowns.push(entry);
        line_vat_infos.push(info);
    }

    let summary = OrderVatSummary {
        total_vat: vat_breakdown.total_vat,
        has_hot_food_vat: vat_breakdown.hot_food_vat.is_positive(),
        has_mixed_items,
        vat_breakdown,
        hmrc_compliant,
        item_breakdowns,
    };
    Ok((summary, line_vat_infos))
}

fn compute_line(line: &OrderLineItem) -> CoreResult<(ItemVatBreakdown, LineItemVat, bool)> {
    validate_quantity(line.quantity)?;

    // The aggregator's fixed choice: component-based
    let calc = engine::calculate_item_vat(&line.item, CalculationMethod::ComponentBased)?;
    let report = compliance::validate(&calc);

    let line_vat = calc.total_vat.multiply_quantity(line.quantity);

    let entry = ItemVatBreakdown {
        item_id: calc.item_id.clone(),
        item_name: calc.item_name.clone(),
        is_mixed_item: calc.is_mixed,
        quantity: line.quantity,
        vat_amount: calc.total_vat,
        line_vat,
        components: calc.component_lines.clone(),
    };

    let info = LineItemVat {
        is_mixed_item: calc.is_mixed,
        method: calc.method,
        vat_amount: calc.total_vat,
        line_vat,
        breakdown: calc.breakdown,
        components: calc.component_lines,
        warnings: calc.warnings.iter().map(|w| w.to_string()).collect(),
    };

    Ok((entry, info, report.is_compliant))
}

// =============================================================================
// Unit Tests
// =============================================================================
