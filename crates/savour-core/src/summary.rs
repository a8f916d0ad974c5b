//! # VAT Summary Generation
//!
//! Turns an order-level VAT summary into the two consumer-facing shapes:
//! human-readable receipt lines and the HMRC reporting summary.
//!
//! ## Consumers
//! ```text
//! OrderVatSummary ──► generate_vat_summary ──┬──► receipt rendering
//!                                            └──► HMRC return reporting
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregator::OrderVatSummary;
use crate::money::Money;
use crate::types::VatClass;

// =============================================================================
// Output Types
// =============================================================================

/// Item and VAT totals grouped the way an HMRC return wants them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HmrcSummary {
    /// Simple lines taxed at the standard rate.
    pub standard_rate_items: u32,
    pub standard_rate_vat: Money,

    /// Simple lines with no VAT due (zero-rated, exempt, or unclassified).
    pub zero_rate_items: u32,
    pub zero_rate_vat: Money,

    /// Lines with a component breakdown; their VAT is spread across rates
    /// and reports only into the total.
    pub mixed_items: u32,

    pub total_vat: Money,
}

/// The rendered summary pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatSummary {
    /// Human-readable lines, e.g. `"Hot Food VAT (20%): £3.40"`.
    pub display_summary: Vec<String>,
    pub hmrc_summary: HmrcSummary,
}

// =============================================================================
// Generation
// =============================================================================

/// Builds the receipt display lines and HMRC summary for a computed order.
pub fn generate_vat_summary(summary: &OrderVatSummary) -> VatSummary {
    let mut display_summary = Vec::new();

    for class in VatClass::ALL {
        let amount = summary.vat_breakdown.class_vat(class);
        if amount.is_zero() {
            continue;
        }
        display_summary.push(format!(
            "{} VAT ({:.0}%): {}",
            class.label(),
            class.default_rate().percentage(),
            amount
        ));
    }
    display_summary.push(format!("Total VAT: {}", summary.total_vat));
    if !summary.hmrc_compliant {
        display_summary.push("Flagged for VAT review".to_string());
    }

    let mut hmrc = HmrcSummary {
        standard_rate_items: 0,
        standard_rate_vat: Money::zero(),
        zero_rate_items: 0,
        zero_rate_vat: Money::zero(),
        mixed_items: 0,
        total_vat: summary.total_vat,
    };

    for entry in &summary.item_breakdowns {
        if entry.is_mixed_item {
            hmrc.mixed_items += 1;
        } else if entry.vat_amount.is_positive() {
            hmrc.standard_rate_items += 1;
            hmrc.standard_rate_vat += entry.line_vat;
        } else {
            hmrc.zero_rate_items += 1;
            // Zero by definition, kept explicit for the report shape
            hmrc.zero_rate_vat += entry.line_vat;
        }
    }

    VatSummary {
        display_summary,
        hmrc_summary: hmrc,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
