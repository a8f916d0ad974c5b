//! # Compliance Validator
//!
//! Post-hoc checks that a computed VAT breakdown is well-formed, flagging
//! items that need human review before the figures go to HMRC.
//!
//! ## Warnings vs. Recommendations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WARNINGS        affect `is_compliant` - the item needs review         │
//! │  ─────────────────────────────────────────────────────────────────     │
//! │  • hot + cold components computed component-based (apportionment       │
//! │    is the HMRC-preferred method for that shape)                        │
//! │  • component costs drift from the listed price beyond 1p               │
//! │  • any engine data-quality finding (missing rate, non-standard rate)   │
//! │                                                                         │
//! │  RECOMMENDATIONS never affect compliance - informational only          │
//! │  ─────────────────────────────────────────────────────────────────     │
//! │  • cold-food-only items: document sub-60°C serving temperature         │
//! │    (HMRC substantiation requirement for zero-rating)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::engine::{CalculationMethod, ItemVatCalculation};

// =============================================================================
// Report
// =============================================================================

/// The outcome of validating one item's VAT calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComplianceReport {
    /// True iff the warning list is empty. Recommendations never affect
    /// this.
    pub is_compliant: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a computed item calculation against the HMRC review rules.
///
/// ## Example
/// ```rust
/// use savour_core::compliance::validate;
/// use savour_core::engine::{calculate_item_vat, CalculationMethod};
/// use savour_core::types::{MenuItemSnapshot, TaxRate, VatTreatment};
///
/// let item = MenuItemSnapshot {
///     item_id: "water".into(),
///     name: "Still Water".into(),
///     price_pence: 150,
///     treatment: VatTreatment::Simple { rate: Some(TaxRate::STANDARD), exempt: false },
/// };
/// let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
/// let report = validate(&calc);
/// assert!(report.is_compliant);
/// ```
pub fn validate(calc: &ItemVatCalculation) -> ComplianceReport {
    let mut warnings: Vec<String> = calc.warnings.iter().map(|w| w.to_string()).collect();
    let mut recommendations = Vec::new();

    // Hot + cold mixes are exactly the shape HMRC's apportionment method
    // exists for; computing them component-based is permitted but flagged
    if calc.mixes_hot_and_cold() && calc.method == CalculationMethod::ComponentBased {
        warnings.push(format!(
            "'{}' mixes hot and cold components but was computed component-based; \
             consider the cost-apportionment method",
            calc.item_name
        ));
    }

    // Zero-rating cold food carries a substantiation burden: the seller must
    // be able to show the food is sold below 60°C
    if calc.is_cold_food_only() {
        recommendations.push(format!(
            "'{}' is cold food only; document sub-60°C serving temperature to \
             substantiate zero-rating",
            calc.item_name
        ));
    }

    ComplianceReport {
        is_compliant: warnings.is_empty(),
        warnings,
        recommendations,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
