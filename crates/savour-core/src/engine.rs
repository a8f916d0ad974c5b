//! # VAT Apportionment Engine
//!
//! The algorithmic core: given a menu item snapshot, computes its per-unit
//! VAT using one of two selectable methods.
//!
//! ## The Two Methods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  METHOD A: COMPONENT-BASED (default)                                    │
//! │                                                                         │
//! │  Each active component's own cost and own rate are used directly:      │
//! │                                                                         │
//! │    Grilled Chicken  £8.00  hot_food  20%  → 8.00*20/120 = £1.3333      │
//! │    Coleslaw         £4.00  cold_food  0%  → 0                          │
//! │                                           ───────────────────────      │
//! │    Item VAT (sum un-rounded, round once)  → £1.33                      │
//! │                                                                         │
//! │  METHOD B: COST-APPORTIONMENT (HMRC-sanctioned alternative)             │
//! │                                                                         │
//! │  Re-bases the tax on the item's LISTED selling price, distributing     │
//! │  margin proportionally across classes by component cost:               │
//! │                                                                         │
//! │    Listed price £15.00, costs £8 hot + £4 cold = £12                   │
//! │    hot:  8/12 of £15.00 = £10.00 @ 20% → 10.00*20/120 = £1.6667        │
//! │    cold: 4/12 of £15.00 = £5.00  @ 0%  → 0                             │
//! │                                           ───────────────────────      │
//! │    Item VAT                               → £1.67                      │
//! │                                                                         │
//! │  Apportionment uses the CLASS default rate, not per-component          │
//! │  overrides: the method assumes one canonical rate per class.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! The engine never errors for data-quality issues (missing rate, cost
//! mismatch): it degrades to the classification default and records a
//! [`VatWarning`]. It DOES fail with [`CoreError::InvalidInput`] for
//! structurally invalid input (negative cost/price, empty item reference).

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, VatMicros};
use crate::types::{ItemComponent, MenuItemSnapshot, TaxRate, VatBreakdown, VatClass, VatTreatment};
use crate::COST_MATCH_TOLERANCE_PENCE;

// =============================================================================
// Calculation Method
// =============================================================================

/// The apportionment strategy, selected per call.
///
/// Both methods produce the same aggregate total when components are
/// homogeneous; they differ when components span multiple classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Each component's own cost and rate, summed. Preferred when components
    /// individually and reliably reflect real sub-costs.
    ComponentBased,
    /// Allocate the listed selling price across classes by cost proportion,
    /// then tax each allocation at the class default rate.
    CostApportionment,
}

// =============================================================================
// Data-Quality Warnings
// =============================================================================

/// A non-fatal data-quality finding recorded during calculation.
///
/// Warnings never abort a calculation - tax tooling must still produce a
/// number even with imperfect data, flagged for human review rather than
/// blocking order completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VatWarning {
    /// A component had no usable rate; the classification default was used.
    MissingRate {
        component: String,
        vat_class: VatClass,
        fallback: TaxRate,
    },

    /// A rate outside {0%, 20%} - permitted, but the UK has only two
    /// effective consumer food rates in this domain.
    NonStandardRate { source: String, rate: TaxRate },

    /// Active component costs don't sum to the listed price within the
    /// one-penny tolerance (component-based method only; apportionment
    /// deliberately re-bases on the selling price, so margin is expected).
    CostMismatch {
        component_total: Money,
        listed_price: Money,
    },

    /// A simple item with no rate set. Treated as zero-rated per platform
    /// policy, but surfaced so the admin can classify it.
    UnclassifiedItem { item: String },

    /// A mixed item with no active components (or zero total cost under
    /// apportionment). Computed as zero VAT.
    EmptyComposition { item: String },
}

impl fmt::Display for VatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VatWarning::MissingRate {
                component,
                vat_class,
                fallback,
            } => write!(
                f,
                "Component '{}' has no VAT rate; using {} default of {}%",
                component,
                vat_class.label(),
                fallback.percentage()
            ),
            VatWarning::NonStandardRate { source, rate } => write!(
                f,
                "'{}' uses non-standard rate {}% (UK food rates are 0% and 20%)",
                source,
                rate.percentage()
            ),
            VatWarning::CostMismatch {
                component_total,
                listed_price,
            } => write!(
                f,
                "Component costs sum to {} but the listed price is {}",
                component_total, listed_price
            ),
            VatWarning::UnclassifiedItem { item } => write!(
                f,
                "Item '{}' has no VAT rate set; treated as zero-rated",
                item
            ),
            VatWarning::EmptyComposition { item } => {
                write!(f, "Mixed item '{}' has no active components", item)
            }
        }
    }
}

// =============================================================================
// Calculation Result
// =============================================================================

/// One component's contribution to a mixed item's VAT.
///
/// Under cost-apportionment there is one line per classification, with the
/// allocated slice of the selling price in place of a component cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentVatLine {
    pub name: String,
    pub vat_class: VatClass,
    /// Component cost (component-based) or allocated price (apportionment).
    pub cost: Money,
    /// The rate actually applied (may be a classification fallback).
    pub rate: TaxRate,
    /// This line's VAT, rounded.
    pub vat: Money,
}

/// The engine's per-unit output for one item.
#[derive(Debug, Clone)]
pub struct ItemVatCalculation {
    pub item_id: String,
    pub item_name: String,
    pub is_mixed: bool,
    pub method: CalculationMethod,

    /// The item's listed selling price (gross).
    pub listed_price: Money,

    /// Sum of active component costs (zero for simple items).
    pub component_cost_total: Money,

    /// Per-unit VAT, rounded at this boundary.
    pub total_vat: Money,

    /// Per-classification breakdown; `total_vat` equals its total.
    pub breakdown: VatBreakdown,

    /// Per-component lines (empty for simple items).
    pub component_lines: Vec<ComponentVatLine>,

    /// Data-quality findings. Never fatal.
    pub warnings: Vec<VatWarning>,
}

impl ItemVatCalculation {
    /// Whether the calculation touched both hot and cold food components.
    pub fn mixes_hot_and_cold(&self) -> bool {
        let hot = self
            .component_lines
            .iter()
            .any(|l| l.vat_class == VatClass::HotFood);
        let cold = self
            .component_lines
            .iter()
            .any(|l| l.vat_class == VatClass::ColdFood);
        hot && cold
    }

    /// Whether every component line is cold food.
    pub fn is_cold_food_only(&self) -> bool {
        !self.component_lines.is_empty()
            && self
                .component_lines
                .iter()
                .all(|l| l.vat_class == VatClass::ColdFood)
    }
}

// =============================================================================
// Un-rounded Bucket Accumulator
// =============================================================================

/// Accumulates per-class VAT in micropence, rounding each bucket exactly
/// once when finished. The published total is the sum of the rounded bucket
/// figures so the breakdown record stays internally additive.
#[derive(Debug, Default)]
struct BreakdownAccumulator {
    buckets: [VatMicros; 5],
}

impl BreakdownAccumulator {
    fn add(&mut self, class: VatClass, vat: VatMicros) {
        let idx = VatClass::ALL
            .iter()
            .position(|c| *c == class)
            .expect("VatClass::ALL covers every classification");
        self.buckets[idx] += vat;
    }

    fn finish(self) -> VatBreakdown {
        let mut breakdown = VatBreakdown::default();
        for (idx, class) in VatClass::ALL.iter().enumerate() {
            let rounded = self.buckets[idx].to_money();
            *breakdown.class_vat_mut(*class) = rounded;
            breakdown.total_vat += rounded;
        }
        breakdown
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Computes one item's per-unit VAT using the selected method.
///
/// ## Errors
/// [`CoreError::InvalidInput`] for structurally invalid input: empty item
/// id, negative listed price, or a negative component cost. Everything else
/// degrades to a warning.
///
/// ## Example
/// ```rust
/// use savour_core::engine::{calculate_item_vat, CalculationMethod};
/// use savour_core::types::{ItemComponent, MenuItemSnapshot, VatClass, VatTreatment};
///
/// let item = MenuItemSnapshot {
///     item_id: "chicken-combo".into(),
///     name: "Chicken Combo".into(),
///     price_pence: 1200,
///     treatment: VatTreatment::Mixed {
///         components: vec![
///             ItemComponent {
///                 id: "c1".into(),
///                 menu_item_id: "chicken-combo".into(),
///                 name: "Grilled Chicken".into(),
///                 cost_pence: 800,
///                 vat_rate_bps: Some(2000),
///                 vat_class: VatClass::HotFood,
///                 is_active: true,
///                 display_order: 0,
///             },
///             ItemComponent {
///                 id: "c2".into(),
///                 menu_item_id: "chicken-combo".into(),
///                 name: "Coleslaw".into(),
///                 cost_pence: 400,
///                 vat_rate_bps: Some(0),
///                 vat_class: VatClass::ColdFood,
///                 is_active: true,
///                 display_order: 1,
///             },
///         ],
///     },
/// };
///
/// let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
/// assert_eq!(calc.total_vat.pence(), 133); // 8.00*20/120 = £1.33, coleslaw £0
/// ```
pub fn calculate_item_vat(
    item: &MenuItemSnapshot,
    method: CalculationMethod,
) -> CoreResult<ItemVatCalculation> {
    if item.item_id.trim().is_empty() {
        return Err(CoreError::invalid_input("item reference is empty"));
    }
    if item.price_pence < 0 {
        return Err(CoreError::invalid_input(format!(
            "listed price is negative: {}",
            item.price_pence
        )));
    }

    match &item.treatment {
        VatTreatment::Simple { rate, exempt } => calculate_simple(item, *rate, *exempt, method),
        VatTreatment::Mixed { components } => {
            for component in components {
                if component.cost_pence < 0 {
                    return Err(CoreError::invalid_input(format!(
                        "component '{}' cost is negative: {}",
                        component.name, component.cost_pence
                    )));
                }
            }
            match method {
                CalculationMethod::ComponentBased => calculate_component_based(item, components),
                CalculationMethod::CostApportionment => {
                    calculate_cost_apportionment(item, components)
                }
            }
        }
    }
}

// =============================================================================
// Simple Items
// =============================================================================

/// `vat = price * rate / (100 + rate)` if not exempt and a positive rate is
/// set, else zero. A missing rate is zero-rated per platform policy, with a
/// warning so the admin can classify the item.
fn calculate_simple(
    item: &MenuItemSnapshot,
    rate: Option<TaxRate>,
    exempt: bool,
    method: CalculationMethod,
) -> CoreResult<ItemVatCalculation> {
    let mut warnings = Vec::new();

    // Exemption overrides any rate value present
    let effective_rate = if exempt {
        TaxRate::ZERO
    } else {
        match rate {
            Some(rate) => {
                if !rate.is_standard_uk_rate() {
                    warnings.push(VatWarning::NonStandardRate {
                        source: item.name.clone(),
                        rate,
                    });
                }
                rate
            }
            None => {
                warn!(item = %item.item_id, "simple item has no VAT rate; treating as zero-rated");
                warnings.push(VatWarning::UnclassifiedItem {
                    item: item.name.clone(),
                });
                TaxRate::ZERO
            }
        }
    };

    let mut acc = BreakdownAccumulator::default();
    // Simple items have no classification of their own; their VAT reports
    // under the Other bucket
    acc.add(VatClass::Other, item.price().extract_vat_exact(effective_rate));
    let breakdown = acc.finish();

    Ok(ItemVatCalculation {
        item_id: item.item_id.clone(),
        item_name: item.name.clone(),
        is_mixed: false,
        method,
        listed_price: item.price(),
        component_cost_total: Money::zero(),
        total_vat: breakdown.total_vat,
        breakdown,
        component_lines: Vec::new(),
        warnings,
    })
}

// =============================================================================
// Method A: Component-Based
// =============================================================================

fn calculate_component_based(
    item: &MenuItemSnapshot,
    components: &[ItemComponent],
) -> CoreResult<ItemVatCalculation> {
    let mut warnings = Vec::new();
    let mut acc = BreakdownAccumulator::default();
    let mut lines = Vec::new();
    let mut cost_total = Money::zero();

    let active: Vec<&ItemComponent> = components.iter().filter(|c| c.is_active).collect();

    if active.is_empty() {
        warnings.push(VatWarning::EmptyComposition {
            item: item.name.clone(),
        });
    }

    for component in &active {
        let rate = match component.rate() {
            Some(rate) => {
                if !rate.is_standard_uk_rate() {
                    warnings.push(VatWarning::NonStandardRate {
                        source: component.name.clone(),
                        rate,
                    });
                }
                rate
            }
            None => {
                let fallback = component.vat_class.default_rate();
                warn!(
                    component = %component.name,
                    class = ?component.vat_class,
                    "component has no VAT rate; using classification default"
                );
                warnings.push(VatWarning::MissingRate {
                    component: component.name.clone(),
                    vat_class: component.vat_class,
                    fallback,
                });
                fallback
            }
        };

        let vat = component.cost().extract_vat_exact(rate);
        acc.add(component.vat_class, vat);
        cost_total += component.cost();

        lines.push(ComponentVatLine {
            name: component.name.clone(),
            vat_class: component.vat_class,
            cost: component.cost(),
            rate,
            vat: vat.to_money(),
        });
    }

    // The component costs ARE the tax base here, so a drift from the listed
    // price is a data-quality finding
    if !active.is_empty()
        && (cost_total.pence() - item.price_pence).abs() > COST_MATCH_TOLERANCE_PENCE
    {
        warnings.push(VatWarning::CostMismatch {
            component_total: cost_total,
            listed_price: item.price(),
        });
    }

    let breakdown = acc.finish();

    Ok(ItemVatCalculation {
        item_id: item.item_id.clone(),
        item_name: item.name.clone(),
        is_mixed: true,
        method: CalculationMethod::ComponentBased,
        listed_price: item.price(),
        component_cost_total: cost_total,
        total_vat: breakdown.total_vat,
        breakdown,
        component_lines: lines,
        warnings,
    })
}

// =============================================================================
// Method B: Cost-Apportionment
// =============================================================================

fn calculate_cost_apportionment(
    item: &MenuItemSnapshot,
    components: &[ItemComponent],
) -> CoreResult<ItemVatCalculation> {
    let mut warnings = Vec::new();

    let active: Vec<&ItemComponent> = components.iter().filter(|c| c.is_active).collect();
    let cost_total: i64 = active.iter().map(|c| c.cost_pence).sum();

    if cost_total == 0 {
        // Nothing to apportion against: degrade to zero, flag for review
        warnings.push(VatWarning::EmptyComposition {
            item: item.name.clone(),
        });
        return Ok(ItemVatCalculation {
            item_id: item.item_id.clone(),
            item_name: item.name.clone(),
            is_mixed: true,
            method: CalculationMethod::CostApportionment,
            listed_price: item.price(),
            component_cost_total: Money::zero(),
            total_vat: Money::zero(),
            breakdown: VatBreakdown::default(),
            component_lines: Vec::new(),
            warnings,
        });
    }

    // Group active component costs by classification
    let mut cost_by_class = [0i64; 5];
    for component in &active {
        let idx = VatClass::ALL
            .iter()
            .position(|c| *c == component.vat_class)
            .expect("VatClass::ALL covers every classification");
        cost_by_class[idx] += component.cost_pence;
    }

    let mut acc = BreakdownAccumulator::default();
    let mut lines = Vec::new();

    for (idx, class) in VatClass::ALL.iter().enumerate() {
        let class_cost = cost_by_class[idx];
        if class_cost == 0 {
            continue;
        }

        // allocated = listed_price * (class_cost / total_cost), held in
        // micropence so the proportions stay exact
        let allocated_micros =
            item.price_pence as i128 * 1_000_000 * class_cost as i128 / cost_total as i128;

        // Apportionment assumes one canonical rate per class: the default
        // table, never a per-component override
        let rate = class.default_rate();
        let vat = micros_extract_vat(allocated_micros, rate);

        acc.add(*class, vat);

        lines.push(ComponentVatLine {
            name: class.label().to_string(),
            vat_class: *class,
            cost: Money::from_pence(((allocated_micros + 500_000) / 1_000_000) as i64),
            rate,
            vat: vat.to_money(),
        });
    }

    let breakdown = acc.finish();

    Ok(ItemVatCalculation {
        item_id: item.item_id.clone(),
        item_name: item.name.clone(),
        is_mixed: true,
        method: CalculationMethod::CostApportionment,
        listed_price: item.price(),
        component_cost_total: Money::from_pence(cost_total),
        total_vat: breakdown.total_vat,
        breakdown,
        component_lines: lines,
        warnings,
    })
}

/// Extracts VAT from an un-rounded micropence amount: `m * bps / (10000 + bps)`.
fn micros_extract_vat(amount_micros: i128, rate: TaxRate) -> VatMicros {
    if rate.is_zero() {
        return VatMicros::zero();
    }
    let bps = rate.bps() as i128;
    VatMicros::from_raw(amount_micros * bps / (10_000 + bps))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn component(
        name: &str,
        cost_pence: i64,
        rate_bps: Option<u32>,
        class: VatClass,
        active: bool,
    ) -> ItemComponent {
        ItemComponent {
            id: format!("cmp-{name}"),
            menu_item_id: "item-1".to_string(),
            name: name.to_string(),
            cost_pence,
            vat_rate_bps: rate_bps,
            vat_class: class,
            is_active: active,
            display_order: 0,
        }
    }

    fn mixed_item(price_pence: i64, components: Vec<ItemComponent>) -> MenuItemSnapshot {
        MenuItemSnapshot {
            item_id: "item-1".to_string(),
            name: "Chicken Combo".to_string(),
            price_pence,
            treatment: VatTreatment::Mixed { components },
        }
    }

    fn simple_item(price_pence: i64, rate: Option<TaxRate>, exempt: bool) -> MenuItemSnapshot {
        MenuItemSnapshot {
            item_id: "item-2".to_string(),
            name: "Bottled Water".to_string(),
            price_pence,
            treatment: VatTreatment::Simple { rate, exempt },
        }
    }

    #[test]
    fn test_simple_item_standard_rate() {
        // £12.00 gross at 20% → 12 * 20/120 = £2.00
        let item = simple_item(1200, Some(TaxRate::STANDARD), false);
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert_eq!(calc.total_vat.pence(), 200);
        assert!(!calc.is_mixed);
        assert!(calc.warnings.is_empty());
    }

    #[test]
    fn test_simple_item_zero_rate() {
        let item = simple_item(1200, Some(TaxRate::ZERO), false);
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert!(calc.total_vat.is_zero());
    }

    #[test]
    fn test_exemption_overrides_rate() {
        let item = simple_item(1200, Some(TaxRate::STANDARD), true);
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert!(calc.total_vat.is_zero());
        assert!(calc.warnings.is_empty());
    }

    #[test]
    fn test_unclassified_simple_item_is_zero_rated_with_warning() {
        let item = simple_item(1200, None, false);
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert!(calc.total_vat.is_zero());
        assert!(matches!(
            calc.warnings.as_slice(),
            [VatWarning::UnclassifiedItem { .. }]
        ));
    }

    #[test]
    fn test_component_based_mixed_item() {
        // hot £8.00 @ 20% → £1.3333 → £1.33, cold £4.00 @ 0% → 0
        let item = mixed_item(
            1200,
            vec![
                component("Grilled Chicken", 800, Some(2000), VatClass::HotFood, true),
                component("Coleslaw", 400, Some(0), VatClass::ColdFood, true),
            ],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert_eq!(calc.total_vat.pence(), 133);
        assert_eq!(calc.breakdown.hot_food_vat.pence(), 133);
        assert!(calc.breakdown.cold_food_vat.is_zero());
        assert!(calc.is_mixed);
        assert_eq!(calc.component_lines.len(), 2);
        assert!(calc.warnings.is_empty());
    }

    #[test]
    fn test_component_based_additivity() {
        // Total equals the sum of individually computed component VAT
        let item = mixed_item(
            1600,
            vec![
                component("Hot A", 800, Some(2000), VatClass::HotFood, true),
                component("Hot B", 800, Some(2000), VatClass::HotFood, true),
            ],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        // 1.3333 + 1.3333 = 2.6667 → £2.67 (rounded once, not per component)
        assert_eq!(calc.total_vat.pence(), 267);
    }

    #[test]
    fn test_inactive_component_excluded() {
        let item = mixed_item(
            800,
            vec![
                component("Grilled Chicken", 800, Some(2000), VatClass::HotFood, true),
                component("Seasonal Side", 400, Some(2000), VatClass::HotFood, false),
            ],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert_eq!(calc.total_vat.pence(), 133);
        assert_eq!(calc.component_lines.len(), 1);
        assert_eq!(calc.component_cost_total.pence(), 800);
    }

    #[test]
    fn test_missing_rate_falls_back_to_class_default() {
        let item = mixed_item(
            800,
            vec![component("Mystery Main", 800, None, VatClass::HotFood, true)],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        // hot_food default is 20%: 8.00*20/120 = £1.33
        assert_eq!(calc.total_vat.pence(), 133);
        assert!(matches!(
            calc.warnings.as_slice(),
            [VatWarning::MissingRate {
                fallback: TaxRate::STANDARD,
                ..
            }]
        ));
    }

    #[test]
    fn test_non_standard_rate_flagged_not_rejected() {
        let item = mixed_item(
            1000,
            vec![component("Imported Treat", 1000, Some(500), VatClass::Other, true)],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        // 10.00 * 5/105 = 0.4762 → £0.48
        assert_eq!(calc.total_vat.pence(), 48);
        assert!(calc
            .warnings
            .iter()
            .any(|w| matches!(w, VatWarning::NonStandardRate { .. })));
    }

    #[test]
    fn test_cost_mismatch_warning() {
        let item = mixed_item(
            1500, // listed price diverges from £12.00 of costs
            vec![
                component("Hot", 800, Some(2000), VatClass::HotFood, true),
                component("Cold", 400, Some(0), VatClass::ColdFood, true),
            ],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        assert!(calc
            .warnings
            .iter()
            .any(|w| matches!(w, VatWarning::CostMismatch { .. })));
    }

    #[test]
    fn test_cost_apportionment() {
        // Listed £15.00; costs £8 hot + £4 cold.
        // hot 8/12 of 15.00 = £10.00 @20% → £1.6667 → £1.67; cold → 0
        let item = mixed_item(
            1500,
            vec![
                component("Hot", 800, Some(2000), VatClass::HotFood, true),
                component("Cold", 400, Some(0), VatClass::ColdFood, true),
            ],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::CostApportionment).unwrap();
        assert_eq!(calc.total_vat.pence(), 167);
        assert_eq!(calc.breakdown.hot_food_vat.pence(), 167);
        // Margin is expected under apportionment: no mismatch warning
        assert!(calc.warnings.is_empty());

        // Conservation: allocated prices sum to the listed price (±1p)
        let allocated: i64 = calc.component_lines.iter().map(|l| l.cost.pence()).sum();
        assert!((allocated - 1500).abs() <= 1);
    }

    #[test]
    fn test_apportionment_ignores_component_rate_overrides() {
        // The hot component claims 5%, but apportionment uses the class
        // default of 20%
        let item = mixed_item(
            1200,
            vec![component("Hot", 1200, Some(500), VatClass::HotFood, true)],
        );
        let calc = calculate_item_vat(&item, CalculationMethod::CostApportionment).unwrap();
        assert_eq!(calc.total_vat.pence(), 200); // 12.00 * 20/120
    }

    #[test]
    fn test_methods_agree_on_homogeneous_components() {
        // One class, costs summing to the listed price: both methods match
        let components = vec![
            component("Hot A", 700, Some(2000), VatClass::HotFood, true),
            component("Hot B", 500, Some(2000), VatClass::HotFood, true),
        ];
        let item = mixed_item(1200, components);
        let a = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
        let b = calculate_item_vat(&item, CalculationMethod::CostApportionment).unwrap();
        assert_eq!(a.total_vat, b.total_vat);
    }

    #[test]
    fn test_empty_composition_degrades_to_zero() {
        let item = mixed_item(1200, vec![]);
        for method in [
            CalculationMethod::ComponentBased,
            CalculationMethod::CostApportionment,
        ] {
            let calc = calculate_item_vat(&item, method).unwrap();
            assert!(calc.total_vat.is_zero());
            assert!(calc
                .warnings
                .iter()
                .any(|w| matches!(w, VatWarning::EmptyComposition { .. })));
        }
    }

    #[test]
    fn test_negative_cost_is_invalid_input() {
        let item = mixed_item(
            1200,
            vec![component("Broken", -100, Some(2000), VatClass::HotFood, true)],
        );
        let err = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_item_reference_is_invalid_input() {
        let item = MenuItemSnapshot {
            item_id: "  ".to_string(),
            name: "Ghost".to_string(),
            price_pence: 100,
            treatment: VatTreatment::Simple {
                rate: Some(TaxRate::STANDARD),
                exempt: false,
            },
        };
        let err = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_negative_price_is_invalid_input() {
        let item = simple_item(-1200, Some(TaxRate::STANDARD), false);
        let err = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
