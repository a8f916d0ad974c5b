//! # Domain Types
//!
//! Core domain types for the Savour VAT subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ComponentTemplate │   │  ItemComponent   │   │ CommonComponent  │    │
//! │  │ ───────────────  │   │ ───────────────  │   │ ───────────────  │    │
//! │  │ id (UUID)        │   │ id (UUID)        │   │ tenant catalog   │    │
//! │  │ tenant_id        │   │ menu_item_id     │   │ avg cost         │    │
//! │  │ components[]     │   │ cost / rate      │   │ usage_count      │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │     TaxRate      │   │     VatClass     │   │   VatTreatment   │    │
//! │  │ ───────────────  │   │ ───────────────  │   │ ───────────────  │    │
//! │  │ bps (u32)        │   │ HotFood          │   │ Simple{rate,     │    │
//! │  │ 2000 = 20%       │   │ ColdFood         │   │        exempt}   │    │
//! │  │                  │   │ Alcohol ...      │   │ Mixed{components}│    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business identity: (tenant_id, name) - human-readable, potentially mutable
//!
//! ## Simple vs. Mixed
//! A menu item is EITHER simple (one flat rate, or exempt) OR mixed (a list
//! of components each carrying its own classification). This is a tagged
//! union ([`VatTreatment`]), resolved once when the item is loaded - never
//! re-sniffed ad hoc at call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// VAT rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (UK standard rate)
///
/// A rate that cannot be negative at the type level means the engine never
/// has to defend against negative rates; mutation validation rejects them
/// before they are ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// UK standard rate: 20%.
    pub const STANDARD: TaxRate = TaxRate(2000);

    /// UK zero rate: 0% (e.g. cold takeaway food).
    pub const ZERO: TaxRate = TaxRate(0);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// UK consumer food sales have only two effective rates: 0% and 20%.
    /// Anything else is permitted but flagged as non-standard (advisory).
    #[inline]
    pub const fn is_standard_uk_rate(&self) -> bool {
        self.0 == 0 || self.0 == 2000
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::ZERO
    }
}

// =============================================================================
// VAT Classification
// =============================================================================

/// Tax classification of a component.
///
/// ## Why A Closed Enum?
/// The source of truth for default rates and the order-level breakdown
/// buckets is this classification. A closed enum makes the default-rate
/// lookup and the bucket accumulation exhaustive and compiler-checked; a
/// free string would silently bucket typos into nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VatClass {
    /// Food sold hot (above ambient temperature): standard-rated.
    HotFood,
    /// Cold takeaway food: zero-rated.
    ColdFood,
    /// Alcoholic drinks: always standard-rated.
    Alcohol,
    /// Soft drinks: standard-rated (not "food" for VAT purposes).
    SoftDrink,
    /// Anything else: standard-rated by default.
    Other,
}

impl VatClass {
    /// All classifications, in breakdown-bucket order.
    pub const ALL: [VatClass; 5] = [
        VatClass::HotFood,
        VatClass::ColdFood,
        VatClass::Alcohol,
        VatClass::SoftDrink,
        VatClass::Other,
    ];

    /// The classification-keyed default rate table.
    ///
    /// Used as the fallback when a component's own rate is missing, and as
    /// the canonical per-class rate for cost apportionment. Pure read-only
    /// domain knowledge - deliberately a function, not mutable state.
    ///
    /// ```text
    /// hot_food   → 20%     cold_food  → 0%
    /// alcohol    → 20%     soft_drink → 20%
    /// other      → 20%
    /// ```
    #[inline]
    pub const fn default_rate(&self) -> TaxRate {
        match self {
            VatClass::ColdFood => TaxRate::ZERO,
            VatClass::HotFood | VatClass::Alcohol | VatClass::SoftDrink | VatClass::Other => {
                TaxRate::STANDARD
            }
        }
    }

    /// Human-readable label for receipts and reports.
    pub const fn label(&self) -> &'static str {
        match self {
            VatClass::HotFood => "Hot Food",
            VatClass::ColdFood => "Cold Food",
            VatClass::Alcohol => "Alcohol",
            VatClass::SoftDrink => "Soft Drink",
            VatClass::Other => "Other",
        }
    }
}

// =============================================================================
// Component Catalog
// =============================================================================

/// A named, reusable bundle of components owned by a tenant.
///
/// ## Lifecycle
/// Created by an admin action; soft-deactivated, never hard-deleted while
/// referenced by menu items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentTemplate {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this template belongs to.
    pub tenant_id: String,

    /// Display name (e.g. "Roast Dinner Base").
    pub name: String,

    /// Optional admin-facing description.
    pub description: Option<String>,

    /// Whether the template is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One line within a component template.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateComponent {
    pub id: String,

    /// Parent template.
    pub template_id: String,

    /// Component name (e.g. "Grilled Chicken"). Adjustments when applying a
    /// template to an item are keyed by this name.
    pub name: String,

    /// Default cost in pence (gross).
    pub default_cost_pence: i64,

    /// VAT rate in basis points. None = unclassified; the engine falls back
    /// to the classification default.
    pub vat_rate_bps: Option<u32>,

    /// Tax classification.
    pub vat_class: VatClass,

    /// Display order within the template. Unique within a template by
    /// convention (advisory, not enforced).
    pub display_order: i64,
}

impl TemplateComponent {
    /// Returns the default cost as Money.
    #[inline]
    pub fn default_cost(&self) -> Money {
        Money::from_pence(self.default_cost_pence)
    }
}

// =============================================================================
// Item Composition
// =============================================================================

/// The tax/cost breakdown line of one concrete menu item.
///
/// Typically instantiated from a [`TemplateComponent`] with optional
/// per-item overrides (cost, rate, exclusion).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemComponent {
    pub id: String,

    /// Owning menu item.
    pub menu_item_id: String,

    /// Component name.
    pub name: String,

    /// Cost in pence (gross - VAT is extracted, never added).
    pub cost_pence: i64,

    /// VAT rate in basis points. None = unclassified.
    pub vat_rate_bps: Option<u32>,

    /// Tax classification.
    pub vat_class: VatClass,

    /// Whether the component participates in VAT computation.
    pub is_active: bool,

    /// Display order within the item.
    pub display_order: i64,
}

impl ItemComponent {
    /// Returns the cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_pence(self.cost_pence)
    }

    /// Returns the component's own rate, if classified.
    #[inline]
    pub fn rate(&self) -> Option<TaxRate> {
        self.vat_rate_bps.map(TaxRate::from_bps)
    }
}

/// A tenant-scoped, frequency-ranked catalog entry used to suggest and
/// autocomplete components when building new items or templates.
///
/// `usage_count` increments each time the component name is reused; the
/// average cost tracks what admins typically enter for it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommonComponent {
    pub id: String,
    pub tenant_id: String,
    pub name: String,

    /// Running average cost in pence across all uses.
    pub avg_cost_pence: i64,

    pub vat_rate_bps: Option<u32>,
    pub vat_class: VatClass,

    /// How many times this name has been reused.
    pub usage_count: i64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Menu Catalog
// =============================================================================

/// A catalog menu item: the flat VAT columns that apply when the item has no
/// component composition.
///
/// ## Relationship to [`VatTreatment`]
/// This is the stored record. At order-compute time the db layer resolves it
/// (together with any active components) into a [`VatTreatment`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this item belongs to.
    pub tenant_id: String,

    /// Display name (e.g. "Fish & Chips").
    pub name: String,

    /// Listed selling price in pence (gross, VAT-inclusive).
    pub price_pence: i64,

    /// Flat VAT rate in basis points. None = unclassified; ignored once the
    /// item has active components.
    pub vat_rate_bps: Option<u32>,

    /// VAT exemption flag; overrides any rate present.
    pub is_vat_exempt: bool,

    /// Whether the item is orderable (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Returns the listed price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_pence(self.price_pence)
    }
}

// =============================================================================
// Menu Item (tagged union, resolved at load time)
// =============================================================================

/// How a menu item is taxed: one flat rate, or a per-component breakdown.
///
/// ## Resolution
/// The database does not store a reliable flag; mixed-ness is inferred from
/// the presence of active components at order-compute time. The db layer
/// performs that lookup ONCE per item and produces this union, so the engine
/// and aggregator never re-sniff.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "vat_type", rename_all = "snake_case")]
pub enum VatTreatment {
    /// One flat tax rate (or VAT-exempt).
    Simple {
        /// None = not yet classified by an admin; treated as 0% with a
        /// data-quality warning.
        rate: Option<TaxRate>,
        /// Exemption overrides any rate value present.
        exempt: bool,
    },
    /// Sub-components, each with an independent classification.
    Mixed {
        /// Active components only, in display order.
        components: Vec<ItemComponent>,
    },
}

/// A menu item as seen by the VAT engine: the order-time snapshot of its
/// listed price plus its resolved tax treatment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItemSnapshot {
    /// The menu item this snapshot was taken from.
    pub item_id: String,

    /// Name at order time (frozen).
    pub name: String,

    /// Listed selling price in pence at order time (frozen, gross).
    pub price_pence: i64,

    /// Resolved tax treatment.
    pub treatment: VatTreatment,
}

impl MenuItemSnapshot {
    /// Returns the listed price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_pence(self.price_pence)
    }

    /// Whether this item carries a component breakdown.
    #[inline]
    pub fn is_mixed(&self) -> bool {
        matches!(self.treatment, VatTreatment::Mixed { .. })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order: a menu item snapshot at a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineItem {
    pub id: String,

    /// Units ordered. Must be positive.
    pub quantity: i64,

    /// Add-on pass-through cost in pence. Add-ons are out of scope for tax
    /// and treated as zero-rated; this figure never enters the engine.
    pub add_on_total_pence: i64,

    /// The resolved item snapshot.
    pub item: MenuItemSnapshot,

    /// Per-line VAT info, attached by enrichment. None until computed.
    pub vat: Option<crate::aggregator::LineItemVat>,
}

/// An order awaiting (or carrying) its VAT computation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    pub line_items: Vec<OrderLineItem>,

    /// Order-level VAT summary, attached by enrichment. None until computed.
    pub vat_summary: Option<crate::aggregator::OrderVatSummary>,
}

// =============================================================================
// VAT Breakdown Record
// =============================================================================

/// The five-bucket VAT breakdown that recurs at item level and order level.
///
/// ## Invariant
/// The published record is internally consistent: `total_vat` equals the sum
/// of the five class figures. Accumulation happens un-rounded upstream; each
/// figure here is a rounded boundary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBreakdown {
    pub hot_food_vat: Money,
    pub cold_food_vat: Money,
    pub alcohol_vat: Money,
    pub soft_drink_vat: Money,
    pub other_vat: Money,
    pub total_vat: Money,
}

impl VatBreakdown {
    /// The figure for one classification bucket.
    pub fn class_vat(&self, class: VatClass) -> Money {
        match class {
            VatClass::HotFood => self.hot_food_vat,
            VatClass::ColdFood => self.cold_food_vat,
            VatClass::Alcohol => self.alcohol_vat,
            VatClass::SoftDrink => self.soft_drink_vat,
            VatClass::Other => self.other_vat,
        }
    }

    /// Mutable access to one bucket (total is maintained by the caller).
    pub(crate) fn class_vat_mut(&mut self, class: VatClass) -> &mut Money {
        match class {
            VatClass::HotFood => &mut self.hot_food_vat,
            VatClass::ColdFood => &mut self.cold_food_vat,
            VatClass::Alcohol => &mut self.alcohol_vat,
            VatClass::SoftDrink => &mut self.soft_drink_vat,
            VatClass::Other => &mut self.other_vat,
        }
    }

    /// Adds another breakdown scaled by a quantity (order aggregation).
    pub fn accumulate(&mut self, other: &VatBreakdown, quantity: i64) {
        for class in VatClass::ALL {
            *self.class_vat_mut(class) += other.class_vat(class) * quantity;
        }
        self.total_vat += other.total_vat * quantity;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_constants() {
        assert_eq!(TaxRate::STANDARD.bps(), 2000);
        assert!((TaxRate::STANDARD.percentage() - 20.0).abs() < 0.001);
        assert!(TaxRate::ZERO.is_zero());
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(20.0), TaxRate::STANDARD);
        assert_eq!(TaxRate::from_percentage(0.0), TaxRate::ZERO);
        assert_eq!(TaxRate::from_percentage(12.5).bps(), 1250);
    }

    #[test]
    fn test_standard_uk_rate_flagging() {
        assert!(TaxRate::ZERO.is_standard_uk_rate());
        assert!(TaxRate::STANDARD.is_standard_uk_rate());
        assert!(!TaxRate::from_bps(500).is_standard_uk_rate());
    }

    #[test]
    fn test_default_rate_table() {
        assert_eq!(VatClass::HotFood.default_rate(), TaxRate::STANDARD);
        assert_eq!(VatClass::ColdFood.default_rate(), TaxRate::ZERO);
        assert_eq!(VatClass::Alcohol.default_rate(), TaxRate::STANDARD);
        assert_eq!(VatClass::SoftDrink.default_rate(), TaxRate::STANDARD);
        assert_eq!(VatClass::Other.default_rate(), TaxRate::STANDARD);
    }

    #[test]
    fn test_breakdown_accumulate() {
        let per_unit = VatBreakdown {
            hot_food_vat: Money::from_pence(133),
            total_vat: Money::from_pence(133),
            ..Default::default()
        };

        let mut order = VatBreakdown::default();
        order.accumulate(&per_unit, 3);

        assert_eq!(order.hot_food_vat.pence(), 399);
        assert_eq!(order.total_vat.pence(), 399);
        assert!(order.cold_food_vat.is_zero());
    }
}
