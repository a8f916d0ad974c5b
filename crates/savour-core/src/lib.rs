//! # savour-core: Pure VAT Business Logic for Savour
//!
//! This crate is the **heart** of the Savour ordering platform's tax
//! subsystem. It contains all order-time VAT computation as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Savour VAT Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Ordering Platform (storefront / admin)               │   │
//! │  │    Menu UI ──► Cart ──► Checkout ──► Receipt / HMRC report     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ savour-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │   engine   │  │aggregator│  │   │
//! │  │   │ VatClass  │  │   Money   │  │ two VAT    │  │ per-order│  │   │
//! │  │   │ MenuItem  │  │ VatMicros │  │ strategies │  │ buckets  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └──────────┘  │   │
//! │  │   ┌────────────┐  ┌───────────┐  ┌────────────┐               │   │
//! │  │   │ compliance │  │  summary  │  │ validation │               │   │
//! │  │   └────────────┘  └───────────┘  └────────────┘               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    savour-db (Database Layer)                   │   │
//! │  │        Component catalog, item composition, order records       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (VatClass, components, orders, tagged items)
//! - [`money`] - Money in pence plus exact VAT extraction (no floating point!)
//! - [`engine`] - The VAT Apportionment Engine (two selectable strategies)
//! - [`aggregator`] - Order-level VAT accumulation and enrichment
//! - [`compliance`] - HMRC compliance validation of computed breakdowns
//! - [`summary`] - Receipt display lines and HMRC reporting summary
//! - [`validation`] - Input validation for catalog mutations
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every calculation is deterministic - same order +
//!    same catalog state = bit-identical output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are pence (i64); VAT accumulates
//!    in micropence (i128) and rounds once at the public boundary
//! 4. **Degrade, don't abort**: data-quality issues become warnings with a
//!    documented fallback; only structurally invalid input is an error
//!
//! ## Example Usage
//!
//! ```rust
//! use savour_core::engine::{calculate_item_vat, CalculationMethod};
//! use savour_core::types::{MenuItemSnapshot, TaxRate, VatTreatment};
//!
//! // A simple item: £12.00 gross at the 20% standard rate
//! let item = MenuItemSnapshot {
//!     item_id: "fish-and-chips".to_string(),
//!     name: "Fish & Chips".to_string(),
//!     price_pence: 1200,
//!     treatment: VatTreatment::Simple {
//!         rate: Some(TaxRate::STANDARD),
//!         exempt: false,
//!     },
//! };
//!
//! let calc = calculate_item_vat(&item, CalculationMethod::ComponentBased).unwrap();
//! // VAT is extracted from the gross price: 12.00 * 20/120 = £2.00
//! assert_eq!(calc.total_vat.pence(), 200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod compliance;
pub mod engine;
pub mod error;
pub mod money;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use savour_core::Money` instead of
// `use savour_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::{Money, VatMicros};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tolerance, in pence, when comparing the sum of a mixed item's component
/// costs against its listed selling price.
///
/// ## Business Reason
/// Component costs are entered by admins and SHOULD sum to the listed price,
/// but a one-penny drift from rounding the individual entries is normal and
/// must not flag the item for review.
pub const COST_MATCH_TOLERANCE_PENCE: i64 = 1;

/// Maximum quantity of a single line item in an order.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Configurable per-tenant in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;
