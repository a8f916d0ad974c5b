//! # Validation Module
//!
//! Input validation for catalog mutations and order lines.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin frontend (TypeScript)                                  │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (business rule validation)                       │
//! │  ├── Runs before any write; owning transaction rolls back on failure   │
//! │  └── Also guards order computation (quantity bounds)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use savour_core::validation::{validate_component_name, validate_quantity};
//!
//! // Validate a component before database insert
//! validate_component_name("Grilled Chicken").unwrap();
//!
//! // Validate a line quantity before VAT computation
//! validate_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::TemplateComponent;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a component name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ## Note
/// Names are load-bearing: template application keys its per-item
/// adjustments by component name, so an empty name could never be adjusted.
///
/// ## Example
/// ```rust
/// use savour_core::validation::validate_component_name;
///
/// assert!(validate_component_name("Grilled Chicken").is_ok());
/// assert!(validate_component_name("").is_err());
/// ```
pub fn validate_component_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "component name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "component name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a menu item name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "item name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "item name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a template name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_template_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "template name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "template name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a component cost in pence.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary components still need a VAT class)
///
/// ## Example
/// ```rust
/// use savour_core::validation::validate_component_cost;
///
/// assert!(validate_component_cost(450).is_ok());  // £4.50
/// assert!(validate_component_cost(0).is_ok());    // Free side
/// assert!(validate_component_cost(-100).is_err());
/// ```
pub fn validate_component_cost(pence: i64) -> ValidationResult<()> {
    if pence < 0 {
        return Err(ValidationError::Negative {
            field: "component cost".to_string(),
        });
    }

    Ok(())
}

/// Validates a menu item's listed price in pence.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (promotional giveaways still flow through checkout)
pub fn validate_item_price(pence: i64) -> ValidationResult<()> {
    if pence < 0 {
        return Err(ValidationError::Negative {
            field: "item price".to_string(),
        });
    }

    Ok(())
}

/// Validates a VAT rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
/// - UK rates in practice are 0 or 2000 (0% or 20%); other values are
///   accepted but the engine flags them as non-standard
pub fn validate_vat_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
///
/// ## Order Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: Compute Order VAT                                            │
/// │                                                                         │
/// │  Line quantity: 2                                                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(2) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"      │
/// │       │                                                                 │
/// │       └── OK → per-unit VAT × quantity                                  │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the component list of a template being created.
///
/// ## Rules
/// - Must contain at least one component (an empty template has no meaning
///   and would silently zero-rate anything it's applied to)
/// - Every component must have a valid name, cost, and rate
pub fn validate_template_components(components: &[TemplateComponent]) -> ValidationResult<()> {
    if components.is_empty() {
        return Err(ValidationError::Empty {
            field: "components".to_string(),
        });
    }

    for component in components {
        validate_component_name(&component.name)?;
        validate_component_cost(component.default_cost_pence)?;
        if let Some(bps) = component.vat_rate_bps {
            validate_vat_rate_bps(bps)?;
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
///
/// ## Example
/// ```rust
/// use savour_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VatClass;

    fn template_component(name: &str, cost: i64, bps: Option<u32>) -> TemplateComponent {
        TemplateComponent {
            id: "tc-1".to_string(),
            template_id: "tpl-1".to_string(),
            name: name.to_string(),
            default_cost_pence: cost,
            vat_rate_bps: bps,
            vat_class: VatClass::HotFood,
            display_order: 0,
        }
    }

    #[test]
    fn test_validate_component_name() {
        assert!(validate_component_name("Grilled Chicken").is_ok());
        assert!(validate_component_name("Yorkshire Pudding").is_ok());

        assert!(validate_component_name("").is_err());
        assert!(validate_component_name("   ").is_err());
        assert!(validate_component_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_template_name() {
        assert!(validate_template_name("Roast Dinner Base").is_ok());
        assert!(validate_template_name("").is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Fish & Chips").is_ok());
        assert!(validate_item_name("  ").is_err());
        assert!(validate_item_name(&"B".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_item_price() {
        assert!(validate_item_price(1200).is_ok());
        assert!(validate_item_price(0).is_ok());
        assert!(validate_item_price(-50).is_err());
    }

    #[test]
    fn test_validate_component_cost() {
        assert!(validate_component_cost(0).is_ok());
        assert!(validate_component_cost(450).is_ok());
        assert!(validate_component_cost(-1).is_err());
    }

    #[test]
    fn test_validate_vat_rate_bps() {
        assert!(validate_vat_rate_bps(0).is_ok());
        assert!(validate_vat_rate_bps(2000).is_ok());
        assert!(validate_vat_rate_bps(10_000).is_ok());
        assert!(validate_vat_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_template_components() {
        assert!(validate_template_components(&[]).is_err());

        let good = vec![
            template_component("Chicken", 700, Some(2000)),
            template_component("Salad", 300, None),
        ];
        assert!(validate_template_components(&good).is_ok());

        let bad_cost = vec![template_component("Chicken", -700, Some(2000))];
        assert!(validate_template_components(&bad_cost).is_err());

        let bad_rate = vec![template_component("Chicken", 700, Some(20_000))];
        assert!(validate_template_components(&bad_rate).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
