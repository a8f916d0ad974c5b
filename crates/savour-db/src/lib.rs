//! # savour-db: Database Layer for the Savour VAT Subsystem
//!
//! This crate provides database access for the Savour ordering platform's
//! tax subsystem. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Savour VAT Data Flow                              │
//! │                                                                         │
//! │  Platform call (compute order VAT / manage catalog)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     savour-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │    │ TemplateRepo   │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│ ComponentRepo  │    │ 001_init.sql │ │   │
//! │  │   │ Connection    │    │ CommonRepo     │    │ ...          │ │   │
//! │  │   │ Management    │    │ OrderRepo      │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │                              │                                  │   │
//! │  │                              │ pure computation                 │   │
//! │  │                              ▼                                  │   │
//! │  │                        savour-core                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (per deployment)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (templates, components,
//!   common components, orders)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use savour_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/db.sqlite");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let components = db.components().get_components("item-uuid").await?;
//! let order = db.orders().compute_and_store("order-uuid").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::common::CommonComponentRepository;
pub use repository::component::ComponentRepository;
pub use repository::menu_item::MenuItemRepository;
pub use repository::order::OrderRepository;
pub use repository::template::TemplateRepository;
