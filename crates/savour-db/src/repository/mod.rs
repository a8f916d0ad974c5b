//! # Repository Module
//!
//! Database repository implementations for the Savour VAT subsystem.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Platform call                                                         │
//! │       │                                                                 │
//! │       │  db.components().get_components("item-uuid")                    │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ComponentRepository                                                   │
//! │  ├── set_components(&self, item_id, components)                        │
//! │  ├── get_components(&self, item_id)                                    │
//! │  ├── update_component(&self, id, patch)                                │
//! │  └── deactivate_component(&self, id)                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (in-memory database per test)                          │
//! │  • SQL is isolated in one place                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`template::TemplateRepository`] - Component template catalog and
//!   template application
//! - [`component::ComponentRepository`] - Per-item composition store
//! - [`menu_item::MenuItemRepository`] - Menu catalog (flat VAT columns)
//! - [`common::CommonComponentRepository`] - Reuse statistics for admin
//!   suggestions
//! - [`order::OrderRepository`] - Order loading, VAT computation, persistence

pub mod common;
pub mod component;
pub mod menu_item;
pub mod order;
pub mod template;
