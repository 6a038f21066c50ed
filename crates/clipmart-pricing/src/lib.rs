//! Discount resolution for catalog reads.
//!
//! The engine is a pure function over an item's pricing inputs and a
//! point-in-time discount catalog snapshot; the catalog itself is owned by an
//! external discount-management service and fetched per request through
//! [`DiscountCatalogProvider`], failing soft to the empty catalog so pricing
//! never blocks a read.

pub mod catalog;
pub mod engine;
pub mod rules;

pub use catalog::{DiscountCatalogProvider, HttpCatalogProvider, StaticCatalogProvider};
pub use engine::{resolve, PricingResult};
pub use rules::{DiscountCatalog, DiscountKind, DiscountRule};
