//! Order Domain Module
//!
//! Order placement math and the status state machine:
//!
//! - **money**: Decimal arithmetic for subtotals, shipping and totals
//! - **lifecycle**: who may move an order to which status
//!
//! Both are plain functions over the wire types so they can be tested
//! without a database or a running server. The HTTP handlers in
//! `api::orders` call into here before touching the repositories.

pub mod lifecycle;
pub mod money;
