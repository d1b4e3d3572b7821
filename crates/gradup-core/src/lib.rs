//! gradup-core: assessment model and attempt traversal engine.
//!
//! This crate defines the phase/section/question model, the attempt state
//! machine (cursor, answer store, countdown, status transitions), the async
//! fixture port, and the read-only summary produced when an attempt ends.

pub mod action;
pub mod answers;
pub mod attempt;
pub mod cursor;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod session;
pub mod timer;
pub mod traits;
