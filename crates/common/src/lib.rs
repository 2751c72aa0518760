//! Shared vocabulary for the shelfwise crates: task kinds, request hints,
//! inline images and the retail records the assistant reasons about.

pub mod image;
pub mod records;
pub mod task;

pub use {
    image::{ImageError, InlineImage},
    records::{Customer, Product, SaleLine, Transaction},
    task::{ReasoningEffort, ResponseFormat, TaskKind},
};
