//! # Memos Feature
//!
//! Memo records, the store boundary and the lifecycle service.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod error;
pub mod model;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MemoError, StoreError, REMIND_AT_CHECK};
pub use model::{Memo, NewMemo};
pub use service::MemoService;
pub use store::MemoStore;
