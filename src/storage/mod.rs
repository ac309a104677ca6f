//! Storage Module
//!
//! The persistent side of the database: which tablets exist and how they
//! are stacked.
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── write.log          write-ahead log
//!   ├── stack.txt          tablet names, oldest first
//!   └── tablet_000001.tab  tablets
//! ```

mod manager;

pub use manager::{StackEntry, TabletStack, STACK_FILENAME};
