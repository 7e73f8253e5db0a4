//! Control flow graphs
//!
//! This module provides:
//! - Basic blocks over statement ids with explicit edge lists
//! - The [`Cfg`] arena with its construction and mutation interface
//! - Name-based def-use chains
//! - A builder turning structured statement trees into graphs

mod basic_block;
mod builder;
mod cfg;
mod def_use;

pub use basic_block::{BasicBlock, BlockId, BlockList};
pub use builder::{CfgBuilder, StructuredStmt, SwitchCase};
pub use cfg::Cfg;
pub use def_use::DefUseChain;
