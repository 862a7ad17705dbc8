pub mod addr;
pub mod addr_space;
pub mod asm_view;
pub mod cache;
pub mod config;
pub mod data_view;
pub mod error;
pub mod instruction;
pub mod jump_list;
pub mod line;
pub mod memory_store;
pub mod project;
pub mod resolve;
pub mod script;
pub mod script_view;
pub mod store;
pub mod timing;
mod vecmap;
pub mod window;
pub mod wram_view;

pub use error::{Error, Result};
