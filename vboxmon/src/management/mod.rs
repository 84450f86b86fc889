//! Machine discovery and the hypervisor command facade.

mod listing;
mod manager;

pub use listing::{ListedMachine, parse_listing, parse_listing_line};
pub use manager::VBoxManage;
