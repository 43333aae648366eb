//! Analysis modules.
//!
//! Each submodule turns one loaded dataset into a derived structure:
//! fatalities totals, the structural-twins network, the Sankey flow,
//! regional totals or fatalities distributions.

pub mod distribution;
pub mod fatalities;
pub mod network;
pub mod regions;
pub mod sankey;

pub use network::build_network;
pub use sankey::build_sankey;
