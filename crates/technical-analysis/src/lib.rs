pub mod features;
pub mod indicators;
pub mod long_term;


pub use features::*;
pub use indicators::*;
pub use long_term::*;
