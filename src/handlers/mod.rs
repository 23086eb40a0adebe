pub mod diagnostics;
pub mod diagrams;
pub mod health;
pub mod not_found;

pub use diagnostics::*;
pub use diagrams::*;
pub use health::*;
pub use not_found::*;
