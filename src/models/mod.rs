pub mod enums;
pub mod feedback;
pub mod report;

pub use feedback::*;
pub use report::*;
