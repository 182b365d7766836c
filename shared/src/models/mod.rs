//! Domain models for the VendorPulse platform

mod finance;
mod notification;
mod purchase_order;
mod report;
mod user;
mod vendor_score;

pub use finance::*;
pub use notification::*;
pub use purchase_order::*;
pub use report::*;
pub use user::*;
pub use vendor_score::*;
