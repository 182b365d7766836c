//! Business logic services for VendorPulse

pub mod activity;
pub mod auth;
pub mod finance;
pub mod notification;
pub mod part;
pub mod purchase_order;
pub mod reporting;
pub mod supplier;
pub mod user;
pub mod vendor_score;

pub use activity::ActivityService;
pub use auth::AuthService;
pub use finance::FinanceService;
pub use notification::NotificationService;
pub use part::PartService;
pub use purchase_order::PurchaseOrderService;
pub use reporting::ReportingService;
pub use supplier::SupplierService;
pub use user::UserService;
pub use vendor_score::VendorScoreService;
