pub mod payment;
pub mod upload;

pub use payment::{PaymentError, PaymentService};
pub use upload::{UploadError, UploadService};
