//! The purchase pipeline: intent, confirmation, and delivery.

mod confirm;
mod download;
mod intent;

pub use confirm::{
    CaptureOutcome, ClientConfirmation, apply_capture, process_webhook,
    verify_client_confirmation,
};
pub use download::{DownloadLink, authorize_download};
pub use intent::{PaymentIntent, create_intent};
