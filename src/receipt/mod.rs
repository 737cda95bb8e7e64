//! Receipt scanning.
//!
//! A photo of a receipt is sent to Gemini, which reads the store, date and line items. The items
//! are held in the user's scan session until they are reviewed and saved, or discarded.

mod api_key;
mod client;
mod error;
mod parse;
mod prompt;
mod review;
mod scan;
mod session;

pub use api_key::{api_key_form, has_saved_api_key, save_api_key_endpoint};
pub use client::GeminiClient;
pub use error::ScanError;
pub use review::{cancel_scan_endpoint, commit_scan_endpoint, get_scan_review_page};
pub use scan::{MAX_RECEIPT_BYTES, scan_receipt_endpoint, scan_upload_form};
pub use session::{ScanSessions, ScanState, ScanTicket, ScannedItem, StagedReceipt};
