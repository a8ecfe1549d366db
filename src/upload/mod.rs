//! PDF Upload Handling
//!
//! Pulls exactly one PDF out of a multipart request and streams it into the
//! upload directory under a generated name.

pub mod receiver;
pub mod types;

pub use receiver::{is_pdf_content_type, receive_pdf};
pub use types::*;
