//! Spreadsheet-backed sentence storage.
//!
//! [`SheetsClient`] fetches the practice list and saves reviewed generator
//! output.  The HTTP layer sits behind [`SheetTransport`]; save replies are
//! classified into a three-way [`SaveOutcome`].

pub mod client;
pub mod transport;

pub use client::{
    classify_save_response, parse_fetch_body, save_payload, SaveOutcome, SaveResult, SheetsClient,
    FETCH_FAILED_MESSAGE,
};
pub use transport::{HttpTransport, RawResponse, SheetTransport, SheetsError};
