// Email delivery: attachment resolution, the SMTP seam, and the dispatch
// engine that records every attempt in the email history.

pub mod attachments;
pub mod engine;
pub mod handlers;
pub mod transport;
