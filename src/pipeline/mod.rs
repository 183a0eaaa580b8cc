//! Pipeline stages for question extraction and answering.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch PDF backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ furniture ──▶ markers ──▶ segment ──▶ answer
//! (URL/path) (pdfium)  (headers/     (margin      (question   (LLM)
//!                       footers)      labels)      blocks)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`]    — pull per-page text out of the PDF; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`furniture`] — strip recurring page headers/footers and join pages
//!    into one line sequence
//! 4. [`markers`]   — relocate right-margin category markers onto their own
//!    label lines
//! 5. [`segment`]   — group lines into question blocks between numbered
//!    headings and answer-type trailers
//! 6. [`answer`]    — drive the LLM call with retry/backoff; the only stage
//!    with network I/O

pub mod answer;
pub mod furniture;
pub mod input;
pub mod markers;
pub mod render;
pub mod segment;
