//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the print backend can be swapped without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ style ──▶ markdown ──▶ compose ──▶ print ──▶ merge
//! (text)    (CSS)     (blocks)     (HTML)      (Chrome)  (lopdf)
//! ```
//!
//! 1. [`input`]: normalise the Markdown source, read it from disk
//! 2. [`style`]: theme → one stylesheet, highlight CSS included
//! 3. [`markdown`]: parse, highlight code ([`highlight`]), assign heading ids
//!    ([`slug`]) and place cover / TOC / page-break blocks
//! 4. [`compose`]: wrap the blocks in an HTML shell; render the TOC ([`toc`])
//! 5. [`print`]: drive headless Chrome on the blocking pool; the only
//!    stage with a browser
//! 6. [`merge`]: concatenate the cover and content PDFs (separate-cover
//!    mode only)

pub mod compose;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod merge;
pub mod print;
pub mod slug;
pub mod style;
pub mod toc;
