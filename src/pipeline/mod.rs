//! Pipeline stages for spreadsheet-to-receipt generation.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own. Only [`engine`] talks to the outside world.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ markup ──▶ engine ──▶ verify
//! (file)    (records)   (+words)      (HTML)     (PDF)      (lopdf)
//! ```
//!
//! 1. [`input`]     — decode the workbook or CSV into a [`input::Sheet`];
//!    synchronous, run inside `spawn_blocking`
//! 2. [`extract`]   — schema check, blank-row removal and the row limit
//! 3. [`normalize`] — amount parsing and formatting; bad rows become
//!    [`crate::RowError`]s instead of failing the request
//! 4. [`words`]     — amount in English words, used by `normalize`
//! 5. [`markup`]    — pure template substitution, one section per receipt
//! 6. [`engine`]    — external HTML→PDF process behind the `RenderEngine` trait
//! 7. [`verify`]    — parse the engine output before it is delivered

pub mod engine;
pub mod extract;
pub mod input;
pub mod markup;
pub mod normalize;
pub mod verify;
pub mod words;
