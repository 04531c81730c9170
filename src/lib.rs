//! # gcode-relay
//!
//! WebSocket relay that streams g-code motion programs from a producer to a
//! single registered visualization client, and derives auxiliary artifacts
//! (bounding-box border program, SVG preview, parsed position arrays) from
//! the same source file.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws, browser client via static files)
//!     │
//!     ├── WS connection loops (ws/)
//!     │
//!     ├── NamespaceHandle ── single worker task (service/)
//!     │       │
//!     │       └── RelayNamespace handlers
//!     │
//!     ├── SessionRegistry, ParseCache (domain/)
//!     │
//!     └── GcodeParser, BorderProgram, SvgWriter (gcode/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod gcode;
pub mod service;
pub mod ws;
