//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements one step. The pure steps take strings and
//! return strings; file and process I/O happens only at the marked
//! boundaries, so every stage is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! styles ──▶ fragments ──▶ markdown ──▶ qualify ──▶ layout ──▶ render
//! (bundle)   (header/footer) (comrak)   (img src)   (tera)    (backend)
//!            └──────────────── compose ─────────────────┘
//! ```
//!
//! 1. [`styles`]   : choose the stylesheets and their order; read them
//! 2. [`fragments`]: read, qualify and template the running header/footer
//! 3. [`markdown`] : GitHub-flavoured markdown to HTML, options per call;
//!    fenced code goes through [`highlight`]
//! 4. [`qualify`]  : make relative `<img src>` paths absolute against the
//!    source directory
//! 5. [`layout`]   : compile and render the Tera layouts
//! 6. [`compose`]  : run 1–5 in order and produce the final document
//! 7. [`render`]   : scratch file, backend session, atomic PDF write

pub mod compose;
pub mod fragments;
pub mod highlight;
pub mod layout;
pub mod markdown;
pub mod qualify;
pub mod render;
pub mod styles;
