//! mdtidy-core: Core text machinery for Markdown rules
//!
//! This crate provides:
//! - `RegionKind` / `find_regions()`: detection of protected regions
//!   (code, YAML frontmatter, links, wiki-links, tags)
//! - `MaskedText` / `with_masked()`: placeholder masking so rewrites never
//!   observe protected content
//! - `Frontmatter`: location of the leading YAML block
//! - `LineEnding` / `with_lf()`: CRLF documents rewritten as LF and converted back
//! - `logging`: optional debug log file shared by the lint pipeline and CLI

pub mod frontmatter;
pub mod line_ending;
pub mod logging;
mod mask;
mod region;

pub use frontmatter::Frontmatter;
pub use line_ending::{with_lf, LineEnding};
pub use mask::{with_masked, MaskedText};
pub use region::{find_all_regions, find_regions, ProtectedSpan, RegionKind};
