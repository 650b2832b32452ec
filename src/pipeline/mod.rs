//! Pipeline stages for PDF-to-LaTeX conversion.
//!
//! Each submodule implements exactly one step and, where an external program
//! is involved, the trait that abstracts it. The stage functions add the
//! semantics (trimming, emptiness checks, fence stripping, preconditions);
//! the trait implementations only run the program.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ model ──▶ postprocess ──▶ (write) ──▶ typeset
//! (path/URL) (pdftotext) (ollama)   (fences)      (build/)   (pdflatex)
//! ```
//!
//! 1. [`input`]       - canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]     - [`extract::TextExtractor`]: PDF → plain text
//! 3. [`model`]       - [`model::ModelEngine`]: text → generated LaTeX
//! 4. [`postprocess`] - strip code-fence markers from the model output
//! 5. [`typeset`]     - [`typeset::Typesetter`]: compile the artifact in the
//!    build directory

pub mod extract;
pub mod input;
pub mod model;
pub mod postprocess;
pub mod typeset;
