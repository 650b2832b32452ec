//! Post-processing: strip code-fence markers from model output.
//!
//! Chat-tuned models wrap generated LaTeX in ```` ```latex … ``` ```` even
//! when asked not to. The typesetter chokes on the backticks, so they are
//! removed before the artifact is written.
//!
//! This is literal substring removal, not a Markdown parser. Partial or
//! malformed fences are simply removed wherever the marker text appears;
//! backticks that are not part of a triple run are left alone.
//!
//! ## Rule Order
//!
//! 1. Each tagged opening marker (```` ```latex ````) together with **one**
//!    directly-following newline, so the artifact does not start with a blank
//!    line.
//! 2. Each tagged opening marker without a newline after it.
//! 3. Every remaining bare ```` ``` ```` marker (closing fences, untagged
//!    openings).
//!
//! Tagged markers must go before bare ones: removing ```` ``` ```` first
//! would leave a stray `latex` word at the top of the document. For the same
//! reason tags are applied longest first.

use std::cmp::Reverse;
use tracing::debug;

/// The bare fence marker.
pub const FENCE: &str = "```";

/// Remove fence markers from `input`.
///
/// `tags` lists the language tags whose opening marker should be stripped
/// (e.g. `["latex"]`). Everything that is not a marker is kept verbatim.
///
/// ```rust
/// use edgequake_pdf2tex::pipeline::postprocess::strip_fences;
///
/// let cleaned = strip_fences("```latex\n\\section{Hi}\n```", &["latex"]);
/// assert_eq!(cleaned, "\\section{Hi}\n");
/// ```
pub fn strip_fences<S: AsRef<str>>(input: &str, tags: &[S]) -> String {
    let mut s = input.to_string();

    // Longest first, so `latex` is not cut short by a configured `la`.
    let mut tags: Vec<&str> = tags.iter().map(|t| t.as_ref()).collect();
    tags.sort_by_key(|t| Reverse(t.len()));

    for tag in tags {
        let marker = format!("{FENCE}{tag}");
        s = s.replace(&format!("{marker}\r\n"), "");
        s = s.replace(&format!("{marker}\n"), "");
        s = s.replace(&marker, "");
    }
    let s = s.replace(FENCE, "");

    if s.len() != input.len() {
        debug!("Stripped {} bytes of fence markers", input.len() - s.len());
    }
    s
}
