use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters that may not appear in a stored filename.
    /// Anything outside ASCII letters, digits, dot and hyphen is replaced.
    /// - "report.pdf" stays "report.pdf"
    /// - "my report (1).pdf" becomes "my_report__1_.pdf"
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

/// Replace every unsafe character of a client-supplied filename with `_`
pub fn sanitize_filename(original: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(original, "_").into_owned()
}
