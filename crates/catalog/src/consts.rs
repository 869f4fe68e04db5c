use regex::Regex;
use std::sync::LazyLock;

const FILENAME: &str = r"\w{4}\d{5}-[A-F0-9]+\.ird";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Download link embedded in the catalog's filename cell, e.g. `<a href="ird/BLES01234-1A2B.ird">`.
regex!(FILENAME_IN_HTML_REGEX, format!(r"(?i)ird/(?P<filename>{FILENAME})").as_str());

pub(crate) const TITLE_MARKER: &[u8] = b"</span>";
pub(crate) const IRD_EXTENSION: &str = ".ird";
