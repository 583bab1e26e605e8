use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{Display, EnumIter, EnumString};

/// Source languages that appear in example listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[strum(to_string = "C", serialize = "h")]
    C,

    #[strum(
        to_string = "C++",
        serialize = "cc",
        serialize = "cpp",
        serialize = "cxx",
        serialize = "hh",
        serialize = "hpp"
    )]
    Cpp,

    #[strum(to_string = "Python", serialize = "py")]
    Python,

    #[strum(to_string = "Ruby", serialize = "rb")]
    Ruby,

    /// Guile scripts.
    #[strum(to_string = "Scheme", serialize = "Guile", serialize = "scm")]
    Scheme,

    /// Clojure scripts.
    #[strum(to_string = "Lisp", serialize = "Clojure", serialize = "clj")]
    Lisp,

    #[strum(to_string = "TCL", serialize = "tcl")]
    Tcl,

    #[strum(to_string = "Bash", serialize = "sh", serialize = "shell")]
    Bash,

    #[strum(
        to_string = "SQL",
        serialize = "PostgreSQL",
        serialize = "psql",
        serialize = "sql"
    )]
    Sql,

    #[strum(to_string = "Java")]
    Java,
}

impl Language {
    /// Token that starts a line comment.
    pub fn comment_token(&self) -> &'static str {
        match self {
            Language::C | Language::Cpp | Language::Java => "//",
            Language::Scheme | Language::Lisp => ";;",
            Language::Python | Language::Ruby | Language::Tcl | Language::Bash => "#",
            Language::Sql => "--",
        }
    }

    /// Info string for a Markdown fenced code block.
    pub fn fence(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Scheme => "scheme",
            Language::Lisp => "clojure",
            Language::Tcl => "tcl",
            Language::Bash => "bash",
            Language::Sql => "sql",
            Language::Java => "java",
        }
    }

    /// Whether `/* ... */` block comments are part of the syntax.
    pub fn has_block_comments(&self) -> bool {
        matches!(
            self,
            Language::C | Language::Cpp | Language::Java | Language::Sql
        )
    }

    /// Language of a file suffix such as `cc` or `py`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "c" | "h" => Some(Language::C),
            "cc" | "cpp" | "cxx" | "hh" | "hpp" => Some(Language::Cpp),
            "py" => Some(Language::Python),
            "rb" => Some(Language::Ruby),
            "scm" => Some(Language::Scheme),
            "clj" => Some(Language::Lisp),
            "tcl" => Some(Language::Tcl),
            "sh" => Some(Language::Bash),
            "sql" | "psql" => Some(Language::Sql),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Language named by the first word of a label, e.g. `Python Tests` or `C++ Header`.
    pub fn infer(label: &str) -> Option<Self> {
        label
            .split_whitespace()
            .next()
            .and_then(|word| Language::from_str(word).ok())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Language::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Language::from_str("C").unwrap(), Language::C);
        assert_eq!(Language::from_str("C++").unwrap(), Language::Cpp);
        assert_eq!(Language::from_str("CC").unwrap(), Language::Cpp);
        assert_eq!(Language::from_str("guile").unwrap(), Language::Scheme);
        assert_eq!(Language::from_str("Clojure").unwrap(), Language::Lisp);
        assert_eq!(Language::from_str("Tcl").unwrap(), Language::Tcl);
        assert_eq!(Language::from_str("PostgreSQL").unwrap(), Language::Sql);
        assert!(Language::from_str("Fortran").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for lang in Language::iter() {
            assert_eq!(Language::from_str(&lang.to_string()).unwrap(), lang);
        }
    }

    #[test]
    fn test_infer() {
        assert_eq!(Language::infer("Python Tests"), Some(Language::Python));
        assert_eq!(Language::infer("C++ SWIG Interface"), Some(Language::Cpp));
        assert_eq!(Language::infer("Clojure (Java)"), Some(Language::Lisp));
        assert_eq!(Language::infer("TCL"), Some(Language::Tcl));
        assert_eq!(Language::infer("Guile"), Some(Language::Scheme));
        assert_eq!(Language::infer(""), None);
        assert_eq!(Language::infer("Makefile"), None);
    }

    #[test]
    fn test_comment_tokens() {
        assert_eq!(Language::C.comment_token(), "//");
        assert_eq!(Language::Lisp.comment_token(), ";;");
        assert_eq!(Language::Scheme.comment_token(), ";;");
        assert_eq!(Language::Tcl.comment_token(), "#");
        assert_eq!(Language::Sql.comment_token(), "--");
    }

    #[test]
    fn test_from_suffix() {
        assert_eq!(Language::from_suffix("c"), Some(Language::C));
        assert_eq!(Language::from_suffix("CC"), Some(Language::Cpp));
        assert_eq!(Language::from_suffix("i"), None);
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"C++\"");
        let lang: Language = serde_yaml::from_str("Guile").unwrap();
        assert_eq!(lang, Language::Scheme);
    }
}
