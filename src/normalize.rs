//! Scrubbing of captured build and run logs.
//!
//! Logs differ between machines in install prefixes, home directories, SDK paths and
//! compiler flags. [`Normalizer`] folds all of those into stable placeholders so that the
//! generated document only changes when the examples change.

use std::borrow::Cow;

use anyhow::{Context, Error};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::{trace, warn};
use regex::Regex;
use textwrap::{Options, WordSeparator, WordSplitter, WrapAlgorithm};

/// Upper bound on substitution passes before giving up on reaching a fixed point.
const MAX_PASSES: usize = 16;

/// Marker appended to a line that continues on the next one.
const CONTINUATION: &str = " \\";

/// Indentation added to continuation lines.
const CONTINUATION_INDENT: &str = "  ";

/// Narrowest width that still leaves room for continuation indentation.
pub const MIN_WIDTH: usize = 20;

/// Path rules, applied before environment values are folded.
const PATH_RULES: &[(&str, &str)] = &[
    // Repeated slashes, but not the ones following a URL scheme.
    (r"(?m)(^|[^:/])/{2,}", "${1}/"),
    (r"(?:/opt/local/bin/)?\bgmake\b", "make"),
    (r"(?m)^/\S*/(swig|python)([\d.]*)([ \t]|$)", "${1}${2}${3}"),
    (
        r"/Library/Java/JavaVirtualMachines/jdk[^/\s]*/Contents/Home",
        "$$JAVA_HOME",
    ),
    (
        r"/opt/local/Library/Frameworks/Python\.framework/Versions/[^/\s]+",
        "$$PYTHON_HOME",
    ),
];

/// Flag and whitespace rules, applied after environment values are folded.
const FLAG_RULES: &[(&str, &str)] = &[
    (
        r"[ \t]*-isysroot[ \t]*/Library/Developer/CommandLineTools/SDKs/\S*?\.sdk",
        " ",
    ),
    (
        r"[ \t]+-[IL][ \t]*/opt/(?:local|homebrew)/(?:include|lib)\S*",
        " ",
    ),
    (r"(\S)[ \t]{2,}", "${1} "),
    (r"(?m)[ \t]+$", ""),
];

lazy_static! {
    /// Lines that carry no information for a reader and vary between toolchains.
    static ref NOISE: Vec<Regex> = [
        r"Deprecated command line option",
        r"Document-method:",
        r"^ld: warning: .*(directory not found|search path .* not found)",
        r"^=+ test session starts =+$",
        r"^platform \S+ -- Python",
        r"^(rootdir|cachedir|plugins|configfile): ",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile regex"))
    .collect();

    /// Test runner timings.
    static ref TIMING: Regex =
        Regex::new(r"\bin \d+\.\d+s\b").expect("Failed to compile regex");

    static ref SLASHES: Regex = Regex::new(r"/{2,}").expect("Failed to compile regex");
}

/// Environment variable values to replace with `$NAME` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFolding {
    /// Pairs of (name, value), longest value first.
    vars: Vec<(String, String)>,
}

impl EnvFolding {
    /// Build from (name, value) pairs.
    ///
    /// Only absolute paths other than `/` are kept: they cannot occur inside a `$NAME`
    /// placeholder and are specific enough to be safe to replace everywhere.
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.into();
                let value = SLASHES.replace_all(value.as_ref().trim(), "/");
                let value = value.trim_end_matches('/');
                if !value.starts_with('/') || value.len() < 2 {
                    trace!("Not folding ${name}='{value}'");
                    return None;
                }
                Some((name, value.to_string()))
            })
            .collect();

        // Longer values first so that a prefix such as $HOME never splits a more specific
        // value like $RUBY_HOME. Ties are broken by name to stay deterministic.
        vars.sort_by(|(a_name, a), (b_name, b)| {
            b.len().cmp(&a.len()).then_with(|| a_name.cmp(b_name))
        });
        vars.dedup_by(|(_, a), (_, b)| a == b);
        Self { vars }
    }

    /// Read `names` from the process environment, plus `root_var` set to `root`.
    pub fn from_env(names: &[String], root_var: &str, root: &str) -> Self {
        Self::new(
            names
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
                .chain(std::iter::once((root_var.to_string(), root.to_string()))),
        )
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }
}

struct Substitution {
    pattern: Regex,
    replacement: String,
}

impl Substitution {
    fn from_rule((pattern, replacement): &(&str, &str)) -> Result<Self, Error> {
        Ok(Self {
            pattern: Regex::new(pattern).context(format!("Invalid rule '{pattern}'"))?,
            replacement: replacement.to_string(),
        })
    }
}

/// Turns captured command output into reproducible text.
pub struct Normalizer {
    substitutions: Vec<Substitution>,
    width: usize,
}

impl Normalizer {
    pub fn new(width: usize, env: &EnvFolding) -> Result<Self, Error> {
        // A value only matches up to a path boundary, so `/home/al` leaves `/home/alice`
        // alone. The boundary character is put back after the placeholder.
        let env_rules = env.vars().iter().map(|(name, value)| {
            let pattern = format!(r"(?m){}([^A-Za-z0-9_.+~-]|$)", regex::escape(value));
            Ok(Substitution {
                pattern: Regex::new(&pattern).context(format!("Invalid value for ${name}"))?,
                replacement: format!("$${name}${{1}}"),
            })
        });

        let substitutions = PATH_RULES
            .iter()
            .map(Substitution::from_rule)
            .chain(env_rules)
            .chain(FLAG_RULES.iter().map(Substitution::from_rule))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            substitutions,
            width: width.max(MIN_WIDTH),
        })
    }

    /// Normalize `raw`. The result is a fixed point: normalizing it again changes nothing.
    pub fn normalize(&self, raw: &str) -> String {
        let text = self.settle(raw.replace("\r\n", "\n"));

        collapse_blank_lines(text.split('\n').map(String::from))
            .iter()
            .flat_map(|line| wrap_line(line, self.width))
            .join("\n")
    }

    /// Repeat whole cleaning passes until one makes no change.
    ///
    /// Joining continuations is part of the pass, since substitutions and dropped noise
    /// lines can both bring a ` \` line next to its continuation.
    fn settle(&self, mut text: String) -> String {
        for pass in 1..=MAX_PASSES {
            let next = self.clean(&join_continuations(&text));
            if next == text {
                trace!("Normalization settled after {pass} pass(es)");
                return text;
            }
            text = next;
        }

        warn!("Normalization did not settle after {MAX_PASSES} passes");
        text
    }

    /// One pass of every substitution, then noise and timing removal.
    fn clean(&self, text: &str) -> String {
        let mut text = text.to_string();
        for sub in &self.substitutions {
            if sub.pattern.is_match(&text) {
                text = sub
                    .pattern
                    .replace_all(&text, sub.replacement.as_str())
                    .into_owned();
            }
        }

        text.split('\n')
            .map(dedup_adjacent_flags)
            .filter(|line| !NOISE.iter().any(|re| re.is_match(line)))
            .map(|line| TIMING.replace_all(&line, "in N.NNs").into_owned())
            .join("\n")
    }
}

/// Remove a flag repeated right after itself, e.g. `-O2 -O2`.
fn dedup_adjacent_flags(line: &str) -> Cow<'_, str> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let words: Vec<&str> = body.split(' ').collect();
    let has_dup = words
        .windows(2)
        .any(|w| w[0] == w[1] && w[0].starts_with('-') && w[0].len() > 1);
    if !has_dup {
        return Cow::Borrowed(line);
    }

    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    for word in words {
        if word.starts_with('-') && word.len() > 1 && kept.last() == Some(&word) {
            continue;
        }
        kept.push(word);
    }
    Cow::Owned(format!("{indent}{}", kept.join(" ")))
}

/// Merge lines split with a trailing ` \` back into one logical line.
fn join_continuations(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut continues = false;
    for line in text.split('\n') {
        match out.last_mut() {
            Some(last) if continues && line.starts_with(CONTINUATION_INDENT) => {
                last.truncate(last.len() - CONTINUATION.len());
                last.push(' ');
                last.push_str(line.trim_start());
            }
            _ => out.push(line.to_string()),
        }
        continues = out.last().is_some_and(|l| l.ends_with(CONTINUATION));
    }
    out.join("\n")
}

/// Drop blank lines that follow another blank line.
fn collapse_blank_lines(lines: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && out.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        out.push(if blank { String::new() } else { line });
    }
    out
}

/// Word-wrap one line so every piece, continuation marker included, fits in `width`.
/// A single word longer than `width` is never broken.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if textwrap::core::display_width(line) <= width {
        return vec![line.to_string()];
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let subsequent = format!("{indent}{CONTINUATION_INDENT}");
    let options = Options::new(width - CONTINUATION.len())
        .initial_indent(indent)
        .subsequent_indent(&subsequent)
        .word_separator(WordSeparator::AsciiSpace)
        .word_splitter(WordSplitter::NoHyphenation)
        .wrap_algorithm(WrapAlgorithm::FirstFit)
        .break_words(false);

    let pieces = textwrap::wrap(body, options);
    let last = pieces.len().saturating_sub(1);
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            if i < last {
                format!("{piece}{CONTINUATION}")
            } else {
                piece.into_owned()
            }
        })
        .collect()
}
