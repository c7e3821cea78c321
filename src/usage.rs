//! Help text: one entry per visible field, word-wrapped to a display width.
//!
//! When the widest name column still leaves at least [`MIN_HELP_WIDTH`]
//! columns, each entry is laid out as a name column followed by its help text,
//! with continuation lines aligned under the help column. Otherwise the name
//! and the help text are printed as two separate, indented line groups.

use crate::schema::FieldDescriptor;
use crate::types::TypeTag;

const INDENT: usize = 2;
const GUTTER: usize = 2;
const MIN_HELP_WIDTH: usize = 20;

/// Display width used when the caller does not set one.
pub const DEFAULT_WIDTH: usize = 80;

/// One field's rendered usage: the name column and its help text.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    pub left: String,
    pub help: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageOptions {
    pub banner: Option<String>,
    pub header: String,
    pub width: usize,
}

impl Default for UsageOptions {
    fn default() -> Self {
        Self {
            banner: None,
            header: "Options:".into(),
            width: DEFAULT_WIDTH,
        }
    }
}

pub fn entry_for(d: &FieldDescriptor) -> UsageEntry {
    let mut names = format!("/{}", d.name);
    if let Some(short) = &d.short_name {
        names.push_str(&format!(", /{short}"));
    }
    if d.flags.default {
        names = format!("[{names}]");
    }

    let mut left = names;
    let base = match d.tag.array_element() {
        Some(element) => element.normalize(),
        None => d.tag.normalize(),
    };
    match base {
        TypeTag::Bool => {}
        TypeTag::Struct(s) => {
            for (member, _) in &s.members {
                left.push_str(&format!(" <{member}>"));
            }
        }
        TypeTag::Enum(e) => left.push_str(&format!(" <{}>", e.values.join("|"))),
        other => left.push_str(&format!(" <{}>", other.display_name())),
    }

    let mut help: Vec<&str> = Vec::new();
    if !d.help.is_empty() {
        help.push(&d.help);
    }
    if d.flags.required {
        help.push("Required.");
    }
    if d.tag.is_array() {
        help.push("May be repeated.");
    }

    UsageEntry {
        left,
        help: help.join(" "),
    }
}

/// Render the full usage text for `entries`.
pub fn render(entries: &[UsageEntry], options: &UsageOptions) -> String {
    let line_limit = options.width.saturating_sub(1);
    let mut lines: Vec<String> = Vec::new();
    if let Some(banner) = &options.banner {
        push_wrapped(&mut lines, banner, line_limit);
        lines.push(String::new());
    }
    push_wrapped(&mut lines, &options.header, line_limit);

    let max_left = entries
        .iter()
        .map(|e| e.left.chars().count())
        .max()
        .unwrap_or(0);
    let help_column = INDENT + max_left + GUTTER;

    if line_limit >= help_column + MIN_HELP_WIDTH {
        let help_width = line_limit - help_column;
        for entry in entries {
            let wrapped = wrap(&entry.help, help_width);
            let mut chunks = wrapped.iter();
            let first = match chunks.next() {
                Some(text) => format!(
                    "{:INDENT$}{:<max_left$}{:GUTTER$}{text}",
                    "", entry.left, ""
                ),
                None => format!("{:INDENT$}{}", "", entry.left),
            };
            lines.push(first);
            for chunk in chunks {
                lines.push(format!("{:help_column$}{chunk}", ""));
            }
        }
    } else {
        let help_indent = INDENT * 2;
        for entry in entries {
            for chunk in wrap(&entry.left, line_limit.saturating_sub(INDENT)) {
                lines.push(format!("{:INDENT$}{chunk}", ""));
            }
            for chunk in wrap(&entry.help, line_limit.saturating_sub(help_indent)) {
                lines.push(format!("{:help_indent$}{chunk}", ""));
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Wrap each line of free text, keeping blank lines.
fn push_wrapped(lines: &mut Vec<String>, text: &str, width: usize) {
    for line in text.lines() {
        let wrapped = wrap(line, width);
        if wrapped.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(wrapped);
        }
    }
}

/// Word-wrap `text` into lines of at most `width` characters.
///
/// Splits at the last space within the width. A word with no space to split
/// at is cut at `width - 2` characters and continued after a trailing hyphen.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(3);
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.trim().chars().collect();

    loop {
        if rest.len() <= width {
            if !rest.is_empty() {
                lines.push(rest.iter().collect());
            }
            break;
        }
        match (1..=width).rev().find(|&i| rest[i] == ' ') {
            Some(split) => {
                let line: String = rest[..split].iter().collect();
                lines.push(line.trim_end().to_string());
                let skip = rest[split..].iter().take_while(|c| **c == ' ').count();
                rest.drain(..split + skip);
            }
            None => {
                let mut line: String = rest[..width - 2].iter().collect();
                line.push('-');
                lines.push(line);
                rest.drain(..width - 2);
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Build;
    use crate::schema::Schema;

    fn entry(left: &str, help: &str) -> UsageEntry {
        UsageEntry {
            left: left.into(),
            help: help.into(),
        }
    }

    #[test]
    fn wrap_fits_in_one_line() {
        assert_eq!(wrap("short text", 20), vec!["short text"]);
    }

    #[test]
    fn wrap_splits_at_last_space() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn wrap_splits_on_space_at_width() {
        assert_eq!(wrap("abcde fgh", 5), vec!["abcde", "fgh"]);
    }

    #[test]
    fn wrap_hyphenates_long_words() {
        assert_eq!(wrap("abcdefghij", 6), vec!["abcd-", "efghij"]);
        assert_eq!(wrap("abcdefghijklm", 6), vec!["abcd-", "efgh-", "ijklm"]);
    }

    #[test]
    fn wrap_empty_is_empty() {
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn entry_shapes() {
        let schema = Schema::<Build>::new().unwrap();
        let entries = schema.usage_entries();
        let find = |prefix: &str| {
            entries
                .iter()
                .find(|e| e.left.starts_with(prefix))
                .unwrap()
                .clone()
        };
        assert_eq!(find("/name").left, "/name, /n <string>");
        assert_eq!(find("/name").help, "Name of the build. Required.");
        assert_eq!(find("/verbose").left, "/verbose, /v");
        assert_eq!(find("/origin").left, "/origin <x> <y>");
        assert_eq!(find("/mode").left, "/mode <Fast|Slow>");
        assert_eq!(find("[/target]").left, "[/target] <string>");
        assert_eq!(find("/count").help, "Counts to add up. May be repeated.");
        assert_eq!(find("/waypoints").left, "/waypoints, /w <x> <y>");
    }

    #[test]
    fn single_column_layout() {
        let entries = vec![entry("/a", "first"), entry("/bbb <int>", "second")];
        let text = render(&entries, &UsageOptions::default());
        assert_eq!(
            text,
            "Options:\n  /a          first\n  /bbb <int>  second\n"
        );
    }

    #[test]
    fn banner_comes_first() {
        let options = UsageOptions {
            banner: Some("tool 1.0".into()),
            ..UsageOptions::default()
        };
        let text = render(&[entry("/a", "x")], &options);
        assert!(text.starts_with("tool 1.0\n\nOptions:\n"));
    }

    #[test]
    fn continuation_lines_align_under_help_column() {
        let help = "word ".repeat(30);
        let options = UsageOptions {
            width: 40,
            ..UsageOptions::default()
        };
        let text = render(&[entry("/name", &help)], &options);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() > 3);
        for line in &lines[2..] {
            assert!(line.starts_with(&" ".repeat(9)));
            assert!(!line[9..].starts_with(' '));
        }
    }

    #[test]
    fn narrow_width_uses_two_groups() {
        let left = "/a-really-long-argument-name <string>";
        let text = render(
            &[entry(left, "help text here")],
            &UsageOptions {
                width: 40,
                ..UsageOptions::default()
            },
        );
        assert_eq!(
            text,
            format!("Options:\n  {left}\n    help text here\n")
        );
    }

    #[test]
    fn lines_never_exceed_width_minus_one() {
        let schema = Schema::<Build>::new().unwrap();
        let mut entries = schema.usage_entries().to_vec();
        entries.push(entry(
            "/x",
            &format!("{} tail {}", "lorem ipsum ".repeat(12), "z".repeat(70)),
        ));
        entries.push(entry(&format!("/{}", "long".repeat(12)), "some help text"));
        for width in [40, 55, 80, 120] {
            let options = UsageOptions {
                width,
                ..UsageOptions::default()
            };
            for line in render(&entries, &options).lines() {
                assert!(
                    line.chars().count() <= width - 1,
                    "width {width}: {line:?}"
                );
            }
        }
    }

    #[test]
    fn long_banner_and_header_wrap() {
        let options = UsageOptions {
            banner: Some(format!("Usage: {} [options] [<target>]", "tool".repeat(15))),
            header: "Options accepted on the command line or in a response file:".into(),
            width: 40,
        };
        let text = render(&[entry("/a", "x")], &options);
        for line in text.lines() {
            assert!(line.chars().count() <= 39, "{line:?}");
        }
        assert!(text.contains("Options accepted on the command line"));
    }
}
