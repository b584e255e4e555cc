//! Jira wiki markup to Markdown conversion.
//!
//! Comment bodies arrive in Jira's wiki syntax. They are stored as Markdown
//! so the text reads naturally in search results and detail views.
//!
//! | Jira | Markdown |
//! |------|----------|
//! | `h2. Title` | `## Title` |
//! | `*bold*` | `**bold**` |
//! | `_italic_` | `*italic*` |
//! | `{{mono}}` | `` `mono` `` |
//! | `-strike-` | `~~strike~~` |
//! | `+inserted+` | `<ins>inserted</ins>` |
//! | `^sup^` / `~sub~` | `<sup>sup</sup>` / `<sub>sub</sub>` |
//! | `[text\|url]` / `[url]` | `[text](url)` / `<url>` |
//! | `[~user]` | `@user` |
//! | `!shot.png!` | `![](shot.png)` |
//! | `* a` / `## b` | `* a` / `  1. b` |
//! | `bq. q` / `{quote}` | `> q` |
//! | `{code:rust}` / `{noformat}` | fenced block |
//! | `\|\|a\|\|b\|\|` | `\|a\|b\|` plus separator row |
//!
//! Text inside code blocks and `{{…}}` spans is never rewritten.

/// Convert a Jira wiki markup document to Markdown.
pub fn jira_to_markdown(input: &str) -> String {
    let mut conv = Converter::default();
    for line in input.lines() {
        conv.line(line);
    }
    if conv.fence.is_some() {
        conv.out.push("```".to_string());
    }
    conv.out.join("\n")
}

#[derive(Clone, Copy)]
enum Fence {
    Code,
    NoFormat,
}

impl Fence {
    fn close_tag(self) -> &'static str {
        match self {
            Fence::Code => "{code}",
            Fence::NoFormat => "{noformat}",
        }
    }
}

#[derive(Default)]
struct Converter {
    out: Vec<String>,
    fence: Option<Fence>,
    in_quote: bool,
}

impl Converter {
    fn line(&mut self, line: &str) {
        if let Some(fence) = self.fence {
            let tag = fence.close_tag();
            match line.find(tag) {
                Some(idx) => {
                    if !line[..idx].is_empty() {
                        self.push_raw(&line[..idx]);
                    }
                    self.push_raw("```");
                    self.fence = None;
                    let rest = &line[idx + tag.len()..];
                    if !rest.trim().is_empty() {
                        self.line(rest);
                    }
                }
                None => self.push_raw(line),
            }
            return;
        }

        let trimmed = line.trim_start();

        if let Some((fence, lang, rest)) = open_fence(trimmed) {
            self.push_raw(&format!("```{}", lang));
            self.fence = Some(fence);
            if !rest.is_empty() {
                self.line(rest);
            }
            return;
        }

        if let Some(idx) = line.find("{quote}") {
            let before = &line[..idx];
            if !before.trim().is_empty() {
                self.line(before);
            }
            self.in_quote = !self.in_quote;
            let rest = &line[idx + "{quote}".len()..];
            if !rest.trim().is_empty() {
                self.line(rest);
            }
            return;
        }

        let converted = convert_line(line);
        self.push_raw(&converted);
    }

    fn push_raw(&mut self, text: &str) {
        if self.in_quote {
            for l in text.split('\n') {
                self.out.push(format!("> {}", l));
            }
        } else {
            self.out.push(text.to_string());
        }
    }
}

/// Recognise `{code}`, `{code:lang}`, `{code:lang|title=x}` and `{noformat}`.
fn open_fence(trimmed: &str) -> Option<(Fence, String, &str)> {
    let (fence, after) = if let Some(after) = trimmed.strip_prefix("{code") {
        (Fence::Code, after)
    } else if let Some(after) = trimmed.strip_prefix("{noformat") {
        (Fence::NoFormat, after)
    } else {
        return None;
    };

    if !after.starts_with('}') && !after.starts_with(':') {
        return None;
    }
    let close = after.find('}')?;
    let params = after[..close].trim_start_matches(':');
    let lang = match fence {
        Fence::Code => params
            .split('|')
            .next()
            .filter(|p| !p.contains('='))
            .unwrap_or("")
            .to_string(),
        Fence::NoFormat => String::new(),
    };
    Some((fence, lang, &after[close + 1..]))
}

fn convert_line(line: &str) -> String {
    let trimmed = line.trim_start();

    if let Some((level, rest)) = heading(trimmed) {
        return format!("{} {}", "#".repeat(level), inline(rest.trim_start()));
    }

    if let Some(rest) = trimmed.strip_prefix("bq.") {
        return format!("> {}", inline(rest.trim_start()));
    }

    if trimmed == "----" {
        return "---".to_string();
    }

    if trimmed.starts_with("||") {
        return table_header(trimmed);
    }

    if let Some((depth, ordered, rest)) = list_item(trimmed) {
        let bullet = if ordered { "1." } else { "*" };
        return format!("{}{} {}", "  ".repeat(depth - 1), bullet, inline(rest));
    }

    inline(line)
}

fn heading(trimmed: &str) -> Option<(usize, &str)> {
    let mut chars = trimmed.chars();
    if chars.next() != Some('h') {
        return None;
    }
    let level = chars.next()?.to_digit(10)? as usize;
    if !(1..=6).contains(&level) || chars.next() != Some('.') {
        return None;
    }
    Some((level, &trimmed[3..]))
}

fn list_item(trimmed: &str) -> Option<(usize, bool, &str)> {
    let markers = trimmed
        .chars()
        .take_while(|c| matches!(c, '*' | '#' | '-'))
        .count();
    if markers == 0 {
        return None;
    }
    let rest = &trimmed[markers..];
    if !rest.starts_with(' ') {
        return None;
    }
    let ordered = trimmed[..markers].ends_with('#');
    Some((markers, ordered, rest.trim_start()))
}

fn table_header(trimmed: &str) -> String {
    let cells: Vec<String> = trimmed
        .trim_end()
        .trim_matches('|')
        .split("||")
        .map(|c| inline(c.trim()))
        .collect();
    let header = format!("|{}|", cells.join("|"));
    let separator = format!("|{}|", vec!["---"; cells.len()].join("|"));
    format!("{}\n{}", header, separator)
}

fn wrap_for(delim: char) -> Option<(&'static str, &'static str)> {
    match delim {
        '*' => Some(("**", "**")),
        '_' => Some(("*", "*")),
        '-' => Some(("~~", "~~")),
        '+' => Some(("<ins>", "</ins>")),
        '^' => Some(("<sup>", "</sup>")),
        '~' => Some(("<sub>", "</sub>")),
        _ => None,
    }
}

/// Convert inline markup within one line.
fn inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '{' {
            if let Some((consumed, rendered)) = brace_token(&chars, i) {
                out.push_str(&rendered);
                i += consumed;
                continue;
            }
        }

        if c == '[' {
            if let Some(end) = find(&chars, i + 1, ']') {
                let inner: String = chars[i + 1..end].iter().collect();
                out.push_str(&link(&inner));
                i = end + 1;
                continue;
            }
        }

        if c == '!' {
            if let Some(end) = find(&chars, i + 1, '!') {
                let inner: String = chars[i + 1..end].iter().collect();
                if let Some(src) = image_source(&inner) {
                    out.push_str(&format!("![]({})", src));
                    i = end + 1;
                    continue;
                }
            }
        }

        if let Some((open, close)) = wrap_for(c) {
            if let Some(end) = closing_delim(&chars, i) {
                let inner: String = chars[i + 1..end].iter().collect();
                out.push_str(open);
                out.push_str(&inline(&inner));
                out.push_str(close);
                i = end + 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

fn find(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars
        .get(from..)?
        .iter()
        .position(|&c| c == target)
        .map(|p| p + from)
}

/// `{{mono}}` and `{color:…}` / `{color}` spans. Returns chars consumed.
fn brace_token(chars: &[char], i: usize) -> Option<(usize, String)> {
    let rest: String = chars[i..].iter().collect();

    if let Some(after) = rest.strip_prefix("{{") {
        let end = after.find("}}")?;
        let code = &after[..end];
        return Some((code.chars().count() + 4, format!("`{}`", code)));
    }

    if rest.starts_with("{color") {
        let end = rest.find('}')?;
        return Some((rest[..=end].chars().count(), String::new()));
    }

    None
}

fn link(inner: &str) -> String {
    if let Some(user) = inner.strip_prefix('~') {
        return format!("@{}", user);
    }
    match inner.split_once('|') {
        Some((text, url)) => format!("[{}]({})", inline(text), url.trim()),
        None if looks_like_url(inner) => format!("<{}>", inner.trim()),
        None => format!("[{}]", inline(inner)),
    }
}

fn looks_like_url(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("mailto:")
}

fn image_source(inner: &str) -> Option<&str> {
    let src = inner.split('|').next()?;
    if src.is_empty() || src.chars().any(char::is_whitespace) {
        return None;
    }
    Some(src)
}

/// Index of the delimiter closing the one at `i`, if `i` opens a span.
fn closing_delim(chars: &[char], i: usize) -> Option<usize> {
    let d = chars[i];
    let opens = (i == 0 || !chars[i - 1].is_alphanumeric())
        && chars
            .get(i + 1)
            .is_some_and(|&n| !n.is_whitespace() && n != d);
    if !opens {
        return None;
    }

    (i + 2..chars.len()).find(|&j| {
        chars[j] == d
            && !chars[j - 1].is_whitespace()
            && chars.get(j + 1).map_or(true, |n| !n.is_alphanumeric())
    })
}
