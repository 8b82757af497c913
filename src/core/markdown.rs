//! Markdown → markup fragment renderer.
//!
//! Handles a deliberately small subset: `#`/`##`/`###` headings at line start,
//! `**bold**`, `*italic*`, `` `code` `` spans and line breaks. Everything is
//! escaped first, so the only tags in the output are the ones produced here.
//!
//! Substitutions run in a fixed order. Later patterns only ever see text the
//! earlier ones produced, never the raw input. Rendering is not idempotent:
//! render each raw text exactly once.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown patterns are valid literals")
}

static H3: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^### (.*)$"));
static H2: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^## (.*)$"));
static H1: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^# (.*)$"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.*?)\*\*"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| compile(r"\*(.*?)\*"));
static CODE: LazyLock<Regex> = LazyLock::new(|| compile(r"`([^`]+)`"));

/// Line break markup emitted for every `\n`.
pub const LINE_BREAK: &str = "<br />";

/// Escapes the three markup-significant characters. `&` goes first so the
/// entities produced for `<` and `>` are not escaped twice.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render `text` into a safe markup fragment.
pub fn render(text: &str) -> String {
    let escaped = escape(text);
    let out = H3.replace_all(&escaped, "<h3>${1}</h3>");
    let out = H2.replace_all(&out, "<h2>${1}</h2>");
    let out = H1.replace_all(&out, "<h1>${1}</h1>");
    let out = BOLD.replace_all(&out, "<strong>${1}</strong>");
    let out = ITALIC.replace_all(&out, "<em>${1}</em>");
    let out = CODE.replace_all(&out, "<code>${1}</code>");
    out.replace('\n', LINE_BREAK)
}
