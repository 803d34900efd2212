//! Conversion of AWS HTML documentation into rustdoc comments

use regex::Regex;
use sdkgen_common::{GeneratorError, Result};

/// Converts the HTML fragments found in service definitions to Markdown
#[derive(Debug, Clone)]
pub struct DocConverter {
    whitespace: Regex,
    links: Regex,
    rewrites: Vec<(Regex, &'static str)>,
    tags: Regex,
    blank_lines: Regex,
}

impl DocConverter {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                GeneratorError::Generation(format!("Invalid documentation pattern {}: {}", pattern, e))
            })
        };

        let rewrites = [
            (r"(?i)<fullname>(.*?)</fullname>", "$1\n\n"),
            (r"(?i)<code>\s*(.*?)\s*</code>", "`$1`"),
            (r"(?i)</?(b|strong)>", "**"),
            (r"(?i)</?(i|em)>", "*"),
            (r"(?i)<li>\s*", "\n- "),
            (r"(?i)<(note|important)>\s*", "\n\n**Note:** "),
            (r"(?i)</(p|ul|ol|note|important|div)>", "\n\n"),
            (r"(?i)<br\s*/?>", "\n"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| compile(pattern).map(|re| (re, replacement)))
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            whitespace: compile(r"\s+")?,
            links: compile(r#"(?i)<a\s+[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)?,
            rewrites,
            tags: compile(r"<[^>]+>")?,
            blank_lines: compile(r"\n{3,}")?,
        })
    }

    /// Convert an HTML fragment to Markdown text
    pub fn to_markdown(&self, html: &str) -> String {
        let text = self.whitespace.replace_all(html, " ");
        let mut text = self.links.replace_all(&text, "[$2]($1)").into_owned();
        for (pattern, replacement) in &self.rewrites {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }
        let text = self.tags.replace_all(&text, "");
        let text = decode_entities(&text);

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let text = lines.join("\n");
        self.blank_lines
            .replace_all(&text, "\n\n")
            .trim()
            // Fenced blocks would turn into doctests of the generated crate
            .replace("```", "'''")
    }

    /// Render documentation as `///` lines indented by `indent` levels
    ///
    /// Returns an empty string when there is nothing to document.
    pub fn doc_comment(&self, html: Option<&str>, indent: usize) -> String {
        let Some(html) = html else {
            return String::new();
        };
        let markdown = self.to_markdown(html);
        if markdown.is_empty() {
            return String::new();
        }

        let prefix = "    ".repeat(indent);
        let mut out = String::new();
        for line in markdown.lines() {
            if line.is_empty() {
                out.push_str(&format!("{}///\n", prefix));
            } else {
                out.push_str(&format!("{}/// {}\n", prefix, line));
            }
        }
        out
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
