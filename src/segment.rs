use crate::tokenize::Tokenizer;
use crate::Field;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// `{{infobox ... }}` where the closing braces sit alone on a line.
static INFOBOX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\{\{infobox.*?^\}\}$")
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .unwrap()
});

/// Any leftover single-line template invocation.
static BRACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{.*?\}\}").unwrap());

static CATEGORY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[category:(.*?)\]\]").unwrap());

/// Page titles in these namespaces are administrative and never indexed.
const META_NAMESPACES: &[&str] = &["Wikipedia:", "File:", "Template:"];

pub fn is_meta_page(title: &str) -> bool {
    META_NAMESPACES.iter().any(|ns| title.starts_with(ns))
}

/// Term sequences for one article, indexed by [`Field`].
#[derive(Debug, Default)]
pub struct FieldTokens {
    per_field: [Vec<String>; 6],
}

impl FieldTokens {
    pub fn get(&self, field: Field) -> &[String] {
        &self.per_field[field.index()]
    }
    fn set(&mut self, field: Field, terms: Vec<String>) {
        self.per_field[field.index()] = terms;
    }
}

/// Split an article into its six term sequences.
///
/// The wikitext is split once on `==references==`; body and infobox come
/// from the left half, references and external links from the right half,
/// categories from the whole text.
pub fn segment(tokenizer: &mut Tokenizer, title: &str, text: &str) -> FieldTokens {
    let text = text.to_lowercase();
    // Collapse `== references ==` variants down to `==references==`.
    let text = text.replace("== ", "==").replace(" ==", "==");

    let (before_refs, after_refs) = match text.find("==references==") {
        Some(at) => (&text[..at], Some(&text[at + "==references==".len()..])),
        None => (text.as_str(), None),
    };

    let mut out = FieldTokens::default();
    out.set(Field::Title, tokenizer.tokenize(title));
    out.set(Field::Body, extract_body(tokenizer, before_refs));
    out.set(Field::Infobox, extract_infobox(tokenizer, before_refs));
    out.set(Field::Categories, extract_categories(tokenizer, &text));
    if let Some(tail) = after_refs {
        out.set(Field::References, extract_references(tokenizer, tail));
        out.set(Field::ExternalLinks, extract_external_links(tokenizer, tail));
    }
    out
}

fn extract_body(tokenizer: &mut Tokenizer, text: &str) -> Vec<String> {
    let text = INFOBOX.replace_all(text, " ");
    let text = BRACES.replace_all(&text, " ");
    tokenizer.tokenize(&text)
}

/// Infobox blocks start at `{{infobox` and run until a line that is exactly
/// `}}`; everything in between is infobox text.
fn extract_infobox(tokenizer: &mut Tokenizer, text: &str) -> Vec<String> {
    let mut collected = String::new();
    for chunk in text.split("{{infobox").skip(1) {
        for line in chunk.lines() {
            if line == "}}" {
                break;
            }
            collected.push_str(line);
            collected.push(' ');
        }
    }
    tokenizer.tokenize(&collected)
}

fn extract_categories(tokenizer: &mut Tokenizer, text: &str) -> Vec<String> {
    let mut collected = String::new();
    for cap in CATEGORY.captures_iter(text) {
        collected.push_str(&cap[1]);
        collected.push(' ');
    }
    tokenizer.tokenize(&collected)
}

fn first_paragraph(text: &str) -> &str {
    match text.find("\n\n") {
        Some(at) => &text[..at],
        None => text,
    }
}

fn extract_references(tokenizer: &mut Tokenizer, text: &str) -> Vec<String> {
    let text = first_paragraph(text).replace("reflist", " ");
    tokenizer.tokenize(&text)
}

fn extract_external_links(tokenizer: &mut Tokenizer, text: &str) -> Vec<String> {
    match text.find("==external links==") {
        Some(at) => {
            let tail = &text[at + "==external links==".len()..];
            tokenizer.tokenize(first_paragraph(tail))
        }
        None => Vec::new(),
    }
}
