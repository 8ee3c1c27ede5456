//! Sanitizer for machine-translated rich text.
//!
//! Translation round-trips mangle markup (`< p >`, `</li>>`) and sometimes
//! invent tags. The cleaner repairs the tag spacing, parses the fragment,
//! unwraps every element outside the allowlist, strips attributes, drops
//! elements without text and serializes the result.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_fragment, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use regex::Regex;
use std::rc::Rc;
use std::sync::OnceLock;

pub const ALLOWED_TAGS: [&str; 10] = ["p", "ul", "ol", "li", "strong", "em", "b", "i", "u", "br"];

/// Re-parsing can restructure misnested formatting tags, so cleaning runs
/// until the output stops changing (bounded).
const MAX_PASSES: usize = 4;

struct SpacingPatterns {
    after_open: Regex,
    before_close: Regex,
    doubled_close: Regex,
}

fn spacing_patterns() -> &'static SpacingPatterns {
    static PATTERNS: OnceLock<SpacingPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SpacingPatterns {
        after_open: Regex::new(r"<(/?)\s+").expect("valid pattern"),
        before_close: Regex::new(r"\s+>").expect("valid pattern"),
        doubled_close: Regex::new(r">(\s*>)+").expect("valid pattern"),
    })
}

/// Repair tag spacing damaged by translation: `< p >` becomes `<p>`,
/// `</ p >` becomes `</p>` and `>>` collapses to `>`.
pub fn normalize_tag_spacing(text: &str) -> String {
    let patterns = spacing_patterns();
    let text = patterns.after_open.replace_all(text, "<$1");
    let text = patterns.before_close.replace_all(&text, ">");
    patterns.doubled_close.replace_all(&text, ">").into_owned()
}

/// Restrict `html` to the allowlisted tags.
///
/// Never fails: input that cannot be parsed into anything useful comes back
/// as its trimmed text.
pub fn clean_translated_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let mut current = clean_pass(html);
    for _ in 1..MAX_PASSES {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_pass(html: &str) -> String {
    let text = normalize_tag_spacing(html);

    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), LocalName::from("body")),
        vec![],
    )
    .one(text.as_str());

    // Fragment parsing wraps the content in a synthetic <html> element.
    let root = match dom.document.children.borrow().first() {
        Some(root) => root.clone(),
        None => return String::new(),
    };

    unwrap_disallowed(&root);
    remove_empty_elements(&root);

    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = root.into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    if serialize(&mut buf, &serializable, opts).is_err() {
        return text.trim().to_string();
    }

    String::from_utf8_lossy(&buf).trim().to_string()
}

enum Disposition {
    Keep,
    Unwrap,
    Drop,
}

fn is_allowed(name: &QualName) -> bool {
    ALLOWED_TAGS.contains(&&*name.local)
}

/// Replace every disallowed element under `node` by its children.
/// Comments, doctypes and processing instructions are dropped.
fn unwrap_disallowed(node: &Handle) {
    let children = std::mem::take(&mut *node.children.borrow_mut());
    let mut kept = Vec::with_capacity(children.len());

    for child in children {
        unwrap_disallowed(&child);

        let disposition = match &child.data {
            NodeData::Element { name, attrs, .. } => {
                if is_allowed(name) {
                    attrs.borrow_mut().clear();
                    Disposition::Keep
                } else {
                    Disposition::Unwrap
                }
            }
            NodeData::Text { .. } => Disposition::Keep,
            _ => Disposition::Drop,
        };

        match disposition {
            Disposition::Keep => kept.push(child),
            Disposition::Unwrap => {
                let mut grandchildren = take_template_contents(&child);
                grandchildren.extend(std::mem::take(&mut *child.children.borrow_mut()));
                for grandchild in grandchildren {
                    grandchild.parent.set(Some(Rc::downgrade(node)));
                    kept.push(grandchild);
                }
            }
            Disposition::Drop => {}
        }
    }

    *node.children.borrow_mut() = kept;
}

/// `<template>` keeps its content in a separate fragment rather than in
/// `children`. Clean that fragment and hand back its nodes.
fn take_template_contents(node: &Handle) -> Vec<Handle> {
    let NodeData::Element {
        template_contents, ..
    } = &node.data
    else {
        return Vec::new();
    };

    let fragment = template_contents.borrow_mut().take();
    match fragment {
        Some(fragment) => {
            unwrap_disallowed(&fragment);
            std::mem::take(&mut *fragment.children.borrow_mut())
        }
        None => Vec::new(),
    }
}

/// Remove every element whose text content is blank.
fn remove_empty_elements(node: &Handle) {
    node.children.borrow_mut().retain(|child| match child.data {
        NodeData::Element { .. } => !text_content(child).trim().is_empty(),
        _ => true,
    });

    for child in node.children.borrow().iter() {
        remove_empty_elements(child);
    }
}

fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}
