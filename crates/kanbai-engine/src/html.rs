//! Low-level HTML string scanning helpers.
//!
//! Deliberately naive and tailored to the storefront's markup: repeated
//! list items carrying a known class, with class-marked name and stock
//! sub-fields inside. Matching is substring-based on class attributes,
//! which survives the site's hashed class suffixes.

/// Find the next element of `tag` whose opening tag mentions `class`,
/// starting at `from`. Returns the byte range of the whole block including
/// the closing tag. Nested same-name tags are not handled; the storefront
/// does not nest its variation items.
pub fn next_block_with_class(
    s: &str,
    tag: &str,
    class: &str,
    from: usize,
) -> Option<(usize, usize)> {
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}>");
    let mut pos = from;

    while let Some(rel) = s.get(pos..)?.find(&open_pat) {
        let start = pos + rel;
        let tag_end = s[start..].find('>')? + start + 1;
        if s[start..tag_end].contains(class) {
            let close_rel = s[tag_end..].find(&close_pat)?;
            return Some((start, tag_end + close_rel + close_pat.len()));
        }
        pos = tag_end;
    }
    None
}

/// Text content of the first element inside `block` whose opening tag
/// mentions `class`, regardless of its tag name. Empty string when absent.
pub fn class_text(block: &str, class: &str) -> String {
    let Some(attr_pos) = block.find(class) else {
        return String::new();
    };
    // Back up to the '<' that opens this tag
    let Some(tag_start) = block[..attr_pos].rfind('<') else {
        return String::new();
    };
    let name: String = block[tag_start + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return String::new();
    }
    let Some(open_end) = block[attr_pos..].find('>').map(|i| attr_pos + i + 1) else {
        return String::new();
    };
    let close_pat = format!("</{name}>");
    let inner = match block[open_end..].find(&close_pat) {
        Some(rel) => &block[open_end..open_end + rel],
        None => &block[open_end..],
    };
    text_of(inner)
}

/// Strip tags, decode the handful of entities the storefront emits, and
/// collapse whitespace.
pub fn text_of(s: &str) -> String {
    let mut stripped = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    collapse_ws(&decode_entities(&stripped))
}

/// Minimal entity decoding: the storefront only emits these.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
