//! Tag-level HTML scanning.
//!
//! The reference site's markup is old-school server-rendered tables with no
//! scripting between us and the data, so a handful of case-insensitive
//! substring scans is all the parsing we need.

/// ASCII-lowercased copy used for case-insensitive scanning.
fn lower(s: &str) -> String {
  s.chars().map(|c| c.to_ascii_lowercase()).collect()
}

/// Byte range of the next `<tag ...> ... </tag>` block at or after `from`.
///
/// Matching is non-nesting: the block ends at the first closing tag, which is
/// fine for the flat `table`/`tr`/`td` structure scanned here.
fn next_block(s: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
  let lc = lower(s);
  let open = format!("<{tag}");
  let close = format!("</{tag}>");
  let start = lc.get(from..)?.find(&open)? + from;
  let open_end = s[start..].find('>')? + start + 1;
  let end_rel = lc[open_end..].find(&close)?;
  Some((start, open_end + end_rel + close.len()))
}

/// All `<tag>` blocks in document order.
pub(crate) fn blocks<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
  let mut out = Vec::new();
  let mut at = 0;
  while let Some((start, end)) = next_block(s, tag, at) {
    out.push(&s[start..end]);
    at = end;
  }
  out
}

/// Drop all tags and collapse whitespace runs to single spaces.
pub(crate) fn strip_tags(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut in_tag = false;
  for ch in s.chars() {
    match ch {
      '<' => in_tag = true,
      '>' => in_tag = false,
      _ if !in_tag => out.push(ch),
      _ => {}
    }
  }
  out.split_whitespace().collect::<Vec<_>>().join(" ")
}
