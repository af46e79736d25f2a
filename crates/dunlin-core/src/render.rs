//! Plain-text template rendering with `{variable}` placeholders.
//!
//! Rendering is pure string substitution: no I/O, no escaping (invoice data
//! is trusted internal content), deterministic output. Blank variables
//! remove whole lines that contain nothing but their placeholder, so
//! optional content like an invoice link collapses cleanly.

use std::collections::BTreeMap;

/// Variable map for rendering. An empty value means "blank" (the
/// placeholder and any line it occupies alone are removed); a name absent
/// from the map leaves its placeholder untouched.
pub type TemplateVars = BTreeMap<String, String>;

/// Render a template by substituting `{name}` placeholders.
///
/// For each entry in `vars`:
/// - empty value: lines consisting solely of the placeholder (surrounding
///   whitespace ignored) are deleted; remaining occurrences are replaced
///   with the empty string
/// - non-empty value: every occurrence is replaced verbatim
///
/// Afterwards runs of three or more newlines are collapsed to two and the
/// result is trimmed. Unrecognized placeholders pass through unchanged;
/// flagging them is a caller concern (see [`placeholders`]).
pub fn render(template: &str, vars: &TemplateVars) -> String {
	let mut out = template.to_string();

	for (name, value) in vars {
		let token = format!("{{{}}}", name);
		if value.is_empty() {
			out = drop_placeholder_lines(&out, &token);
			out = out.replace(&token, "");
		} else {
			out = out.replace(&token, value);
		}
	}

	collapse_blank_lines(&out)
}

/// Placeholder names referenced by a template, in order of first
/// occurrence. Used by calling layers to warn about unknown variables.
pub fn placeholders(template: &str) -> Vec<String> {
	let mut found: Vec<String> = Vec::new();
	let mut rest = template;

	while let Some(start) = rest.find('{') {
		rest = &rest[start + 1..];
		let Some(end) = rest.find('}') else { break };
		let name = &rest[..end];
		if !name.is_empty()
			&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
			&& !found.iter().any(|n| n == name)
		{
			found.push(name.to_string());
		}
		rest = &rest[end + 1..];
	}

	found
}

/// Remove lines that consist solely of `token`, ignoring surrounding
/// whitespace.
fn drop_placeholder_lines(text: &str, token: &str) -> String {
	let kept: Vec<&str> = text.lines().filter(|line| line.trim() != token).collect();
	kept.join("\n")
}

/// Collapse runs of 3+ newlines to exactly 2, then trim the whole result.
fn collapse_blank_lines(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut newlines = 0usize;

	for ch in text.chars() {
		if ch == '\n' {
			newlines += 1;
			if newlines <= 2 {
				out.push(ch);
			}
		} else {
			newlines = 0;
			out.push(ch);
		}
	}

	out.trim().to_string()
}


// vim: ts=4
