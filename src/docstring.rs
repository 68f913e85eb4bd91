//! Structured documentation parsing.
//!
//! One convention is recognised:
//!
//! ```text
//! Summary paragraph, possibly
//! spanning lines.
//!
//! Args:
//!     a (int): First operand.
//!     b: Second operand, with a
//!         continuation line.
//!
//! Returns:
//!     The sum.
//!
//! Raises:
//!     ValueError: when something is off.
//! ```
//!
//! Parsing never fails. Text that does not contain a labelled section is
//! treated as undocumented: the summary is empty and every parameter gets
//! the default description.

/// A documented parameter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    pub name: String,
    /// The parenthesised type, if the entry carried one.
    pub type_hint: Option<String>,
    pub description: String,
}

/// Parsed documentation of a native function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocString {
    pub summary: String,
    pub params: Vec<ParamDoc>,
    pub returns: Option<String>,
    pub raises: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Args,
    Returns,
    Raises,
}

impl Section {
    /// Recognises a section label line, returning any text after the colon.
    fn from_line(trimmed: &str) -> Option<(Section, &str)> {
        let (label, rest) = trimmed.split_once(':')?;
        let section = match label.trim() {
            "Args" | "Arguments" | "Parameters" => Section::Args,
            "Returns" | "Return" => Section::Returns,
            "Raises" => Section::Raises,
            _ => return None,
        };
        Some((section, rest.trim()))
    }
}

impl DocString {
    /// Description for a declared parameter; exactly ``Parameter `<name>` ``
    /// when the documentation does not mention it.
    pub fn param_description(&self, name: &str) -> String {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.description.clone())
            .unwrap_or_else(|| default_description(name))
    }

    /// Names documented but absent from `declared`. They are ignored when
    /// compiling; this is for logging.
    pub fn undeclared_params<'a>(&'a self, declared: &[&str]) -> Vec<&'a str> {
        self.params
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| !declared.contains(name))
            .collect()
    }
}

/// The description given to undocumented parameters.
pub fn default_description(name: &str) -> String {
    format!("Parameter `{name}`")
}

/// Parses raw documentation text.
pub fn parse_docstring(raw: &str) -> DocString {
    let lines: Vec<&str> = raw.lines().collect();
    let Some(first_section) = lines
        .iter()
        .position(|line| Section::from_line(line.trim()).is_some())
    else {
        tracing::debug!("documentation has no labelled sections, using defaults");
        return DocString::default();
    };

    let summary = lines[..first_section]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut doc = DocString {
        summary,
        ..DocString::default()
    };

    let mut index = first_section;
    while index < lines.len() {
        let Some((section, inline)) = Section::from_line(lines[index].trim()) else {
            index += 1;
            continue;
        };
        let end = lines[index + 1..]
            .iter()
            .position(|line| Section::from_line(line.trim()).is_some())
            .map(|offset| index + 1 + offset)
            .unwrap_or(lines.len());
        let body = &lines[index + 1..end];

        match section {
            Section::Args => parse_entries(body, &mut doc.params),
            Section::Returns => doc.returns = join_section(inline, body),
            Section::Raises => doc.raises = join_section(inline, body),
        }
        index = end;
    }
    doc
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn join_section(inline: &str, body: &[&str]) -> Option<String> {
    let text = std::iter::once(inline)
        .chain(body.iter().map(|line| line.trim()))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn parse_entries(body: &[&str], params: &mut Vec<ParamDoc>) {
    let Some(entry_indent) = body
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| indent_of(line))
    else {
        return;
    };

    let mut current: Option<ParamDoc> = None;
    for line in body {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry = (indent_of(line) <= entry_indent)
            .then(|| parse_entry(trimmed))
            .flatten();
        if let Some(entry) = entry {
            params.extend(current.replace(entry));
        } else if let Some(param) = current.as_mut() {
            if !param.description.is_empty() {
                param.description.push(' ');
            }
            param.description.push_str(trimmed);
        }
    }
    params.extend(current);
}

/// Reads `name [(type)]: text`.
fn parse_entry(line: &str) -> Option<ParamDoc> {
    let (head, text) = line.split_once(':')?;
    let head = head.trim();
    let (name, type_hint) = match head.split_once('(') {
        Some((name, rest)) => {
            let hint = rest.trim_end().strip_suffix(')')?;
            (name.trim(), Some(hint.trim().to_string()))
        }
        None => (head, None),
    };
    let is_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_identifier {
        return None;
    }
    Some(ParamDoc {
        name: name.to_string(),
        type_hint,
        description: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "Adds two numbers.

    Handles negatives too.

    Args:
        a (int): The first
            operand.
        b: The second operand.

    Returns:
        int: The sum.

    Raises:
        ValueError: never.
    ";

    #[test]
    fn parses_all_sections() {
        let doc = parse_docstring(FULL);
        assert_eq!(doc.summary, "Adds two numbers. Handles negatives too.");
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.params[0].type_hint.as_deref(), Some("int"));
        assert_eq!(doc.param_description("a"), "The first operand.");
        assert_eq!(doc.param_description("b"), "The second operand.");
        assert_eq!(doc.returns.as_deref(), Some("int: The sum."));
        assert_eq!(doc.raises.as_deref(), Some("ValueError: never."));
    }

    #[test]
    fn undocumented_parameters_get_default_description() {
        let doc = parse_docstring(FULL);
        assert_eq!(doc.param_description("c"), "Parameter `c`");
    }

    #[test]
    fn nonconforming_text_degrades_to_defaults() {
        for raw in ["", "just a sentence", "a: looks like an entry", ":::\n\t(("] {
            let doc = parse_docstring(raw);
            assert_eq!(doc.summary, "");
            assert!(doc.params.is_empty());
            assert_eq!(doc.param_description("x"), "Parameter `x`");
        }
    }

    #[test]
    fn alternative_labels_and_inline_returns() {
        let doc = parse_docstring("Summary.\nParameters:\n  x: value\nReturns: nothing");
        assert_eq!(doc.param_description("x"), "value");
        assert_eq!(doc.returns.as_deref(), Some("nothing"));
    }

    #[test]
    fn extra_documented_names_are_reported_not_used() {
        let doc = parse_docstring("Args:\n    a: one\n    zzz: stale\n");
        assert_eq!(doc.undeclared_params(&["a"]), vec!["zzz"]);
    }

    #[test]
    fn section_with_no_summary() {
        let doc = parse_docstring("Args:\n    a: one");
        assert_eq!(doc.summary, "");
        assert_eq!(doc.param_description("a"), "one");
    }
}
