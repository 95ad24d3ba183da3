use crate::error::{Result, RubyTestError};

/// Replace the selection `start..end` (character offsets) with `name` and
/// assign the selected expression to `name` on a new line above, indented
/// like the selection's line.
///
/// ```text
///   total = price * qty + tax     select `price * qty`, name `subtotal`
///
///   subtotal = price * qty
///   total = subtotal + tax
/// ```
pub fn extract_variable(buffer: &str, start: usize, end: usize, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RubyTestError::InvalidSelection(
            "variable name is empty".to_string(),
        ));
    }

    let chars: Vec<char> = buffer.chars().collect();
    if start >= end {
        return Err(RubyTestError::InvalidSelection(
            "nothing is selected".to_string(),
        ));
    }
    if end > chars.len() {
        return Err(RubyTestError::InvalidSelection(format!(
            "selection end {end} is past the end of the buffer ({} characters)",
            chars.len()
        )));
    }

    let line_start = chars[..start]
        .iter()
        .rposition(|&c| c == '\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let indent: String = chars[line_start..]
        .iter()
        .take_while(|c| **c == ' ' || **c == '\t')
        .collect();
    let selection: String = chars[start..end].iter().collect();

    let mut out = String::with_capacity(buffer.len() + indent.len() + 2 * name.len() + 4);
    out.extend(&chars[..line_start]);
    out.push_str(&indent);
    out.push_str(name);
    out.push_str(" = ");
    out.push_str(&selection);
    out.push('\n');
    out.extend(&chars[line_start..start]);
    out.push_str(name);
    out.extend(&chars[end..]);
    Ok(out)
}
