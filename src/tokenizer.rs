/// One source line after comment stripping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLine {
    /// Inline or standalone `name:` label, without the colon.
    pub label: Option<String>,
    /// Mnemonic followed by its operands; empty for label-only lines.
    pub tokens: Vec<String>,
    /// Comment-stripped, trimmed text.
    pub text: String,
}

impl SourceLine {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.tokens.is_empty()
    }

    pub fn is_label_only(&self) -> bool {
        self.label.is_some() && self.tokens.is_empty()
    }

    pub fn mnemonic(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn operands(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }
}

fn is_separator(c: char) -> bool {
    c == ',' || c == '(' || c == ')' || c.is_whitespace()
}

/// Split a raw line into label and tokens. Commas, parentheses and
/// whitespace all separate, so `lw $t0, 4($sp)` yields `lw $t0 4 $sp`.
pub fn tokenize(raw: &str, comment_marker: char) -> SourceLine {
    let body = match raw.find(comment_marker) {
        Some(p) => &raw[..p],
        None => raw,
    };
    let mut tokens: Vec<String> = body
        .split(is_separator)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let label = match tokens.first() {
        Some(first) if first.len() > 1 && first.ends_with(':') => {
            let name = tokens.remove(0);
            Some(name[..name.len() - 1].to_string())
        }
        _ => None,
    };
    SourceLine { label, tokens, text: body.trim().to_string() }
}
