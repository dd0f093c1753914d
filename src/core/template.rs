/// `{key}` placeholder templates.
///
/// Parsing never fails. A placeholder key is ASCII letters, digits and `_`;
/// any other brace content, unmatched braces and empty braces stay literal.
/// Keys without a value are rendered back verbatim as `{key}`.

use serde::{Deserialize, Serialize};

use crate::schema::player::Vars;

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Substitution from the player's vars: `{key}`.
    Var(String),
}

/// A parsed template: a sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    pub fn parse(input: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                let start = i + 1;
                let mut end = start;
                while end < len && is_key_char(chars[end]) {
                    end += 1;
                }

                if end < len && chars[end] == '}' && end > start {
                    if !literal_buf.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                    }
                    let key: String = chars[start..end].iter().collect();
                    segments.push(TemplateSegment::Var(key));
                    i = end + 1;
                    continue;
                }

                // Not a placeholder
                literal_buf.push('{');
                i += 1;
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Template { segments }
    }

    pub fn render(&self, vars: &Vars) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Var(key) => match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                },
            }
        }
        out
    }

    /// Keys this template substitutes, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Var(key) => Some(key.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse and render in one step.
pub fn render_str(input: &str, vars: &Vars) -> String {
    Template::parse(input).render(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vars {
        [("va", "0x5C"), ("optA_pg", "0")].into_iter().collect()
    }

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.");
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Hello, world.".to_string())]
        );
    }

    #[test]
    fn parse_var() {
        let t = Template::parse("Address {va} arrives");
        assert_eq!(t.segments.len(), 3);
        assert_eq!(t.segments[1], TemplateSegment::Var("va".to_string()));
    }

    #[test]
    fn render_substitutes_known_keys() {
        assert_eq!(render_str("VA {va}, page {optA_pg}", &vars()), "VA 0x5C, page 0");
    }

    #[test]
    fn unknown_keys_stay_verbatim() {
        assert_eq!(render_str("PFN {pfnCow}", &vars()), "PFN {pfnCow}");
    }

    #[test]
    fn stray_braces_are_literal() {
        assert_eq!(render_str("{ va } {} {va", &vars()), "{ va } {} {va");
        assert_eq!(render_str("a } b", &vars()), "a } b");
        assert_eq!(render_str("{{va}}", &vars()), "{0x5C}");
    }

    #[test]
    fn placeholders_in_order() {
        let t = Template::parse("{a} and {b} then {a}");
        let keys: Vec<&str> = t.placeholders().collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }
}
