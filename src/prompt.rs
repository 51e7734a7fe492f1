//! Named-placeholder prompt templates.
//!
//! Feature prompts are static templates with `{name}` placeholders filled at
//! request time. Placeholder values are substituted verbatim and never
//! re-scanned, so JSON examples inside format instructions cannot collide with
//! the template syntax. `{{` and `}}` escape literal braces.

use crate::errors::RenderError;

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Renders the template against the given bindings.
    ///
    /// A placeholder with no matching binding yields
    /// [`RenderError::MissingField`]; extra bindings are ignored.
    pub fn render(&self, bindings: &[(&str, String)]) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            match c {
                '{' => {
                    if let Some(&(_, '{')) = chars.peek() {
                        chars.next();
                        out.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(RenderError::UnterminatedPlaceholder { at });
                    }
                    match bindings.iter().find(|(key, _)| *key == name) {
                        Some((_, value)) => out.push_str(value),
                        None => return Err(RenderError::MissingField { name }),
                    }
                }
                '}' => {
                    if let Some(&(_, '}')) = chars.peek() {
                        chars.next();
                    }
                    out.push('}');
                }
                _ => out.push(c),
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_named_placeholders() {
        let template = PromptTemplate::new("Symptoms: {symptoms}\n{format_instructions}");
        let rendered = template
            .render(&[
                ("symptoms", "fever, cough".to_string()),
                ("format_instructions", "Return JSON.".to_string()),
            ])
            .unwrap();
        assert_eq!(rendered, "Symptoms: fever, cough\nReturn JSON.");
    }

    #[test]
    fn missing_binding_is_a_render_error() {
        let template = PromptTemplate::new("Symptoms: {symptoms}");
        let err = template.render(&[]).unwrap_err();
        match err {
            RenderError::MissingField { name } => assert_eq!(name, "symptoms"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn doubled_braces_are_literals() {
        let template = PromptTemplate::new("{{\"key\": {value}}}");
        let rendered = template.render(&[("value", "1".to_string())]).unwrap();
        assert_eq!(rendered, "{\"key\": 1}");
    }

    #[test]
    fn binding_values_are_not_rescanned() {
        let template = PromptTemplate::new("{example}");
        let rendered = template
            .render(&[("example", "{\"severity\": \"low\"}".to_string())])
            .unwrap();
        assert_eq!(rendered, "{\"severity\": \"low\"}");
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let template = PromptTemplate::new("oops {name");
        assert!(matches!(
            template.render(&[("name", String::new())]),
            Err(RenderError::UnterminatedPlaceholder { .. })
        ));
    }
}
