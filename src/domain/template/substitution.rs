//! Token substitution engine for templates

use std::collections::HashMap;

use crate::metrics::SubstitutionMetrics;

use super::types::{EmailTemplate, RenderedEmail, TemplateError, TemplateResult, Token};

/// Replace every occurrence of each token in `content` with its value.
///
/// Tokens are applied in ascending `sequence_number` order; tokens sharing a
/// sequence number keep their relative order. A token without an entry in
/// `values` fails the whole call. Entries in `values` that match no token are
/// ignored.
pub fn substitute(
    content: &str,
    tokens: &[Token],
    values: &HashMap<String, String>,
) -> TemplateResult<String> {
    let mut ordered: Vec<&Token> = tokens.iter().collect();
    // sort_by_key is stable
    ordered.sort_by_key(|t| t.sequence_number);

    let mut result = content.to_string();

    for token in ordered {
        match values.get(&token.value) {
            Some(replacement) => {
                result = result.replace(&token.value, replacement);
            }
            None => {
                tracing::debug!(token = %token.value, "Token not found in substitutions");
                return Err(TemplateError::SubstitutionTokenMismatch(
                    token.value.clone(),
                ));
            }
        }
    }

    Ok(result)
}

impl EmailTemplate {
    /// Substitute tokens into the HTML body, plain-text body and subject.
    ///
    /// Either all three fields are replaced or none is: on error the template
    /// is left exactly as it was.
    pub fn apply_substitutions(&mut self, values: &HashMap<String, String>) -> TemplateResult<()> {
        let rendered = self.render(values)?;

        self.html_content = rendered.html_content;
        self.plain_text_content = rendered.plain_text_content;
        self.subject = rendered.subject;

        Ok(())
    }

    /// Render a substituted copy of this template.
    pub fn render(&self, values: &HashMap<String, String>) -> TemplateResult<RenderedEmail> {
        let result = self.render_fields(values);

        match &result {
            Ok(_) => SubstitutionMetrics::record_success(),
            Err(_) => SubstitutionMetrics::record_mismatch(),
        }

        result
    }

    fn render_fields(&self, values: &HashMap<String, String>) -> TemplateResult<RenderedEmail> {
        let html_content = substitute(&self.html_content, &self.tokens, values).inspect_err(|e| {
            tracing::warn!(template_id = %self.id, error = %e, "Failed to substitute html content");
        })?;

        let plain_text_content = substitute(&self.plain_text_content, &self.tokens, values)
            .inspect_err(|e| {
                tracing::warn!(template_id = %self.id, error = %e, "Failed to substitute plain text content");
            })?;

        let subject = substitute(&self.subject, &self.tokens, values).inspect_err(|e| {
            tracing::warn!(template_id = %self.id, error = %e, "Failed to substitute subject");
        })?;

        Ok(RenderedEmail {
            template_id: self.id.clone(),
            name: self.name.clone(),
            subject,
            html_content,
            plain_text_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn welcome_template() -> EmailTemplate {
        EmailTemplate {
            id: "tmpl-1".to_string(),
            name: "welcome".to_string(),
            subject: "Hi {{NAME}}".to_string(),
            html_content: "<p>Welcome {{NAME}}, code {{CODE}}</p>".to_string(),
            plain_text_content: "Welcome {{NAME}}, code {{CODE}}".to_string(),
            tokens: vec![Token::new("{{NAME}}", 0), Token::new("{{CODE}}", 1)],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_substitute_simple() {
        let result = substitute(
            "Hello, {{name}}!",
            &[Token::new("{{name}}", 0)],
            &values(&[("{{name}}", "World")]),
        )
        .unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let result = substitute(
            "{{x}}-{{x}}-{{x}}",
            &[Token::new("{{x}}", 0)],
            &values(&[("{{x}}", "1")]),
        )
        .unwrap();
        assert_eq!(result, "1-1-1");
    }

    #[test]
    fn test_substitute_is_literal_not_regex() {
        let result = substitute(
            "price: $1.00 (a.b)",
            &[Token::new("(a.b)", 0)],
            &values(&[("(a.b)", "ok")]),
        )
        .unwrap();
        assert_eq!(result, "price: $1.00 ok");
    }

    #[test]
    fn test_sequence_order_changes_result() {
        let tokens = vec![Token::new("A", 2), Token::new("B", 1)];
        let vals = values(&[("B", "A"), ("A", "Z")]);

        let result = substitute("B", &tokens, &vals).unwrap();
        assert_eq!(result, "Z");

        // Declaration order would have produced "A"
        let declared = "B".replace("A", "Z").replace("B", "A");
        assert_eq!(declared, "A");
    }

    #[test]
    fn test_equal_sequence_keeps_declaration_order() {
        let tokens = vec![Token::new("X", 5), Token::new("Y", 5)];
        let vals = values(&[("X", "Y"), ("Y", "done")]);

        // X -> Y first, then Y -> done
        assert_eq!(substitute("X", &tokens, &vals).unwrap(), "done");

        let reversed = vec![Token::new("Y", 5), Token::new("X", 5)];
        assert_eq!(substitute("X", &reversed, &vals).unwrap(), "Y");
    }

    #[test]
    fn test_missing_value_fails() {
        let tokens = vec![Token::new("{{a}}", 0), Token::new("{{b}}", 1)];
        let result = substitute("{{a}} {{b}}", &tokens, &values(&[("{{a}}", "1")]));

        match result {
            Err(TemplateError::SubstitutionTokenMismatch(token)) => assert_eq!(token, "{{b}}"),
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_value_fails_even_if_token_absent_from_content() {
        let result = substitute("static", &[Token::new("{{a}}", 0)], &HashMap::new());
        assert!(matches!(
            result,
            Err(TemplateError::SubstitutionTokenMismatch(_))
        ));
    }

    #[test]
    fn test_extra_values_ignored() {
        let result = substitute(
            "{{a}}",
            &[Token::new("{{a}}", 0)],
            &values(&[("{{a}}", "1"), ("{{unused}}", "2")]),
        )
        .unwrap();
        assert_eq!(result, "1");
    }

    #[test]
    fn test_no_tokens_returns_content() {
        let result = substitute("{{a}} untouched", &[], &HashMap::new()).unwrap();
        assert_eq!(result, "{{a}} untouched");
    }

    #[test]
    fn test_caller_tokens_not_reordered() {
        let tokens = vec![Token::new("A", 2), Token::new("B", 1)];
        substitute("AB", &tokens, &values(&[("A", "1"), ("B", "2")])).unwrap();

        assert_eq!(tokens[0].value, "A");
        assert_eq!(tokens[1].value, "B");
    }

    #[test]
    fn test_apply_substitutions_all_fields() {
        let mut template = welcome_template();
        template
            .apply_substitutions(&values(&[("{{NAME}}", "Alice"), ("{{CODE}}", "42")]))
            .unwrap();

        assert_eq!(template.subject, "Hi Alice");
        assert_eq!(template.html_content, "<p>Welcome Alice, code 42</p>");
        assert_eq!(template.plain_text_content, "Welcome Alice, code 42");
    }

    #[test]
    fn test_apply_substitutions_is_all_or_nothing() {
        let mut template = welcome_template();
        let original = template.clone();

        let result = template.apply_substitutions(&values(&[("{{NAME}}", "Alice")]));

        assert!(matches!(
            result,
            Err(TemplateError::SubstitutionTokenMismatch(_))
        ));
        assert_eq!(template, original);
    }

    #[test]
    fn test_welcome_scenario() {
        let mut template = EmailTemplate {
            id: "id".to_string(),
            name: "welcome".to_string(),
            subject: "Hi {{NAME}}".to_string(),
            html_content: "<b>{{NAME}}</b>".to_string(),
            plain_text_content: "{{NAME}}".to_string(),
            tokens: vec![Token::new("{{NAME}}", 0)],
            created_at: Utc::now(),
        };

        assert!(matches!(
            template.clone().apply_substitutions(&HashMap::new()),
            Err(TemplateError::SubstitutionTokenMismatch(_))
        ));

        template
            .apply_substitutions(&values(&[("{{NAME}}", "Alice")]))
            .unwrap();
        assert_eq!(template.subject, "Hi Alice");
    }

    #[test]
    fn test_render_leaves_template_untouched() {
        let template = welcome_template();
        let rendered = template
            .render(&values(&[("{{NAME}}", "Bob"), ("{{CODE}}", "7")]))
            .unwrap();

        assert_eq!(rendered.template_id, "tmpl-1");
        assert_eq!(rendered.subject, "Hi Bob");
        assert_eq!(template.subject, "Hi {{NAME}}");
    }
}
