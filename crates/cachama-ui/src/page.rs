//! Persona-themed chat page.

use cachama_core::config::PersonaConfig;

/// Raw page template with `{{name}}` placeholders.
pub const PAGE_TEMPLATE: &str = include_str!("../assets/chat.html");

/// Fill the template for `persona`. Every substituted value is HTML-escaped.
///
/// The template is scanned once, so placeholder syntax inside a persona value
/// is emitted as text rather than expanded. Unknown placeholders are kept.
pub fn render_page(persona: &PersonaConfig) -> String {
    let mut page = String::with_capacity(PAGE_TEMPLATE.len() + 1024);
    let mut rest = PAGE_TEMPLATE;

    while let Some(open) = rest.find("{{") {
        page.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        let key = &after[..close];
        match placeholder_value(persona, key) {
            Some(value) => page.push_str(&value),
            None => page.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }
    page.push_str(rest);
    page
}

fn placeholder_value(persona: &PersonaConfig, key: &str) -> Option<String> {
    let theme = &persona.theme;
    let value = match key {
        "business_name" => escape_html(&persona.business_name),
        "tagline" => escape_html(&persona.tagline),
        "welcome_message" => escape_html(&persona.welcome_message).replace('\n', "<br>"),
        "input_placeholder" => escape_html(&persona.input_placeholder),
        "typing_indicator" => escape_html(&persona.typing_indicator),
        "connection_error" => escape_html(&persona.connection_error),
        "theme_primary" => escape_html(&theme.primary),
        "theme_primary_dark" => escape_html(&theme.primary_dark),
        "theme_background" => escape_html(&theme.background),
        "theme_text" => escape_html(&theme.text),
        "theme_user_bubble" => escape_html(&theme.user_bubble),
        _ => return None,
    };
    Some(value)
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_valid_html() {
        assert!(PAGE_TEMPLATE.starts_with("<!DOCTYPE html>"));
        assert!(PAGE_TEMPLATE.contains("</html>"));
        assert!(PAGE_TEMPLATE.contains("<style>"));
        assert!(PAGE_TEMPLATE.contains("<script>"));
    }

    #[test]
    fn default_page_has_no_placeholders_left() {
        let page = render_page(&PersonaConfig::default());
        assert!(!page.contains("{{"));
        assert!(page.contains("<title>La Cachamita de Oro</title>"));
        assert!(page.contains("En línea | Barinas"));
        assert!(page.contains("placeholder=\"Escribe un mensaje...\""));
        assert!(page.contains("#008069"));
    }

    #[test]
    fn welcome_message_keeps_line_breaks() {
        let page = render_page(&PersonaConfig::default());
        assert!(page.contains("Es un gusto saludarle.<br><br>Bienvenido"));
    }

    #[test]
    fn persona_values_are_escaped() {
        let persona = PersonaConfig {
            business_name: "<script>alert(1)</script>".to_string(),
            input_placeholder: "\" onfocus=\"x".to_string(),
            ..Default::default()
        };
        let page = render_page(&persona);
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("placeholder=\"&quot; onfocus=&quot;x\""));
    }

    #[test]
    fn theme_colors_applied() {
        let mut persona = PersonaConfig::default();
        persona.theme.primary = "#D4AF37".to_string();
        let page = render_page(&persona);
        assert!(page.contains("#D4AF37"));
    }

    #[test]
    fn placeholder_text_in_values_is_not_expanded() {
        let persona = PersonaConfig {
            business_name: "Casa {{tagline}}".to_string(),
            tagline: "SECRETO".to_string(),
            welcome_message: "Hola {{theme_primary}}".to_string(),
            ..Default::default()
        };
        let page = render_page(&persona);
        assert!(page.contains("<title>Casa {{tagline}}</title>"));
        assert!(page.contains("Hola {{theme_primary}}"));
        assert_eq!(page.matches("SECRETO").count(), PAGE_TEMPLATE.matches("{{tagline}}").count());
    }

    #[test]
    fn page_talks_to_chat_endpoint() {
        assert!(PAGE_TEMPLATE.contains("fetch('/api/chat'"));
        assert!(PAGE_TEMPLATE.contains("[DONE]"));
    }
}
