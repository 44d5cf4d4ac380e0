//! Parsing of submitted text into a chat or image request.

/// Prefix that turns a submission into an image request.
pub const IMAGE_DIRECTIVE: &str = "/imagine ";

/// What a submission asks the model for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Chat(String),
    Image(String),
}

impl Directive {
    /// Parse trimmed submission text.
    ///
    /// An image directive with nothing after the marker is ordinary chat.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_prefix(IMAGE_DIRECTIVE).map(str::trim) {
            Some(prompt) if !prompt.is_empty() => Directive::Image(prompt.to_string()),
            _ => Directive::Chat(text.to_string()),
        }
    }

    /// Build the submission text for an image prompt.
    pub fn image_prompt(prompt: &str) -> String {
        format!("{}{}", IMAGE_DIRECTIVE, prompt.trim())
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Directive::Image(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        assert_eq!(Directive::parse("  Hello  "), Directive::Chat("Hello".to_string()));
    }

    #[test]
    fn test_parse_image() {
        assert_eq!(
            Directive::parse("/imagine a cat"),
            Directive::Image("a cat".to_string())
        );
        assert_eq!(
            Directive::parse("  /imagine   a red fox "),
            Directive::Image("a red fox".to_string())
        );
    }

    #[test]
    fn test_empty_image_prompt_is_chat() {
        assert_eq!(
            Directive::parse("/imagine    "),
            Directive::Chat("/imagine".to_string())
        );
        assert!(!Directive::parse("/imagine").is_image());
    }

    #[test]
    fn test_marker_must_lead() {
        assert!(!Directive::parse("please /imagine a cat").is_image());
        assert!(!Directive::parse("/imaginea cat").is_image());
    }

    #[test]
    fn test_image_prompt_round_trips() {
        let text = Directive::image_prompt("  a cat ");
        assert_eq!(text, "/imagine a cat");
        assert_eq!(Directive::parse(&text), Directive::Image("a cat".to_string()));
    }
}
