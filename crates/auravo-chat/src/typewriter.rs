//! Incremental reveal of model replies.

use std::time::Duration;

/// Reveals text one character at a time with a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    delay: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::from_millis(10)
    }
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Successive prefixes of `text`, each one character longer.
    pub fn prefixes<'a>(&self, text: &'a str) -> Prefixes<'a> {
        Prefixes { text, end: 0 }
    }

    /// Hand `text` to `emit` one character at a time, sleeping in between.
    pub async fn play<F>(&self, text: &str, mut emit: F)
    where
        F: FnMut(&str),
    {
        let mut shown = 0;
        for prefix in self.prefixes(text) {
            emit(&prefix[shown..]);
            shown = prefix.len();
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

/// Iterator returned by [`Typewriter::prefixes`].
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    text: &'a str,
    end: usize,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.text[self.end..].chars().next()?;
        self.end += c.len_utf8();
        Some(&self.text[..self.end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_grow_by_one_char() {
        let prefixes: Vec<_> = Typewriter::default().prefixes("Hi!").collect();
        assert_eq!(prefixes, vec!["H", "Hi", "Hi!"]);
    }

    #[test]
    fn test_prefixes_respect_char_boundaries() {
        let prefixes: Vec<_> = Typewriter::default().prefixes("héé🙂").collect();
        assert_eq!(prefixes.len(), 4);
        assert_eq!(prefixes.last(), Some(&"héé🙂"));
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert_eq!(Typewriter::default().prefixes("").count(), 0);
    }

    #[tokio::test]
    async fn test_play_emits_whole_text() {
        let mut out = String::new();
        Typewriter::from_millis(0)
            .play("Hi there!", |chunk| out.push_str(chunk))
            .await;
        assert_eq!(out, "Hi there!");
    }

    #[test]
    fn test_default_delay() {
        assert_eq!(Typewriter::default().delay(), Duration::from_millis(10));
    }
}
