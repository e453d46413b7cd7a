/// Minimal ANSI styling for human output.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(no_color: bool) -> Self {
        Self { enabled: !no_color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn error(&self, text: &str) -> String {
        self.paint("31", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_passes_text_through() {
        let style = Style::new(true);
        assert_eq!(style.error("boom"), "boom");
    }

    #[test]
    fn colored_output_wraps_with_escapes() {
        let style = Style::new(false);
        assert_eq!(style.error("boom"), "\x1b[31mboom\x1b[0m");
    }
}
