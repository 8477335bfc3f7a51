const DEFAULT_CHARS_PER_PAGE: usize = 280;

/// Splits annotation text into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    chars_per_page: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
        }
    }
}

impl PageLayout {
    pub fn new(chars_per_page: usize) -> Self {
        Self {
            chars_per_page: chars_per_page.max(1),
        }
    }

    pub fn chars_per_page(&self) -> usize {
        self.chars_per_page
    }

    /// Number of pages `text` occupies. Empty text still has one page.
    pub fn page_count(&self, text: &str) -> usize {
        let chars = text.chars().count();
        chars.div_ceil(self.chars_per_page).max(1)
    }

    /// The text shown on 1-based `page`, clamped to the last page.
    pub fn page<'a>(&self, text: &'a str, page: usize) -> &'a str {
        let page = self.clamp(text, page);
        let skip = (page - 1) * self.chars_per_page;
        let start = byte_offset(text, skip);
        let end = byte_offset(text, skip + self.chars_per_page);
        &text[start..end]
    }

    pub fn clamp(&self, text: &str, page: usize) -> usize {
        page.clamp(1, self.page_count(text))
    }

    pub fn next(&self, text: &str, page: usize) -> usize {
        self.clamp(text, page + 1)
    }

    pub fn prev(&self, text: &str, page: usize) -> usize {
        self.clamp(text, page.saturating_sub(1))
    }

    /// Indicator text, only shown when there is more than one page.
    pub fn label(&self, text: &str, page: usize) -> Option<String> {
        (self.page_count(text) > 1).then(|| format!("Page {}", self.clamp(text, page)))
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}
