/// Catalog filter for listing beers.
///
/// Both filters are case-insensitive substring matches; absent or blank
/// filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeerFilter {
    /// Filter by beer name containment.
    pub name: Option<String>,

    /// Filter by beer style containment.
    pub style: Option<String>,
}

impl BeerFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name filter.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the style filter.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Returns the name filter if it has any text.
    pub fn name_text(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Returns the style filter if it has any text.
    pub fn style_text(&self) -> Option<&str> {
        non_blank(self.style.as_deref())
    }

    /// SQL `LIKE` pattern for the name filter (`%` when absent).
    pub(crate) fn name_pattern(&self) -> String {
        like_pattern(self.name_text())
    }

    /// SQL `LIKE` pattern for the style filter (`%` when absent).
    pub(crate) fn style_pattern(&self) -> String {
        like_pattern(self.style_text())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn like_pattern(value: Option<&str>) -> String {
    match value {
        Some(v) => {
            let escaped = v
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        }
        None => "%".to_string(),
    }
}
