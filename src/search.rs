use crate::catalog::AnimationCatalog;

/// State behind the animation search modal. Drawing is the renderer's job;
/// this tracks the query, the filtered snapshot, and the keyboard cursor.
#[derive(Default)]
pub struct SearchPanel {
    open: bool,
    query: String,
    results: Vec<String>,
    cursor: Option<usize>,
}

impl SearchPanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Opens with a cleared query and a fresh full-catalog view.
    pub fn open(&mut self, catalog: &AnimationCatalog) {
        self.open = true;
        self.query.clear();
        self.refresh(catalog);
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self, catalog: &AnimationCatalog) {
        if self.open {
            self.close();
        } else {
            self.open(catalog);
        }
    }

    /// Re-runs the current query against the catalog, keeping the cursor on
    /// the first result. Called after catalog reloads as well.
    pub fn refresh(&mut self, catalog: &AnimationCatalog) {
        self.results = catalog.filter(&self.query);
        self.cursor = if self.results.is_empty() { None } else { Some(0) };
    }

    pub fn set_query(&mut self, catalog: &AnimationCatalog, query: impl Into<String>) {
        self.query = query.into();
        self.refresh(catalog);
    }

    /// Moves the keyboard cursor with wraparound and returns the newly
    /// selected name so the caller can auto-select it.
    pub fn move_cursor(&mut self, direction: i32) -> Option<&str> {
        if self.results.is_empty() {
            self.cursor = None;
            return None;
        }
        let count = self.results.len() as i64;
        let current = self.cursor.unwrap_or(0) as i64;
        let next = (current + direction as i64).rem_euclid(count) as usize;
        self.cursor = Some(next);
        self.results.get(next).map(|name| name.as_str())
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.cursor.and_then(|index| self.results.get(index)).map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::FixedSource;

    fn catalog() -> AnimationCatalog {
        let source =
            FixedSource { preferred: vec!["Walk", "Run", "Jump", "Idle"], fallback: Vec::new() };
        let mut catalog = AnimationCatalog::new();
        catalog.load(&source, "preferred", "fallback");
        catalog
    }

    #[test]
    fn open_resets_query_and_cursor() {
        let catalog = catalog();
        let mut panel = SearchPanel::default();
        panel.open(&catalog);
        panel.set_query(&catalog, "ju");
        assert_eq!(panel.results(), ["Jump"]);
        panel.close();
        panel.open(&catalog);
        assert_eq!(panel.query(), "");
        assert_eq!(panel.result_count(), 4);
        assert_eq!(panel.cursor(), Some(0));
    }

    #[test]
    fn cursor_wraps_and_reports_selection() {
        let catalog = catalog();
        let mut panel = SearchPanel::default();
        panel.open(&catalog);
        assert_eq!(panel.move_cursor(-1), Some("Idle"), "wraps backward to the last result");
        assert_eq!(panel.move_cursor(1), Some("Walk"), "wraps forward to the first result");
    }

    #[test]
    fn empty_result_set_clears_cursor() {
        let catalog = catalog();
        let mut panel = SearchPanel::default();
        panel.open(&catalog);
        panel.set_query(&catalog, "zzz");
        assert!(panel.results().is_empty());
        assert_eq!(panel.cursor(), None);
        assert_eq!(panel.move_cursor(1), None);
    }
}
