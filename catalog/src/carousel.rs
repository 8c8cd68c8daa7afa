/// Number of target characters shown side by side.
pub const DEFAULT_TARGETS_PER_PAGE: usize = 3;

/// Paging window over the target characters of the active clip.
///
/// Navigation cycles in both directions. The page size never changes while
/// the explorer runs; only the page index and the number of targets do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    page: usize,
    page_size: usize,
}

impl Default for Carousel {
    fn default() -> Self {
        Self::new(DEFAULT_TARGETS_PER_PAGE)
    }
}

impl Carousel {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(target_count / page_size)`, never less than one page.
    pub fn total_pages(&self, target_count: usize) -> usize {
        target_count.div_ceil(self.page_size).max(1)
    }

    pub fn next(&mut self, target_count: usize) {
        let total = self.total_pages(target_count);
        self.page = (self.page + 1) % total;
    }

    pub fn previous(&mut self, target_count: usize) {
        let total = self.total_pages(target_count);
        self.page = (self.page + total - 1) % total;
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Range of target indices visible on the current page.
    pub fn visible_range(&self, target_count: usize) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(target_count);
        let end = (start + self.page_size).min(target_count);
        start..end
    }

    pub fn window<'a, T>(&self, targets: &'a [T]) -> &'a [T] {
        &targets[self.visible_range(targets.len())]
    }

    /// One-based `"page / total"` label shown between the arrows.
    pub fn label(&self, target_count: usize) -> String {
        format!("{} / {}", self.page + 1, self.total_pages(target_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGETS: [&str; 9] = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];

    #[test]
    fn nine_targets_split_into_three_pages() {
        let mut carousel = Carousel::new(3);
        assert_eq!(carousel.total_pages(TARGETS.len()), 3);
        assert_eq!(carousel.window(&TARGETS), &["a", "b", "c"]);

        carousel.next(TARGETS.len());
        assert_eq!(carousel.window(&TARGETS), &["d", "e", "f"]);
        carousel.next(TARGETS.len());
        carousel.next(TARGETS.len());
        assert_eq!(carousel.page(), 0);
    }

    #[test]
    fn previous_from_first_page_wraps_to_last() {
        let mut carousel = Carousel::new(3);
        carousel.previous(TARGETS.len());
        assert_eq!(carousel.page(), 2);
        assert_eq!(carousel.window(&TARGETS), &["g", "h", "i"]);
        assert_eq!(carousel.label(TARGETS.len()), "3 / 3");
    }

    #[test]
    fn partial_last_page_is_clipped() {
        let mut carousel = Carousel::new(4);
        carousel.previous(TARGETS.len());
        assert_eq!(carousel.window(&TARGETS), &["i"]);
    }

    #[test]
    fn empty_target_list_has_single_empty_page() {
        let mut carousel = Carousel::new(3);
        let empty: [&str; 0] = [];
        assert_eq!(carousel.total_pages(0), 1);
        carousel.next(0);
        assert_eq!(carousel.page(), 0);
        assert!(carousel.window(&empty).is_empty());
    }
}
