//! Page-number window for pagination controls.

/// Number of page buttons shown by default.
pub const DEFAULT_MAX_PAGE_BUTTONS: usize = 10;

/// Page numbers to render as buttons.
///
/// Returns at most `max_visible` consecutive pages, roughly centred on
/// `current_page` and shifted to stay inside `1..=total_pages`.
pub fn page_numbers(current_page: usize, total_pages: usize, max_visible: usize) -> Vec<usize> {
    if total_pages == 0 || max_visible == 0 {
        return Vec::new();
    }

    let start = current_page.saturating_sub(max_visible / 2).max(1);
    let end = total_pages.min(start + max_visible - 1);
    let start = (end + 1).saturating_sub(max_visible).max(1);

    (start..=end).collect()
}
