//! Viewport geometry reported by screens.

/// Scroll position of a list viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Height of the visible area.
    pub viewport_height: f64,
    /// Total height of the rendered content.
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn new(offset: f64, viewport_height: f64, content_height: f64) -> Self {
        Self {
            offset,
            viewport_height,
            content_height,
        }
    }

    /// Pixels between the bottom of the viewport and the end of the content.
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content_height - self.offset - self.viewport_height).max(0.0)
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.distance_to_bottom() <= threshold
    }
}

/// How the next page gets requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Scrolling near the bottom fetches the next page.
    Auto,
    /// The screen must show an explicit "load more" control.
    Manual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_bottom_within_threshold() {
        let metrics = ScrollMetrics::new(1500.0, 800.0, 2500.0);
        assert_eq!(metrics.distance_to_bottom(), 200.0);
        assert!(metrics.is_near_bottom(300.0));
        assert!(!metrics.is_near_bottom(100.0));
    }

    #[test]
    fn short_content_counts_as_bottom() {
        let metrics = ScrollMetrics::new(0.0, 800.0, 300.0);
        assert_eq!(metrics.distance_to_bottom(), 0.0);
        assert!(metrics.is_near_bottom(0.0));
    }
}
