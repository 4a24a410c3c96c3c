use crate::dimension::{PageMargins, PageSize};
use serde::{Deserialize, Serialize};

/// Document-wide settings handed to a sink when it is opened.
///
/// Built from defaults, the template's root attributes and caller options;
/// never changed once the sink is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub page_size: PageSize,
    pub margins: PageMargins,
    /// Stylesheet URLs linked from HTML output.
    pub stylesheets: Vec<String>,
    /// Script URLs linked from HTML output.
    pub scripts: Vec<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

impl DocumentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width and height of the area inside the margins.
    pub fn content_size(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions_pt();
        (
            (w - self.margins.left - self.margins.right).max(0.0),
            (h - self.margins.top - self.margins.bottom).max(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_size_subtracts_margins() {
        let config = DocumentConfig {
            page_size: "a5".parse().unwrap(),
            margins: "10,20,30,40".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(config.page_size.dimensions_pt(), (420.0, 595.0));
        assert_eq!(config.content_size(), (390.0, 525.0));
    }
}
