use axum::response::Html;
use handlebars::html_escape as escape;

/// Link rendered on a simple-index page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlListItem {
    pub name: String,
    pub url: String,
}

impl HtmlListItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Renders a page made of a flat list of anchors, the layout PEP 503 expects.
#[derive(Clone, Debug, Default)]
pub struct HtmlListRenderer {
    title: Option<String>,
    items: Vec<HtmlListItem>,
}

impl HtmlListRenderer {
    pub fn new(title: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            items: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn items(&self) -> &[HtmlListItem] {
        &self.items
    }

    pub fn add_item(mut self, item: HtmlListItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_items(mut self, items: impl IntoIterator<Item = HtmlListItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn build_head(&self) -> String {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .map(|title| format!("<title>{}</title>", escape(title)))
            .unwrap_or_default()
    }

    pub fn build_body(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("<a href='{}'>{}</a>", escape(&item.url), escape(&item.name)))
            .collect()
    }

    pub fn build_html(&self) -> String {
        format!(
            "<!DOCTYPE html><html lang='en'><head>{}</head><body>{}</body></html>",
            self.build_head(),
            self.build_body()
        )
    }

    pub fn render(&self) -> Html<String> {
        Html(self.build_html())
    }
}
