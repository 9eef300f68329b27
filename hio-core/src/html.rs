//! Small DOM helpers on top of `scraper`
//!
//! The portal's markup is generated by JSF, so most lookups go through element
//! ids containing colons (which CSS id selectors cannot express) or through the
//! text of a sibling label.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Compile a selector that is known to be valid at compile time.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{}': {:?}", css, e))
}

static WITH_ID: LazyLock<Selector> = LazyLock::new(|| selector("[id]"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".labelWithBG.no_pointer"));
static LEGEND: LazyLock<Selector> = LazyLock::new(|| selector("legend"));

/// Normalise whitespace the way a browser renders it.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the element's direct text children only.
pub(crate) fn own_text(element: ElementRef<'_>) -> String {
    let raw: String = element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| text.to_string()))
        .collect();
    normalize(&raw)
}

/// Text of the element and all of its descendants.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    normalize(&element.text().collect::<String>())
}

pub(crate) fn find_by_id<'a>(scope: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    scope.select(&WITH_ID).find(|e| e.value().id() == Some(id))
}

/// All elements below `scope` whose id matches `pattern`, in document order.
pub(crate) fn find_by_id_pattern<'a>(
    scope: ElementRef<'a>,
    pattern: &'a Regex,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    scope
        .select(&WITH_ID)
        .filter(move |e| e.value().id().is_some_and(|id| pattern.is_match(id)))
}

pub(crate) fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

pub(crate) fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

pub(crate) fn first_element_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(element).next()
}

pub(crate) fn last_element_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(element).last()
}

pub(crate) fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

pub(crate) fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Extract the first capture group of `pattern` as a number.
pub(crate) fn capture_id(pattern: &Regex, haystack: &str) -> Option<u64> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Label/value pairs of a detail page section.
///
/// The portal renders every field as a label element followed by a sibling
/// holding the value. Duplicate labels resolve to the last occurrence.
pub struct Labels<'a> {
    labels: HashMap<String, ElementRef<'a>>,
}

impl<'a> Labels<'a> {
    pub fn collect(scope: ElementRef<'a>) -> Self {
        let labels = scope
            .select(&LABEL)
            .map(|label| (own_text(label), label))
            .collect();
        Self { labels }
    }

    /// Element holding the value for `label`
    pub fn value(&self, label: &str) -> Option<ElementRef<'a>> {
        self.labels.get(label).copied().and_then(next_element_sibling)
    }

    pub fn text(&self, label: &str) -> Option<String> {
        self.value(label).map(text)
    }
}

/// Own text of the container of the `legend` whose own text equals `label`.
pub(crate) fn description_text(scope: ElementRef<'_>, label: &str) -> Option<String> {
    scope
        .select(&LEGEND)
        .find(|legend| own_text(*legend) == label)
        .and_then(parent_element)
        .map(own_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_own_text_skips_children() {
        let html = Html::parse_fragment(r#"<div id="x">  Hello <b>bold</b>   world </div>"#);
        let div = find_by_id(html.root_element(), "x").unwrap();
        assert_eq!(own_text(div), "Hello world");
        assert_eq!(text(div), "Hello bold world");
    }

    #[test]
    fn test_find_by_id_with_colons() {
        let html = Html::parse_fragment(r#"<p><span id="a:b:c">found</span></p>"#);
        let span = find_by_id(html.root_element(), "a:b:c").unwrap();
        assert_eq!(own_text(span), "found");
        assert!(find_by_id(html.root_element(), "a:b").is_none());
    }

    #[test]
    fn test_labels_use_next_sibling() {
        let html = Html::parse_fragment(
            r#"<div>
                <label class="labelWithBG no_pointer">Kurztext</label><div>MA1</div>
                <label class="labelWithBG no_pointer">Langtext</label><div> Mathematik <i>1</i></div>
            </div>"#,
        );
        let labels = Labels::collect(html.root_element());
        assert_eq!(labels.text("Kurztext").as_deref(), Some("MA1"));
        assert_eq!(labels.text("Langtext").as_deref(), Some("Mathematik 1"));
        assert_eq!(labels.text("Nummer"), None);
    }

    #[test]
    fn test_description_text() {
        let html = Html::parse_fragment(
            r#"<fieldset><legend>Moduldauer</legend>1 Semester</fieldset>"#,
        );
        assert_eq!(
            description_text(html.root_element(), "Moduldauer").as_deref(),
            Some("1 Semester")
        );
    }

    #[test]
    fn test_capture_id() {
        let re = Regex::new(r"unitId=(\d+)").unwrap();
        assert_eq!(capture_id(&re, "/x?unitId=4711&periodId=3"), Some(4711));
        assert_eq!(capture_id(&re, "/x?periodId=3"), None);
    }
}
