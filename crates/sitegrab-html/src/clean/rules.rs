use sitegrab_tree::NodeId;

use super::{Locate, Located};
use crate::html::Html;
use crate::node::Element;

fn elements<'a>(html: &'a Html, from: NodeId) -> impl Iterator<Item = (NodeId, &'a Element)> + 'a {
    html.tree
        .descendants(from)
        .filter_map(move |id| html.element(id).map(|e| (id, e)))
}

/// Microdata layout: `itemprop="articleBody"` marks the body, `itemprop="name"` the title.
///
/// The first element in document order wins for each slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itemprop {
    pub body: String,
    pub title: String,
}

impl Default for Itemprop {
    fn default() -> Self {
        Self {
            body: "articleBody".into(),
            title: "name".into(),
        }
    }
}

impl Locate for Itemprop {
    fn locate(&self, html: &Html) -> Located {
        let mut located = Located::default();

        for (id, element) in elements(html, html.tree.root()) {
            match element.attr("itemprop") {
                Some(prop) if prop == self.body && located.body.is_none() => {
                    located.body = Some(id)
                }
                Some(prop) if prop == self.title && located.title.is_none() => {
                    located.title = Some(id)
                }
                _ => {}
            }
            if located.is_complete() {
                break;
            }
        }

        located
    }
}

/// Container layout: the first element having the `content` class is the body, the first
/// `h1` at or below it is the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentClass {
    pub class: String,
    pub heading: String,
}

impl Default for ContentClass {
    fn default() -> Self {
        Self {
            class: "content".into(),
            heading: "h1".into(),
        }
    }
}

impl Locate for ContentClass {
    fn locate(&self, html: &Html) -> Located {
        let body = elements(html, html.tree.root())
            .find(|(_, e)| e.has_class(&self.class))
            .map(|(id, _)| id);

        let title = body.and_then(|body| {
            elements(html, body)
                .find(|(_, e)| e.name() == self.heading)
                .map(|(id, _)| id)
        });

        Located { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(html: &Html, id: Option<NodeId>) -> Option<String> {
        id.map(|id| html.text(id))
    }

    #[test]
    fn itemprop_first_match_wins() {
        let html = Html::parse_document(
            r#"<h1 itemprop="name">First</h1>
            <div itemprop="articleBody">Body one</div>
            <h1 itemprop="name">Second</h1>
            <div itemprop="articleBody">Body two</div>"#,
        );
        let located = Itemprop::default().locate(&html);

        assert_eq!(Some("First".into()), text_of(&html, located.title));
        assert_eq!(Some("Body one".into()), text_of(&html, located.body));
    }

    #[test]
    fn itemprop_missing_title() {
        let html = Html::parse_document(r#"<div itemprop="articleBody">Body</div>"#);
        let located = Itemprop::default().locate(&html);

        assert!(located.title.is_none());
        assert!(located.body.is_some());
        assert!(!located.is_complete());
    }

    #[test]
    fn content_class_heading_inside_body() {
        let html = Html::parse_document(
            r#"<h1>Site name</h1>
            <div class="wrapper content"><h1>Headline</h1><p>Text</p></div>"#,
        );
        let located = ContentClass::default().locate(&html);

        assert_eq!(Some("Headline".into()), text_of(&html, located.title));
        assert_eq!(Some("HeadlineText".into()), text_of(&html, located.body));
    }

    #[test]
    fn content_class_without_container() {
        let html = Html::parse_document("<h1>Site name</h1><div class=\"contents\">x</div>");
        let located = ContentClass::default().locate(&html);

        assert_eq!(Located::default(), located);
    }
}
