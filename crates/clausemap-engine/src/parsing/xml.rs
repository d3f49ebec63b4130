//! Small helpers over `roxmltree` for WordprocessingML's namespaced elements.

use roxmltree::Node;

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const W14_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
pub(crate) const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

pub(crate) fn is_w(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(W_NS) && node.tag_name().name() == name
}

pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| is_w(*c, name))
}

pub(crate) fn children<'a, 'i>(
    node: Node<'a, 'i>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |c| is_w(*c, name))
}

pub(crate) fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

/// `w:val` of the named child element.
pub(crate) fn child_val<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|c| attr(c, "val"))
}

pub(crate) fn parse_num<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

/// OOXML on/off property: present without `w:val`, or with a truthy value.
pub(crate) fn on_off(node: Node<'_, '_>) -> bool {
    !matches!(attr(node, "val"), Some("0" | "false" | "off"))
}

/// Left indent of a `w:ind` element; `w:start` is the bidi-neutral alias.
pub(crate) fn indent_left(ppr: Node<'_, '_>) -> Option<i64> {
    let ind = child(ppr, "ind")?;
    parse_num(attr(ind, "left").or_else(|| attr(ind, "start")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_respect_namespace() {
        let xml = format!(
            r#"<w:pPr xmlns:w="{W_NS}" xmlns:x="urn:other"><x:ind w:left="5"/><w:ind w:left="720"/><w:keepNext/><w:bidi w:val="0"/></w:pPr>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert_eq!(indent_left(root), Some(720));
        assert!(on_off(child(root, "keepNext").unwrap()));
        assert!(!on_off(child(root, "bidi").unwrap()));
    }
}
