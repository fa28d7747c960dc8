//! Property-based tests for the XML model and the renamer
//!
//! These tests use proptest to verify:
//! 1. Roundtrip property: parse(write(doc)) == doc
//! 2. Renaming replaces exactly the mapped names and nothing else
//! 3. A second rename with the same mapping changes nothing

use indexmap::IndexMap;
use proptest::prelude::*;
use xmlretag::{
    TagMapping, TagRenamer, XmlDocument, XmlElement, XmlNode, from_xml_str, rename, to_xml_string,
};

const NAMES: &[&str] = &["a", "b", "c", "item", "ns:tag", "x-y.z"];

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES).prop_map(str::to_string)
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>&\"'\n]{1,12}"
}

fn arb_leaf_node() -> impl Strategy<Value = XmlNode> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(XmlNode::CData),
        "[a-z ]{0,8}".prop_map(XmlNode::Comment),
        ("[a-z]{1,4}", "[a-z=\" ]{0,6}").prop_map(|(target, data)| {
            XmlNode::ProcessingInstruction {
                target: format!("p{target}"),
                data: data.trim_start().to_string(),
            }
        }),
    ]
}

fn arb_attributes() -> impl Strategy<Value = IndexMap<String, String>> {
    prop::collection::vec(("[a-z]{1,3}", "[a-zA-Z0-9 <>&\"']{0,8}"), 0..3)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn arb_element() -> impl Strategy<Value = XmlElement> {
    let leaf = (arb_name(), arb_attributes(), prop::option::of(arb_text())).prop_map(
        |(name, attributes, text)| XmlElement {
            name,
            attributes,
            children: text.into_iter().map(XmlNode::Text).collect(),
        },
    );

    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            arb_name(),
            arb_attributes(),
            prop::collection::vec(
                (
                    prop::option::of(arb_text()),
                    prop_oneof![
                        inner.prop_map(XmlNode::Element),
                        arb_leaf_node(),
                    ],
                ),
                0..4,
            ),
        )
            .prop_map(|(name, attributes, parts)| {
                // Text never sits next to text, so parsing cannot merge nodes.
                let mut children = Vec::new();
                for (text, node) in parts {
                    if let Some(text) = text {
                        children.push(XmlNode::Text(text));
                    }
                    children.push(node);
                }
                XmlElement {
                    name,
                    attributes,
                    children,
                }
            })
    })
}

fn arb_mapping() -> impl Strategy<Value = TagMapping> {
    prop::collection::vec((arb_name(), "[a-z]{1,6}"), 0..4).prop_map(|rules| {
        rules
            .into_iter()
            .map(|(old, new)| (old, format!("new-{new}")))
            .collect()
    })
}

fn names(element: &XmlElement, out: &mut Vec<String>) {
    out.push(element.name.clone());
    for child in element.elements() {
        names(child, out);
    }
}

fn strip_names(element: &XmlElement) -> XmlElement {
    XmlElement {
        name: String::new(),
        attributes: element.attributes.clone(),
        children: element
            .children
            .iter()
            .map(|node| match node {
                XmlNode::Element(child) => XmlNode::Element(strip_names(child)),
                other => other.clone(),
            })
            .collect(),
    }
}

proptest! {
    #[test]
    fn roundtrip_write_then_parse(root in arb_element()) {
        let doc = XmlDocument::new(root);
        let text = to_xml_string(&doc);
        let parsed = from_xml_str(&text);
        prop_assert_eq!(parsed, Ok(doc));
    }

    #[test]
    fn rename_maps_exactly_the_mapped_names(root in arb_element(), mapping in arb_mapping()) {
        let doc = XmlDocument::new(root);
        let renamed = rename(doc.clone(), &mapping);

        let mut before = Vec::new();
        let mut after = Vec::new();
        names(&doc.root, &mut before);
        names(&renamed.root, &mut after);

        let expected: Vec<String> = before
            .iter()
            .map(|name| mapping.get(name).unwrap_or(name).to_string())
            .collect();
        prop_assert_eq!(after, expected);
        prop_assert_eq!(strip_names(&renamed.root), strip_names(&doc.root));
    }

    #[test]
    fn rename_twice_is_rename_once(root in arb_element(), mapping in arb_mapping()) {
        let once = rename(XmlDocument::new(root), &mapping);
        let (twice, stats) = TagRenamer::new(&mapping).rename(once.clone());
        prop_assert_eq!(stats.renamed, 0);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn parser_never_panics(input in "\\PC{0,64}") {
        let _ = from_xml_str(&input);
    }
}
