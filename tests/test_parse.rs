use rstest::rstest;

use xtree::{Builder, Dom, Error, XmlBuilder};

#[rstest]
#[case(r#"<root><a>1</a><b>2</b></root>"#)]
#[case(r#"<foo:root xmlns:foo="http://example.com"><foo:a>1</foo:a><foo:b>2</foo:b></foo:root>"#)]
#[case(r#"<root xmlns:foo="http://example.com"><a>1</a><foo:b>2</foo:b></root>"#)]
#[case(r#"<root xmlns="http://example.com"><a/></root>"#)]
#[case(r#"<root a="1" b="2"/>"#)]
#[case(r#"<root><!--comment--><?target data?></root>"#)]
#[case(r#"<!--before--><root/><!--after-->"#)]
#[case(r#"<root>&lt;&amp;&gt;</root>"#)]
#[case(r#"<root a="&quot;&lt;&amp;"/>"#)]
#[case(r#"<!DOCTYPE root PUBLIC "-//Example//EN" "root.dtd"><root/>"#)]
fn test_roundtrip(#[case] xml: &str) {
    let mut dom = Dom::new();
    let root = dom.parse_str(xml).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), xml);
}

#[test]
fn test_character_references() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<a>&#65;&#x42;&apos;</a>").unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<a>AB'</a>");
}

#[test]
fn test_cdata_becomes_text() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<a>x<![CDATA[<y>]]>z</a>").unwrap();
    let a = dom.document_element(root).unwrap();
    assert_eq!(dom.children(a).count(), 1);
    assert_eq!(dom.text_content(a).unwrap(), "x<y>z");
}

#[test]
fn test_attribute_whitespace_normalized() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<a x='1\n2\t3'/>").unwrap();
    let a = dom.document_element(root).unwrap();
    assert_eq!(dom.get_attribute(a, "x"), Some("1 2 3"));
}

#[test]
fn test_internal_subset_kept() {
    let mut dom = Dom::new();
    let xml = r#"<!DOCTYPE a [<!ATTLIST a id ID #IMPLIED>]><a id="x"/>"#;
    let root = dom.parse_str(xml).unwrap();
    let doctype = dom.first_child(root).unwrap();
    assert_eq!(
        dom.doctype(doctype).unwrap().internal_subset(),
        Some("<!ATTLIST a id ID #IMPLIED>")
    );
    let a = dom.document_element(root).unwrap();
    let id = dom.name("id").unwrap();
    assert!(dom.element(a).unwrap().is_id_attribute(id));
}

#[test]
fn test_xml_id_is_id_typed() {
    let mut dom = Dom::new();
    let root = dom.parse_str(r#"<a xml:id=" x "/>"#).unwrap();
    let a = dom.document_element(root).unwrap();
    let ids = dom.element(a).unwrap().ids().collect::<Vec<_>>();
    assert_eq!(ids, vec![" x "]);
}

#[test]
fn test_base_uri_recorded() {
    let mut dom = Dom::new();
    let root = dom
        .parse_bytes(b"<a/>", Some("http://example.com/a.xml"))
        .unwrap();
    assert_eq!(
        dom.document(root).unwrap().base_uri(),
        Some("http://example.com/a.xml")
    );
}

#[test]
fn test_parse_utf16_with_bom() {
    let bytes = "\u{feff}<a>h\u{e9}</a>"
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect::<Vec<_>>();
    let mut dom = Dom::new();
    let root = dom.parse_bytes(&bytes, None).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<a>h\u{e9}</a>");
}

#[test]
fn test_parse_utf8_with_bom() {
    let mut dom = Dom::new();
    let root = dom.parse_bytes(b"\xef\xbb\xbf<a/>", None).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<a/>");
}

#[test]
fn test_parse_declared_latin1() {
    let mut dom = Dom::new();
    let root = XmlBuilder::new()
        .build(
            &mut dom,
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>\xe9</a>",
            None,
        )
        .unwrap();
    let a = dom.document_element(root).unwrap();
    assert_eq!(dom.text_content(a).unwrap(), "\u{e9}");
}

#[test]
fn test_parse_unsupported_encoding() {
    let mut dom = Dom::new();
    let err = dom
        .parse_bytes(b"<?xml version=\"1.0\" encoding=\"klingon\"?><a/>", None)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedEncoding(label) if label == "klingon"));
}

#[rstest]
#[case("<a><b></a>")]
#[case("<a>")]
#[case("<a/><b/>")]
#[case("text<a/>")]
#[case("<a>&unknown;</a>")]
#[case("<a>&#0;</a>")]
#[case("<p:a/>")]
#[case(r#"<a x="1" x="2"/>"#)]
#[case("")]
fn test_parse_errors(#[case] xml: &str) {
    let mut dom = Dom::new();
    assert!(dom.parse_str(xml).is_err());
}

#[test]
fn test_parse_error_kinds() {
    let mut dom = Dom::new();
    assert!(matches!(
        dom.parse_str("<a></b>"),
        Err(Error::InvalidCloseTag(open, close)) if open == "a" && close == "b"
    ));
    assert!(matches!(
        dom.parse_str("<p:a/>"),
        Err(Error::UnknownPrefix(prefix)) if prefix == "p"
    ));
    assert!(matches!(
        dom.parse_str("<a/><b/>"),
        Err(Error::DocumentElement)
    ));
}
