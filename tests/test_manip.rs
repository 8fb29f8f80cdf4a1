use xtree::{Dom, Error};

#[test]
fn test_append_element() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc><a/></doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let b = dom.add_name("b");
    let node = dom.new_element(b);
    dom.append(doc, node).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<doc><a/><b/></doc>");
}

#[test]
fn test_append_text_consolidates() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc>Alpha</doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    dom.append_text(doc, "Beta").unwrap();
    assert_eq!(dom.children(doc).count(), 1);
    assert_eq!(dom.to_string(root).unwrap(), "<doc>AlphaBeta</doc>");
}

#[test]
fn test_prepend_text_consolidates() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc>Beta</doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let text = dom.new_text("Alpha");
    dom.prepend(doc, text).unwrap();
    assert_eq!(dom.children(doc).count(), 1);
    assert_eq!(dom.to_string(root).unwrap(), "<doc>AlphaBeta</doc>");
}

#[test]
fn test_remove_merges_text() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc>Alpha<a/>Beta</doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let a = dom.element_children(doc).next().unwrap();
    dom.remove(a).unwrap();
    assert_eq!(dom.children(doc).count(), 1);
    assert_eq!(dom.to_string(root).unwrap(), "<doc>AlphaBeta</doc>");
}

#[test]
fn test_detach_keeps_subtree() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc><a><b/></a></doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let a = dom.first_child(doc).unwrap();
    dom.detach(a).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<doc/>");
    assert_eq!(dom.to_string(a).unwrap(), "<a><b/></a>");
    assert_eq!(dom.parent(a), None);
}

#[test]
fn test_insert_before_and_after() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc><b/></doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let b = dom.first_child(doc).unwrap();
    let a_name = dom.add_name("a");
    let c_name = dom.add_name("c");
    let a = dom.new_element(a_name);
    let c = dom.new_element(c_name);
    dom.insert_before(b, a).unwrap();
    dom.insert_after(b, c).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<doc><a/><b/><c/></doc>");
}

#[test]
fn test_move_node() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc><a><x/></a><b/></doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let a = dom.first_child(doc).unwrap();
    let x = dom.first_child(a).unwrap();
    let b = dom.last_child(doc).unwrap();
    dom.append(b, x).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<doc><a/><b><x/></b></doc>");
}

#[test]
fn test_replace_text_merges() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc>Alpha<a/>Gamma</doc>").unwrap();
    let doc = dom.document_element(root).unwrap();
    let a = dom.element_children(doc).next().unwrap();
    let text = dom.new_text("Beta");
    dom.replace(a, text).unwrap();
    assert_eq!(dom.children(doc).count(), 1);
    assert_eq!(dom.to_string(root).unwrap(), "<doc>AlphaBetaGamma</doc>");
}

#[test]
fn test_remove_document_element_rejected() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc/>").unwrap();
    let doc = dom.document_element(root).unwrap();
    assert!(matches!(dom.remove(doc), Err(Error::InvalidOperation(_))));
}

#[test]
fn test_text_under_root_rejected() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc/>").unwrap();
    let text = dom.new_text("text");
    assert!(matches!(dom.append(root, text), Err(Error::InvalidOperation(_))));
}

#[test]
fn test_comment_under_root_allowed() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<doc/>").unwrap();
    let comment = dom.new_comment("c");
    dom.prepend(root, comment).unwrap();
    assert_eq!(dom.to_string(root).unwrap(), "<!--c--><doc/>");
}

#[test]
fn test_clone_into_other_document() {
    let mut dom = Dom::new();
    let first = dom.parse_str("<a><b>text</b></a>").unwrap();
    let second = dom.parse_str("<c/>").unwrap();
    let b = dom.first_child(dom.document_element(first).unwrap()).unwrap();
    let copy = dom.clone_node(b);
    let c = dom.document_element(second).unwrap();
    dom.append(c, copy).unwrap();
    assert_eq!(dom.to_string(first).unwrap(), "<a><b>text</b></a>");
    assert_eq!(dom.to_string(second).unwrap(), "<c><b>text</b></c>");
    assert_eq!(dom.root(copy), second);
}

#[test]
fn test_discard_document() {
    let mut dom = Dom::new();
    let root = dom.parse_str("<a/>").unwrap();
    let a = dom.document_element(root).unwrap();
    dom.discard(root).unwrap();
    assert!(dom.is_removed(a));
}
