use crate::dom::{Dom, Node};
use crate::xinclude::error::ErrorKind;

/// Namespace of the include and fallback elements.
pub const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

const INCLUDE: &str = "include";
const FALLBACK: &str = "fallback";

pub(crate) fn is_include(dom: &Dom, node: Node) -> bool {
    dom.has_name(node, XINCLUDE_NAMESPACE, INCLUDE)
}

pub(crate) fn is_fallback(dom: &Dom, node: Node) -> bool {
    dom.has_name(node, XINCLUDE_NAMESPACE, FALLBACK)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseMode {
    Xml,
    Text,
}

/// The validated attributes and fallback of an include element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Directive {
    pub(crate) href: Option<String>,
    pub(crate) xpointer: Option<String>,
    pub(crate) parse: ParseMode,
    pub(crate) encoding: Option<String>,
    pub(crate) accept: Option<String>,
    pub(crate) accept_language: Option<String>,
    pub(crate) fallback: Option<Node>,
}

impl Directive {
    /// Read and check an include element. Nothing is fetched.
    pub(crate) fn read(dom: &Dom, include: Node) -> Result<Directive, ErrorKind> {
        let mut fallback = None;
        for child in dom.element_children(include) {
            if dom.namespace_uri(child) != Some(XINCLUDE_NAMESPACE) {
                continue;
            }
            if !is_fallback(dom, child) {
                let local = dom.local_name(child).unwrap_or_default();
                return Err(ErrorKind::IllegalChild(local.to_string()));
            }
            if fallback.replace(child).is_some() {
                return Err(ErrorKind::MultipleFallbacks);
            }
        }

        let attribute = |name| dom.get_attribute(include, name).map(str::to_string);
        let href = attribute("href").filter(|href| !href.is_empty());
        let xpointer = attribute("xpointer");
        let parse = match attribute("parse").as_deref() {
            None | Some("xml") => ParseMode::Xml,
            Some("text") => ParseMode::Text,
            Some(other) => return Err(ErrorKind::BadParseAttribute(other.to_string())),
        };
        if href.is_none() && xpointer.is_none() {
            return Err(ErrorKind::NoIncludeLocation);
        }
        if xpointer.is_some() && parse == ParseMode::Text {
            return Err(ErrorKind::XPointerWithText);
        }
        if let Some(href) = &href {
            if href.contains('#') {
                return Err(ErrorKind::BadHrefAttribute(href.clone()));
            }
        }
        let accept = attribute("accept");
        let accept_language = attribute("accept-language");
        check_header("accept", accept.as_deref())?;
        check_header("accept-language", accept_language.as_deref())?;

        Ok(Directive {
            href,
            xpointer,
            parse,
            encoding: attribute("encoding"),
            accept,
            accept_language,
            fallback,
        })
    }
}

fn check_header(name: &'static str, value: Option<&str>) -> Result<(), ErrorKind> {
    match value {
        Some(value) if !value.bytes().all(|b| (0x20..=0x7E).contains(&b)) => {
            Err(ErrorKind::BadHttpHeader(name))
        }
        _ => Ok(()),
    }
}
