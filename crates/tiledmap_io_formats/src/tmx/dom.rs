//! A minimal element tree read with `quick-xml`.

use std::fmt::Display;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tiledmap_io_core::error::{FormatError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

fn xml_error(context: &str, err: impl Display) -> FormatError {
    FormatError::bad_structure(context, format!("invalid XML: {err}"))
}

impl Element {
    /// Parses a document and returns its root element.
    ///
    /// Text is kept verbatim, except whitespace between the children of an element.
    pub fn parse_document(text: &str, context: &str) -> Result<Element> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Self::open(&start, context)?),
                Ok(Event::Empty(start)) => {
                    let element = Self::open(&start, context)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::End(_)) => {
                    let Some(mut element) = stack.pop() else {
                        return Err(xml_error(context, "unbalanced end tag"));
                    };
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(element) = stack.last_mut() {
                        let text = text.unescape().map_err(|err| xml_error(context, err))?;
                        element.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(element) = stack.last_mut() {
                        element.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(xml_error(context, err)),
            }
        }

        if !stack.is_empty() {
            return Err(xml_error(context, "unexpected end of document"));
        }
        root.ok_or_else(|| xml_error(context, "the document has no root element"))
    }

    fn open(start: &BytesStart, context: &str) -> Result<Element> {
        let mut element = Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| xml_error(context, err))?;
            let value = attribute
                .unescape_value()
                .map_err(|err| xml_error(context, err))?;
            element.attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(element)
    }

    pub fn context(&self) -> String {
        match self.attr("name") {
            Some(name) if !name.is_empty() => format!("<{}> '{name}'", self.name),
            _ => format!("<{}>", self.name),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attr(&self, name: &str) -> Result<&str> {
        self.attr(name)
            .ok_or_else(|| FormatError::missing_field(self.context(), name))
    }

    /// An attribute parsed as `T`, or `None` when it is absent.
    pub fn parse_attr<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.attr(name)
            .map(|value| {
                value.trim().parse().map_err(|_| {
                    FormatError::bad_structure(
                        self.context(),
                        format!("invalid value '{value}' for '{name}'"),
                    )
                })
            })
            .transpose()
    }

    pub fn required<T: FromStr>(&self, name: &str) -> Result<T> {
        self.parse_attr(name)?
            .ok_or_else(|| FormatError::missing_field(self.context(), name))
    }

    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.parse_attr(name)?.unwrap_or(default))
    }

    /// A TMX boolean, written as `0` or `1`.
    pub fn flag_or(&self, name: &str, default: bool) -> Result<bool> {
        match self.attr(name).map(str::trim) {
            None => Ok(default),
            Some("1") | Some("true") => Ok(true),
            Some("0") | Some("false") => Ok(false),
            Some(other) => Err(FormatError::bad_structure(
                self.context(),
                format!("invalid flag '{other}' for '{name}'"),
            )),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }
}
