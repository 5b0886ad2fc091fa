//! Generic XML-to-mapping decoder shared by the XML providers.
//!
//! Provider responses are decoded into an [`XmlMap`]: an ordered mapping of
//! element names to either their text or a nested mapping of their children.
//! Sibling elements sharing a name are coalesced into an [`XmlNode::List`].

use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Serialize;
use thiserror::Error;

/// Failure to decode a response body as XML
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The markup could not be tokenized
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),

    /// Text content could not be unescaped
    #[error("malformed XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// The document ended while elements were still open
    #[error("unexpected end of document inside <{0}>")]
    Unclosed(String),

    /// The document contains no root element
    #[error("document has no root element")]
    NoRoot,
}

/// A decoded element value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XmlNode {
    /// Element with non-whitespace text
    Text(String),
    /// Element whose children were decoded
    Map(XmlMap),
    /// Repeated sibling elements, in document order
    List(Vec<XmlNode>),
}

impl XmlNode {
    /// The text of this node, if it is a text node
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The nested mapping of this node, if it is a mapping node
    pub fn as_map(&self) -> Option<&XmlMap> {
        match self {
            XmlNode::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Ordered mapping of element names to decoded values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct XmlMap {
    entries: Vec<(String, XmlNode)>,
}

impl XmlMap {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&XmlNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a nested mapping by key
    pub fn get_map(&self, key: &str) -> Option<&XmlMap> {
        self.get(key).and_then(XmlNode::as_map)
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value, coalescing repeated keys into a list
    pub fn insert(&mut self, key: String, value: XmlNode) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, XmlNode::List(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, XmlNode::List(Vec::new()));
                *existing = XmlNode::List(vec![first, value]);
            }
            None => self.entries.push((key, value)),
        }
    }
}

/// An element still being read
struct Frame {
    key: String,
    text: String,
    children: XmlMap,
    seen_child: bool,
}

impl Frame {
    fn new(key: String) -> Self {
        Self {
            key,
            text: String::new(),
            children: XmlMap::new(),
            seen_child: false,
        }
    }

    fn into_node(self) -> (String, XmlNode) {
        let node = if self.text.trim().is_empty() {
            XmlNode::Map(self.children)
        } else {
            XmlNode::Text(self.text)
        };
        (self.key, node)
    }
}

fn element_key(decoder: Decoder, raw: &[u8], fold_case: bool) -> Result<String, DecodeError> {
    let key = decoder.decode(raw).map_err(quick_xml::Error::from)?;
    Ok(if fold_case {
        key.to_lowercase()
    } else {
        key.into_owned()
    })
}

/// Decode an XML document into a mapping of the root element's children.
///
/// Namespace prefixes are stripped from element names; with `fold_case` the
/// names are also lowercased. Only the text preceding an element's first
/// child counts as its text. Text is transcoded from the encoding named by
/// the XML declaration or byte order mark, UTF-8 when there is none.
pub fn decode(bytes: &[u8], fold_case: bool) -> Result<XmlMap, DecodeError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    // The bottom frame stands for the root element
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<XmlMap> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.seen_child = true;
                }
                let key = element_key(reader.decoder(), e.local_name().as_ref(), fold_case)?;
                stack.push(Frame::new(key));
            }
            Event::Empty(e) => {
                let key = element_key(reader.decoder(), e.local_name().as_ref(), fold_case)?;
                match stack.last_mut() {
                    Some(parent) => {
                        parent.seen_child = true;
                        parent.children.insert(key, XmlNode::Map(XmlMap::new()));
                    }
                    None if root.is_none() => root = Some(XmlMap::new()),
                    None => {}
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    if !frame.seen_child {
                        frame.text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    if !frame.seen_child {
                        let text = reader.decoder().decode(&e).map_err(quick_xml::Error::from)?;
                        frame.text.push_str(&text);
                    }
                }
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => {
                            let (key, node) = frame.into_node();
                            parent.children.insert(key, node);
                        }
                        None => {
                            if root.is_none() {
                                root = Some(frame.children);
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(frame) = stack.pop() {
        return Err(DecodeError::Unclosed(frame.key));
    }
    root.ok_or(DecodeError::NoRoot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<QRZDatabase version="1.34" xmlns="http://xmldata.qrz.com">
  <Callsign>
    <call>W1AW</call>
    <dxcc>291</dxcc>
    <attn>JOSEPH P CARCIA III</attn>
    <name>ARRL HQ OPERATORS CLUB</name>
    <addr1>225 MAIN ST</addr1>
    <addr2>NEWINGTON</addr2>
    <MSA>3280</MSA>
    <AreaCode>860</AreaCode>
    <TimeZone>Eastern</TimeZone>
    <GMTOffset>-5</GMTOffset>
  </Callsign>
  <Session>
    <Key>xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx</Key>
    <Count>3543</Count>
    <SubExp>Fri Oct 15 17:21:54 2021</SubExp>
    <GMTime>Wed Apr 28 02:24:54 2021</GMTime>
    <Remark>cpu: 0.041s</Remark>
  </Session>
</QRZDatabase>"#;

    fn text<'a>(map: &'a XmlMap, key: &str) -> Option<&'a str> {
        map.get(key).and_then(XmlNode::as_text)
    }

    #[test]
    fn test_preserves_key_case() {
        let data = decode(SAMPLE.as_bytes(), false).unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["Callsign", "Session"]);

        let call = data.get_map("Callsign").unwrap();
        assert_eq!(text(call, "call"), Some("W1AW"));
        assert_eq!(text(call, "AreaCode"), Some("860"));
        assert_eq!(text(call, "GMTOffset"), Some("-5"));

        let session = data.get_map("Session").unwrap();
        assert_eq!(text(session, "Remark"), Some("cpu: 0.041s"));
    }

    #[test]
    fn test_fold_case_lowercases_keys_only() {
        let exact = decode(SAMPLE.as_bytes(), false).unwrap();
        let folded = decode(SAMPLE.as_bytes(), true).unwrap();

        assert_eq!(folded.keys().collect::<Vec<_>>(), vec!["callsign", "session"]);
        let exact_call = exact.get_map("Callsign").unwrap();
        let folded_call = folded.get_map("callsign").unwrap();
        assert_eq!(exact_call.len(), folded_call.len());
        for ((k1, v1), (k2, v2)) in exact_call.iter().zip(folded_call.iter()) {
            assert_eq!(k1.to_lowercase(), k2);
            assert_eq!(v1, v2);
        }
    }

    #[test]
    fn test_repeated_siblings_become_list() {
        let xml = b"<root><a>1</a><b>x</b><a>2</a><a><c>3</c></a></root>";
        let data = decode(xml, false).unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let mut nested = XmlMap::new();
        nested.insert("c".to_string(), XmlNode::Text("3".to_string()));
        assert_eq!(
            data.get("a"),
            Some(&XmlNode::List(vec![
                XmlNode::Text("1".to_string()),
                XmlNode::Text("2".to_string()),
                XmlNode::Map(nested),
            ]))
        );
    }

    #[test]
    fn test_namespace_prefix_stripped() {
        let xml = br#"<h:HamQTH xmlns:h="urn:x"><h:search><h:callsign>OK1RR</h:callsign></h:search></h:HamQTH>"#;
        let data = decode(xml, false).unwrap();
        let search = data.get_map("search").unwrap();
        assert_eq!(text(search, "callsign"), Some("OK1RR"));
    }

    #[test]
    fn test_empty_elements_and_entities() {
        let xml = b"<root><empty/><blank>   </blank><amp>A &amp; B</amp></root>";
        let data = decode(xml, false).unwrap();
        assert_eq!(data.get("empty"), Some(&XmlNode::Map(XmlMap::new())));
        assert_eq!(data.get("blank"), Some(&XmlNode::Map(XmlMap::new())));
        assert_eq!(text(&data, "amp"), Some("A & B"));
    }

    #[test]
    fn test_declared_encoding_is_honoured() {
        let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r><a>Jos\xE9</a><b><![CDATA[Andr\xE9]]></b></r>";
        let data = decode(xml, false).unwrap();
        assert_eq!(text(&data, "a"), Some("Jos\u{e9}"));
        assert_eq!(text(&data, "b"), Some("Andr\u{e9}"));

        let bom = b"\xEF\xBB\xBF<r><a>Jos\xC3\xA9</a></r>";
        let data = decode(bom, false).unwrap();
        assert_eq!(text(&data, "a"), Some("Jos\u{e9}"));
    }

    #[test]
    fn test_len_and_is_empty() {
        let data = decode(b"<r><a>1</a><a>2</a><b/></r>", false).unwrap();
        assert_eq!(data.len(), 2);
        assert!(!data.is_empty());
        assert!(decode(b"<r/>", false).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert!(decode(b"<root><a>1</b></root>", false).is_err());
        assert!(decode(b"<root><a>1</a>", false).is_err());
        assert!(matches!(decode(b"", false), Err(DecodeError::NoRoot)));
    }
}
