//! Minimal BER/DER decoder.
//!
//! Just enough ASN.1 to walk an X.509 certificate down to its
//! subjectPublicKeyInfo. Every element becomes a [`Node`]; constructed
//! elements are decoded recursively into children, primitive elements keep
//! their content octets.
//!
//! ```text
//! identifier octets      length octets            contents
//! ┌──┬─┬─────┐ [more]   ┌─┬───────┐ [more]
//! │cl│c│ tag │ ...      │L│ len   │ ...           ...
//! └──┴─┴─────┘          └─┴───────┘
//!  cl = class, c = constructed, tag 31 = high-tag-number form
//!  L = 0 short form, L = 1 long form (0x81..0x84), 0x80 = indefinite
//! ```
//!
//! Indefinite lengths are rejected; DER never uses them.

use crate::error::{Error, Result};

/// Maximum nesting depth accepted by the decoder.
const MAX_DEPTH: usize = 32;

/// Universal tag names, indexed by tag number (X.680 Section 8.4).
pub const UNIVERSAL_TAG_NAMES: [&str; 31] = [
    "END-OF-CONTENTS",
    "BOOLEAN",
    "INTEGER",
    "BIT STRING",
    "OCTET STRING",
    "NULL",
    "OBJECT IDENTIFIER",
    "ObjectDescriptor",
    "EXTERNAL",
    "REAL",
    "ENUMERATED",
    "EMBEDDED PDV",
    "UTF8String",
    "RELATIVE-OID",
    "TIME",
    "RESERVED",
    "SEQUENCE",
    "SET",
    "NumericString",
    "PrintableString",
    "T61String",
    "VideotexString",
    "IA5String",
    "UTCTime",
    "GeneralizedTime",
    "GraphicString",
    "VisibleString",
    "GeneralString",
    "UniversalString",
    "CHARACTER STRING",
    "BMPString",
];

/// Universal tag numbers used by the certificate walker.
pub mod tag {
    /// INTEGER
    pub const INTEGER: u32 = 2;
    /// BIT STRING
    pub const BIT_STRING: u32 = 3;
    /// OCTET STRING
    pub const OCTET_STRING: u32 = 4;
    /// NULL
    pub const NULL: u32 = 5;
    /// OBJECT IDENTIFIER
    pub const OBJECT_IDENTIFIER: u32 = 6;
    /// SEQUENCE / SEQUENCE OF
    pub const SEQUENCE: u32 = 16;
    /// SET / SET OF
    pub const SET: u32 = 17;
}

/// Tag class from the top two identifier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal (00)
    Universal,
    /// Application (01)
    Application,
    /// Context-specific (10)
    ContextSpecific,
    /// Private (11)
    Private,
}

impl TagClass {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }
}

/// Decoded element contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Content octets of a primitive element
    Primitive(Vec<u8>),
    /// Children of a constructed element
    Constructed(Vec<Node>),
}

/// One decoded TLV element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Tag class
    pub class: TagClass,
    /// Constructed bit
    pub constructed: bool,
    /// Tag number
    pub tag: u32,
    /// Offset of the identifier octet in the outermost input
    pub offset: usize,
    /// Identifier plus length octets
    pub header_length: usize,
    /// Content length
    pub length: usize,
    /// Contents
    pub content: Content,
}

impl Node {
    /// Symbolic tag name: the universal name, or `[n]` for other classes.
    pub fn tag_name(&self) -> String {
        match self.class {
            TagClass::Universal => UNIVERSAL_TAG_NAMES
                .get(self.tag as usize)
                .map(|name| (*name).to_string())
                .unwrap_or_else(|| format!("UNIVERSAL {}", self.tag)),
            TagClass::ContextSpecific => format!("[{}]", self.tag),
            TagClass::Application => format!("[APPLICATION {}]", self.tag),
            TagClass::Private => format!("[PRIVATE {}]", self.tag),
        }
    }

    /// True if this is the universal element `tag`.
    pub fn is_universal(&self, tag: u32) -> bool {
        self.class == TagClass::Universal && self.tag == tag
    }

    /// True if this is context-specific `[tag]`.
    pub fn is_context(&self, tag: u32) -> bool {
        self.class == TagClass::ContextSpecific && self.tag == tag
    }

    /// Children of a constructed element (empty for primitives).
    pub fn children(&self) -> &[Node] {
        match &self.content {
            Content::Constructed(children) => children,
            Content::Primitive(_) => &[],
        }
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Result<&Node> {
        self.children().get(index).ok_or_else(|| {
            Error::Asn1Error(format!(
                "{} at offset {} has no child {}",
                self.tag_name(),
                self.offset,
                index
            ))
        })
    }

    /// Follow a fixed sequence of child indices.
    pub fn find_path(&self, path: &[usize]) -> Result<&Node> {
        path.iter().try_fold(self, |node, &index| node.child(index))
    }

    /// Content octets of a primitive element.
    pub fn bytes(&self) -> Result<&[u8]> {
        match &self.content {
            Content::Primitive(bytes) => Ok(bytes),
            Content::Constructed(_) => Err(Error::Asn1Error(format!(
                "{} at offset {} is constructed",
                self.tag_name(),
                self.offset
            ))),
        }
    }

    /// Check the element is the universal `tag`.
    pub fn expect(&self, tag: u32) -> Result<&Node> {
        if self.is_universal(tag) {
            Ok(self)
        } else {
            Err(Error::Asn1Error(format!(
                "expected {} at offset {}, found {}",
                UNIVERSAL_TAG_NAMES[tag as usize],
                self.offset,
                self.tag_name()
            )))
        }
    }

    /// Magnitude of a non-negative INTEGER, sign octet removed.
    pub fn as_unsigned_integer(&self) -> Result<&[u8]> {
        let bytes = self.expect(tag::INTEGER)?.bytes()?;
        match bytes {
            [] => Err(Error::Asn1Error("empty INTEGER".into())),
            [first, ..] if first & 0x80 != 0 => {
                Err(Error::Asn1Error("negative INTEGER".into()))
            },
            [0, rest @ ..] if !rest.is_empty() => Ok(rest),
            _ => Ok(bytes),
        }
    }

    /// Payload of a BIT STRING with no unused bits.
    pub fn as_bit_string(&self) -> Result<&[u8]> {
        let bytes = self.expect(tag::BIT_STRING)?.bytes()?;
        match bytes {
            [0, rest @ ..] => Ok(rest),
            [] => Err(Error::Asn1Error("empty BIT STRING".into())),
            [unused, ..] => Err(Error::Asn1Error(format!(
                "BIT STRING with {} unused bits",
                unused
            ))),
        }
    }
}

/// Decode the single element at the start of `data`.
///
/// Trailing bytes after the element are ignored.
pub fn parse(data: &[u8]) -> Result<Node> {
    let (node, _) = parse_element(data, 0, 0)?;
    Ok(node)
}

/// Decode every sibling element in `data`.
pub fn parse_all(data: &[u8]) -> Result<Vec<Node>> {
    parse_siblings(data, 0, 0)
}

fn parse_siblings(data: &[u8], base: usize, depth: usize) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (node, used) = parse_element(&data[pos..], base + pos, depth)?;
        pos += used;
        nodes.push(node);
    }
    Ok(nodes)
}

/// Returns the node and the total number of bytes it spans.
fn parse_element(data: &[u8], offset: usize, depth: usize) -> Result<(Node, usize)> {
    if depth > MAX_DEPTH {
        return Err(Error::Asn1Error("nesting too deep".into()));
    }

    let truncated = || Error::Asn1Error(format!("truncated element at offset {}", offset));

    let first = *data.first().ok_or_else(truncated)?;
    let class = TagClass::from_bits(first >> 6);
    let constructed = first & 0x20 != 0;
    let mut pos = 1;

    let mut tag = u32::from(first & 0x1F);
    if tag == 0x1F {
        // High-tag-number form: base-128, high bit marks continuation.
        tag = 0;
        loop {
            let b = *data.get(pos).ok_or_else(truncated)?;
            pos += 1;
            if pos > 5 {
                return Err(Error::Asn1Error("tag number too large".into()));
            }
            tag = (tag << 7) | u32::from(b & 0x7F);
            if b & 0x80 == 0 {
                break;
            }
        }
    }

    let len_byte = *data.get(pos).ok_or_else(truncated)?;
    pos += 1;
    let length = match len_byte {
        0x00..=0x7F => usize::from(len_byte),
        0x80 => {
            return Err(Error::Asn1Error(format!(
                "indefinite length at offset {}",
                offset
            )))
        },
        0x81..=0x84 => {
            let count = usize::from(len_byte & 0x7F);
            let octets = data.get(pos..pos + count).ok_or_else(truncated)?;
            pos += count;
            octets
                .iter()
                .fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
        },
        _ => {
            return Err(Error::Asn1Error(format!(
                "length field of {} octets at offset {}",
                len_byte & 0x7F,
                offset
            )))
        },
    };

    let header_length = pos;
    let body = data
        .get(header_length..header_length + length)
        .ok_or_else(truncated)?;

    let content = if constructed {
        Content::Constructed(parse_siblings(body, offset + header_length, depth + 1)?)
    } else {
        Content::Primitive(body.to_vec())
    };

    Ok((
        Node {
            class,
            constructed,
            tag,
            offset,
            header_length,
            length,
            content,
        },
        header_length + length,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_of_integer() {
        // SEQUENCE { INTEGER 65537 }
        let data = [0x30, 0x05, 0x02, 0x03, 0x01, 0x00, 0x01];
        let node = parse(&data).unwrap();

        assert!(node.is_universal(tag::SEQUENCE));
        assert!(node.constructed);
        assert_eq!(node.tag_name(), "SEQUENCE");
        assert_eq!(node.length, 5);
        assert_eq!(node.children().len(), 1);

        let int = node.child(0).unwrap();
        assert_eq!(int.tag_name(), "INTEGER");
        assert_eq!(int.offset, 2);
        assert_eq!(int.bytes().unwrap(), &[0x01, 0x00, 0x01]);
        assert_eq!(int.as_unsigned_integer().unwrap(), &[0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_long_form_length() {
        let mut data = vec![0x04, 0x81, 0x80];
        data.extend_from_slice(&[0xAB; 0x80]);
        let node = parse(&data).unwrap();
        assert_eq!(node.length, 128);
        assert_eq!(node.header_length, 3);

        let mut data = vec![0x04, 0x82, 0x01, 0x00];
        data.extend_from_slice(&[0xCD; 256]);
        assert_eq!(parse(&data).unwrap().bytes().unwrap().len(), 256);
    }

    #[test]
    fn test_indefinite_length_rejected() {
        let data = [0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00];
        assert!(matches!(parse(&data), Err(Error::Asn1Error(_))));
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&[0x30]).is_err());
        assert!(parse(&[0x30, 0x05, 0x02, 0x01]).is_err());
        assert!(parse(&[0x04, 0x82, 0x01]).is_err());
    }

    #[test]
    fn test_context_specific_keeps_number() {
        // [0] { INTEGER 2 }
        let data = [0xA0, 0x03, 0x02, 0x01, 0x02];
        let node = parse(&data).unwrap();
        assert_eq!(node.class, TagClass::ContextSpecific);
        assert!(node.is_context(0));
        assert_eq!(node.tag_name(), "[0]");
    }

    #[test]
    fn test_high_tag_number() {
        // [APPLICATION 200] primitive, 1 byte of content
        let data = [0x5F, 0x81, 0x48, 0x01, 0xFF];
        let node = parse(&data).unwrap();
        assert_eq!(node.class, TagClass::Application);
        assert_eq!(node.tag, 200);
        assert_eq!(node.header_length, 4);
    }

    #[test]
    fn test_unsigned_integer_strips_sign_octet() {
        let data = [0x02, 0x03, 0x00, 0xC1, 0x02];
        assert_eq!(parse(&data).unwrap().as_unsigned_integer().unwrap(), &[0xC1, 0x02]);

        let zero = [0x02, 0x01, 0x00];
        assert_eq!(parse(&zero).unwrap().as_unsigned_integer().unwrap(), &[0x00]);

        let negative = [0x02, 0x01, 0x80];
        assert!(parse(&negative).unwrap().as_unsigned_integer().is_err());
    }

    #[test]
    fn test_parse_all_and_find_path() {
        // SEQUENCE { SEQUENCE { NULL, BOOLEAN } }, OCTET STRING
        let data = [0x30, 0x06, 0x30, 0x04, 0x05, 0x00, 0x01, 0x00, 0x04, 0x01, 0x7F];
        let nodes = parse_all(&data).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].offset, 8);

        let boolean = nodes[0].find_path(&[0, 1]).unwrap();
        assert_eq!(boolean.tag_name(), "BOOLEAN");
        assert_eq!(boolean.offset, 6);
        assert!(nodes[0].find_path(&[0, 2]).is_err());
    }

    #[test]
    fn test_bit_string() {
        let data = [0x03, 0x03, 0x00, 0xAA, 0xBB];
        assert_eq!(parse(&data).unwrap().as_bit_string().unwrap(), &[0xAA, 0xBB]);

        let unused = [0x03, 0x02, 0x04, 0xF0];
        assert!(parse(&unused).unwrap().as_bit_string().is_err());
    }

    #[test]
    fn test_universal_tag_table() {
        assert_eq!(UNIVERSAL_TAG_NAMES[tag::OBJECT_IDENTIFIER as usize], "OBJECT IDENTIFIER");
        assert_eq!(UNIVERSAL_TAG_NAMES[tag::SET as usize], "SET");
        assert_eq!(UNIVERSAL_TAG_NAMES[23], "UTCTime");
    }
}
