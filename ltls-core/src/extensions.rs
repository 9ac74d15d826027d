//! Hello extensions.
//!
//! The client sends at most one extension, `server_name` (RFC 6066
//! Section 3). Extensions in ServerHello are parsed for framing and
//! otherwise ignored.
//!
//! ```text
//! struct {
//!     ExtensionType extension_type;       -- u16
//!     opaque extension_data<0..2^16-1>;
//! } Extension;
//! ```

use crate::codec::{Emitter, Reader};
use crate::error::{Error, Result};

/// `server_name` extension type.
pub const SERVER_NAME: u16 = 0;

/// `host_name` entry type inside a server_name list.
const HOST_NAME: u8 = 0;

/// A raw hello extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type
    pub extension_type: u16,
    /// Extension data
    pub data: Vec<u8>,
}

impl Extension {
    /// Create an extension.
    pub fn new(extension_type: u16, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    /// Build a `server_name` extension carrying one host name.
    ///
    /// # Arguments
    /// * `host` - DNS host name, ASCII, no trailing dot
    pub fn server_name(host: &str) -> Result<Self> {
        if host.is_empty() || !host.is_ascii() {
            return Err(Error::InvalidConfig(format!(
                "server name {:?} is not an ASCII host name",
                host
            )));
        }

        let mut out = Emitter::new();
        let list = out.reserve(2);
        out.put_u8(HOST_NAME);
        out.put_vector(2, host.as_bytes())?;
        out.patch_length(list)?;

        Ok(Self::new(SERVER_NAME, out.into_vec()))
    }

    /// The host name of a `server_name` extension, if it has one.
    pub fn parse_server_name(&self) -> Result<Option<String>> {
        if self.extension_type != SERVER_NAME {
            return Ok(None);
        }
        // A server echoes an empty server_name to acknowledge SNI.
        if self.data.is_empty() {
            return Ok(None);
        }

        let mut reader = Reader::new(&self.data);
        let mut list = Reader::new(reader.read_vec16()?);
        reader.expect_empty("server_name extension")?;

        while !list.is_empty() {
            let name_type = list.read_u8()?;
            let name = list.read_vec16()?;
            if name_type == HOST_NAME {
                let host = std::str::from_utf8(name)
                    .map_err(|_| Error::InvalidMessage("server name is not UTF-8".into()))?;
                return Ok(Some(host.to_string()));
            }
        }
        Ok(None)
    }
}

/// Write an extensions block (`u16` total length, then each extension).
///
/// Nothing is written for an empty list, so a hello without extensions
/// keeps its pre-extension layout.
pub fn encode_extensions(out: &mut Emitter, extensions: &[Extension]) -> Result<()> {
    if extensions.is_empty() {
        return Ok(());
    }
    let block = out.reserve(2);
    for extension in extensions {
        out.put_u16(extension.extension_type);
        out.put_vector(2, &extension.data)?;
    }
    out.patch_length(block)
}

/// Read an optional extensions block from the end of a hello message.
pub fn decode_extensions(reader: &mut Reader<'_>) -> Result<Vec<Extension>> {
    if reader.is_empty() {
        return Ok(Vec::new());
    }

    let mut block = Reader::new(reader.read_vec16()?);
    let mut extensions = Vec::new();
    while !block.is_empty() {
        let extension_type = block.read_u16()?;
        let data = block.read_vec16()?.to_vec();
        extensions.push(Extension::new(extension_type, data));
    }
    Ok(extensions)
}
