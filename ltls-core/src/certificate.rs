//! Server certificate handling.
//!
//! The client does not validate chains; it only needs the RSA public key
//! of the leaf certificate for RSA key transport.
//!
//! ```text
//! Certificate ::= SEQUENCE {
//!     tbsCertificate       SEQUENCE {
//!         version          [0] EXPLICIT INTEGER OPTIONAL,
//!         serialNumber     INTEGER,
//!         signature        AlgorithmIdentifier,
//!         issuer           Name,
//!         validity         Validity,
//!         subject          Name,
//!         subjectPublicKeyInfo SEQUENCE {
//!             algorithm        SEQUENCE { OBJECT IDENTIFIER, parameters },
//!             subjectPublicKey BIT STRING  -- RSAPublicKey ::= SEQUENCE { n, e }
//!         },
//!         ...
//!     },
//!     signatureAlgorithm   AlgorithmIdentifier,
//!     signatureValue       BIT STRING
//! }
//! ```

use ltls_crypto::RsaPublicKey;
use tracing::trace;

use crate::asn1::{self, tag, Node};
use crate::error::{Error, ProtocolError, Result};

/// DER content octets of the rsaEncryption OID (1.2.840.113549.1.1.1).
pub const RSA_ENCRYPTION_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

/// Locate subjectPublicKeyInfo inside a decoded certificate.
///
/// Index 6 of tbsCertificate when the optional `[0]` version is present,
/// index 5 otherwise.
fn subject_public_key_info(certificate: &Node) -> Result<&Node> {
    let tbs = certificate
        .expect(tag::SEQUENCE)?
        .child(0)?
        .expect(tag::SEQUENCE)?;
    let index = if tbs.child(0)?.is_context(0) { 6 } else { 5 };
    tbs.child(index)?.expect(tag::SEQUENCE)
}

/// Extract the RSA public key from a DER-encoded X.509 certificate.
///
/// Fails with `unsupported_certificate` when the key is not rsaEncryption
/// and with an ASN.1 error when the structure is malformed.
pub fn extract_rsa_public_key(der: &[u8]) -> Result<RsaPublicKey> {
    let certificate = asn1::parse(der)?;
    let spki = subject_public_key_info(&certificate)?;

    let algorithm = spki.child(0)?.expect(tag::SEQUENCE)?;
    let oid = algorithm.child(0)?.expect(tag::OBJECT_IDENTIFIER)?.bytes()?;
    if oid != RSA_ENCRYPTION_OID {
        trace!(oid = ?oid, "certificate key is not rsaEncryption");
        return Err(Error::ProtocolError(ProtocolError::UnsupportedCertificate));
    }

    let key_bits = spki.child(1)?.as_bit_string()?;
    let rsa_key = asn1::parse(key_bits)?;
    let rsa_key = rsa_key.expect(tag::SEQUENCE)?;
    let modulus = rsa_key.child(0)?.as_unsigned_integer()?;
    let exponent = rsa_key.child(1)?.as_unsigned_integer()?;

    let key = RsaPublicKey::new(modulus, exponent);
    if key.modulus.is_empty() || key.exponent.is_empty() {
        return Err(Error::Asn1Error("RSA key component is zero".into()));
    }
    trace!(modulus_bits = key.size() * 8, "extracted RSA public key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        match content.len() {
            len @ 0..=0x7F => out.push(len as u8),
            len @ 0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
            len => out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]),
        }
        out.extend_from_slice(content);
        out
    }

    fn certificate(with_version: bool, oid: &[u8], modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
        let mut n = vec![0x00];
        n.extend_from_slice(modulus);
        let rsa_key = tlv(0x30, &[tlv(0x02, &n), tlv(0x02, exponent)].concat());
        let mut bits = vec![0x00];
        bits.extend_from_slice(&rsa_key);

        let algorithm = tlv(0x30, &[tlv(0x06, oid), tlv(0x05, &[])].concat());
        let spki = tlv(0x30, &[algorithm.clone(), tlv(0x03, &bits)].concat());
        let name = tlv(0x30, &tlv(0x31, &tlv(0x30, &[tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x0C, b"test")].concat())));
        let validity = tlv(
            0x30,
            &[tlv(0x17, b"200101000000Z"), tlv(0x17, b"300101000000Z")].concat(),
        );

        let mut tbs = Vec::new();
        if with_version {
            tbs.extend(tlv(0xA0, &tlv(0x02, &[0x02])));
        }
        tbs.extend(tlv(0x02, &[0x01]));
        tbs.extend(algorithm.clone());
        tbs.extend(name.clone());
        tbs.extend(validity);
        tbs.extend(name);
        tbs.extend(spki);

        tlv(
            0x30,
            &[tlv(0x30, &tbs), algorithm, tlv(0x03, &[0x00, 0xAB, 0xCD])].concat(),
        )
    }

    #[test]
    fn test_extract_rsa_key_v3() {
        let modulus = [0xC5u8; 128];
        let der = certificate(true, &RSA_ENCRYPTION_OID, &modulus, &[0x01, 0x00, 0x01]);
        let key = extract_rsa_public_key(&der).unwrap();
        assert_eq!(key.modulus, modulus.to_vec());
        assert_eq!(key.exponent, vec![0x01, 0x00, 0x01]);
        assert_eq!(key.size(), 128);
    }

    #[test]
    fn test_extract_rsa_key_without_version() {
        let modulus = [0x9Au8; 64];
        let der = certificate(false, &RSA_ENCRYPTION_OID, &modulus, &[0x03]);
        let key = extract_rsa_public_key(&der).unwrap();
        assert_eq!(key.modulus, modulus.to_vec());
        assert_eq!(key.exponent, vec![0x03]);
    }

    #[test]
    fn test_non_rsa_key_unsupported() {
        // id-ecPublicKey
        let oid = [0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
        let der = certificate(true, &oid, &[0x04; 65], &[0x01]);
        assert_eq!(
            extract_rsa_public_key(&der),
            Err(Error::ProtocolError(ProtocolError::UnsupportedCertificate))
        );
    }

    #[test]
    fn test_malformed_certificate() {
        assert!(matches!(extract_rsa_public_key(&[]), Err(Error::Asn1Error(_))));
        assert!(matches!(
            extract_rsa_public_key(&[0x30, 0x03, 0x02, 0x01, 0x01]),
            Err(Error::Asn1Error(_))
        ));

        let mut der = certificate(true, &RSA_ENCRYPTION_OID, &[0xC5; 64], &[0x03]);
        der.truncate(der.len() - 10);
        assert!(extract_rsa_public_key(&der).is_err());
    }
}
