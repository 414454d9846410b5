//! Envelope codec: payload encoding and the gateway's signature scheme.
//!
//! The wire unit is `{data, signature}` where `data` is base64(JSON(payload))
//! and `signature` is base64(SHA1(private_key || data || private_key)). The
//! digest choice and concatenation order are fixed by the gateway and must
//! not change.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::error::EpointError;
use crate::types::Payload;

/// A signed payload as it travels in a request body or a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: String,
    pub signature: String,
}

impl Envelope {
    /// Encode `payload` and sign it with `private_key`.
    pub fn seal<T: Serialize + ?Sized>(payload: &T, private_key: &str) -> Result<Self, EpointError> {
        let data = encode(payload)?;
        let signature = sign(&data, private_key);
        Ok(Self { data, signature })
    }

    /// Verify the signature and decode the payload.
    pub fn open(&self, private_key: &str) -> Result<Payload, EpointError> {
        if !verify(&self.data, &self.signature, private_key) {
            return Err(EpointError::SignatureVerification);
        }
        decode(&self.data)
    }
}

/// Serialize `payload` to JSON and base64-encode it.
///
/// Key order is whatever the payload carries; nothing is canonicalized here.
pub fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<String, EpointError> {
    let json = serde_json::to_vec(payload).map_err(|e| EpointError::Encoding(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Base64-decode `data` and parse it as a JSON object.
pub fn decode(data: &str) -> Result<Payload, EpointError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| EpointError::Decoding(format!("invalid base64: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(EpointError::Decoding(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(EpointError::Decoding(format!("invalid JSON: {e}"))),
    }
}

/// Compute the gateway signature for an encoded payload.
pub fn sign(data: &str, private_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(private_key.as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(private_key.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Check `signature` against the one derived from `data`.
///
/// Comparison is constant-time over the signature bytes.
pub fn verify(data: &str, signature: &str, private_key: &str) -> bool {
    let expected = sign(data, private_key);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn encode_is_base64_of_compact_json() {
        let p = payload(json!({"test": "data"}));
        assert_eq!(encode(&p).unwrap(), "eyJ0ZXN0IjoiZGF0YSJ9");
    }

    #[test]
    fn encode_keeps_insertion_order() {
        let mut p = Payload::new();
        p.insert("public_key".into(), json!("i000000001"));
        p.insert("amount".into(), json!(100.5));
        p.insert("order_id".into(), json!("ORDER-123"));
        assert_eq!(
            encode(&p).unwrap(),
            "eyJwdWJsaWNfa2V5IjoiaTAwMDAwMDAwMSIsImFtb3VudCI6MTAwLjUsIm9yZGVyX2lkIjoiT1JERVItMTIzIn0="
        );
    }

    #[test]
    fn encode_rejects_unserializable_values() {
        struct Opaque;
        impl Serialize for Opaque {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("unsupported type"))
            }
        }
        let err = encode(&Opaque).unwrap_err();
        assert!(matches!(err, EpointError::Encoding(msg) if msg.contains("unsupported type")));
    }

    #[test]
    fn decode_inverts_encode() {
        let p = payload(json!({"key": "value", "number": 123, "nested": {"a": [1, 2]}}));
        let decoded = decode(&encode(&p).unwrap()).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err = decode("not*base64").unwrap_err();
        assert!(matches!(err, EpointError::Decoding(_)));
    }

    #[test]
    fn decode_rejects_bad_json() {
        let data = STANDARD.encode("{not json");
        assert!(matches!(decode(&data), Err(EpointError::Decoding(_))));
    }

    #[test]
    fn decode_rejects_non_object_json() {
        let data = STANDARD.encode("[1,2,3]");
        assert!(matches!(decode(&data), Err(EpointError::Decoding(_))));
    }

    #[test]
    fn sign_matches_known_vectors() {
        assert_eq!(
            sign("eyJ0ZXN0IjoiZGF0YSJ9", "private-key"),
            "hT8vZp+7m0ScbLCnEZd8DqktsAc="
        );
        assert_eq!(sign("abc", "k"), "tbVgIzQpR27v2Yj1vCS6kM4b2x8=");
        assert_eq!(sign("", ""), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn verify_accepts_own_signature() {
        let data = "eyJzdGF0dXMiOiJzdWNjZXNzIn0=";
        let sig = sign(data, "secret");
        assert!(verify(data, &sig, "secret"));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let data = "eyJzdGF0dXMiOiJzdWNjZXNzIn0=";
        let sig = sign(data, "secret-1");
        assert!(!verify(data, &sig, "secret-2"));
    }

    #[test]
    fn verify_rejects_single_bit_flips() {
        let data = "eyJzdGF0dXMiOiJzdWNjZXNzIiwidHJhbnNhY3Rpb24iOiJ0ZTAwMSJ9";
        let sig = sign(data, "test-private-key");

        for i in 0..data.len() {
            let mut bytes = data.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!verify(&tampered, &sig, "test-private-key"), "data bit {i}");
        }
        for i in 0..sig.len() {
            let mut bytes = sig.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!verify(data, &tampered, "test-private-key"), "signature bit {i}");
        }
    }

    #[test]
    fn envelope_seal_matches_known_vector() {
        let p = payload(json!({"status": "success", "transaction": "te001"}));
        let envelope = Envelope::seal(&p, "test-private-key").unwrap();
        assert_eq!(
            envelope.data,
            "eyJzdGF0dXMiOiJzdWNjZXNzIiwidHJhbnNhY3Rpb24iOiJ0ZTAwMSJ9"
        );
        assert_eq!(envelope.signature, "AvXS8rCMUwhsB0zMoVTaEnm0MjE=");
        assert_eq!(envelope.open("test-private-key").unwrap(), p);
    }

    #[test]
    fn envelope_open_rejects_wrong_key() {
        let envelope = Envelope::seal(&payload(json!({"a": 1})), "one").unwrap();
        assert!(matches!(
            envelope.open("two"),
            Err(EpointError::SignatureVerification)
        ));
    }

    #[test]
    fn verify_rejects_garbage_signature() {
        assert!(!verify("eyJ0ZXN0IjoiZGF0YSJ9", "invalid-signature", "private-key"));
        assert!(!verify("eyJ0ZXN0IjoiZGF0YSJ9", "", "private-key"));
    }
}
