//! CBOR encoding used on the Ellipticoin wire
//!
//! Transaction return values and argument lists travel as base64 text wrapping
//! a CBOR value. A successful call returns `{"Ok": null}`; failures return
//! `{"Err": ...}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ciborium::Value;

use crate::error::{BridgeError, BridgeResult};

/// One positional argument of an Ellipticoin contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Bytes(Vec<u8>),
    Unsigned(u64),
}

impl Argument {
    pub fn to_value(&self) -> Value {
        match self {
            Argument::Bytes(bytes) => Value::Bytes(bytes.clone()),
            Argument::Unsigned(n) => Value::Integer((*n).into()),
        }
    }

    pub fn from_value(value: &Value) -> BridgeResult<Self> {
        match value {
            Value::Bytes(bytes) => Ok(Argument::Bytes(bytes.clone())),
            Value::Integer(n) => u64::try_from(*n)
                .map(Argument::Unsigned)
                .map_err(|_| BridgeError::invalid_arguments("integer argument is not a u64")),
            other => Err(BridgeError::invalid_arguments(format!(
                "unsupported argument type: {:?}",
                other
            ))),
        }
    }
}

/// Serialize a CBOR value to bytes
pub fn to_cbor(value: &Value) -> BridgeResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| BridgeError::SubmissionFailure(format!("CBOR encoding failed: {}", e)))?;
    Ok(buf)
}

/// CBOR bytes of `{"Ok": null}`
pub fn ok_marker() -> Vec<u8> {
    // a1 62 4f 6b f6
    vec![0xa1, 0x62, b'O', b'k', 0xf6]
}

/// True when a base64 return value is exactly the `{"Ok": null}` marker
pub fn is_success_marker(return_value: &str) -> bool {
    match STANDARD.decode(return_value.trim()) {
        Ok(bytes) => bytes == ok_marker(),
        Err(_) => false,
    }
}

/// Decode a base64-wrapped CBOR argument array
pub fn decode_arguments(encoded: &str) -> BridgeResult<Vec<Argument>> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| BridgeError::invalid_arguments(format!("arguments are not base64: {}", e)))?;

    let value: Value = ciborium::from_reader(bytes.as_slice())
        .map_err(|e| BridgeError::invalid_arguments(format!("arguments are not CBOR: {}", e)))?;

    match value {
        Value::Array(items) => items.iter().map(Argument::from_value).collect(),
        _ => Err(BridgeError::invalid_arguments("arguments are not an array")),
    }
}

/// Encode arguments as base64-wrapped CBOR (inverse of `decode_arguments`)
pub fn encode_arguments(arguments: &[Argument]) -> BridgeResult<String> {
    let value = Value::Array(arguments.iter().map(Argument::to_value).collect());
    Ok(STANDARD.encode(to_cbor(&value)?))
}

/// Encode a return value the way Ellipticoin reports it
pub fn encode_return_value(value: &Value) -> BridgeResult<String> {
    Ok(STANDARD.encode(to_cbor(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_marker_matches_ciborium_encoding() {
        let value = Value::Map(vec![(Value::Text("Ok".into()), Value::Null)]);
        assert_eq!(to_cbor(&value).unwrap(), ok_marker());
    }

    #[test]
    fn test_success_marker_detection() {
        assert!(is_success_marker("oWJPa/Y="));

        let err = Value::Map(vec![(
            Value::Text("Err".into()),
            Value::Text("insufficient balance".into()),
        )]);
        assert!(!is_success_marker(&encode_return_value(&err).unwrap()));

        let ok_with_payload = Value::Map(vec![(Value::Text("Ok".into()), Value::Integer(1.into()))]);
        assert!(!is_success_marker(&encode_return_value(&ok_with_payload).unwrap()));

        assert!(!is_success_marker(""));
        assert!(!is_success_marker("not base64!"));
    }

    #[test]
    fn test_decode_arguments() {
        let encoded = encode_arguments(&[
            Argument::Bytes(vec![0xaa; 20]),
            Argument::Bytes(vec![0xbb; 20]),
            Argument::Unsigned(2_500_000),
        ])
        .unwrap();

        let decoded = decode_arguments(&encoded).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], Argument::Bytes(vec![0xaa; 20]));
        assert_eq!(decoded[2], Argument::Unsigned(2_500_000));
    }

    #[test]
    fn test_decode_arguments_rejects_non_array() {
        let encoded = STANDARD.encode(to_cbor(&Value::Integer(7.into())).unwrap());
        assert!(matches!(
            decode_arguments(&encoded),
            Err(BridgeError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_decode_arguments_rejects_negative_integer() {
        let value = Value::Array(vec![Value::Integer((-1i64).into())]);
        let encoded = STANDARD.encode(to_cbor(&value).unwrap());
        assert!(decode_arguments(&encoded).is_err());
    }

    #[test]
    fn test_decode_arguments_rejects_garbage() {
        assert!(decode_arguments("%%%").is_err());
        assert!(decode_arguments(&STANDARD.encode([0xff, 0xff])).is_err());
    }
}
