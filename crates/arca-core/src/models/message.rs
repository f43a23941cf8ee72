use serde::{Deserialize, Serialize};

use crate::StorageBackend;

/// Queue message requesting thumbnail derivation for one stored original.
///
/// Deliberately carries no asset id: at publish time the metadata record may
/// not be visible yet, so the consumer resolves the owning record by storage
/// key instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRequest {
    pub key: String,
    pub content_type: String,
    pub storage_type: StorageBackend,
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_is_flat_camel_case() {
        let request = ProcessingRequest {
            key: "uuid-cat.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            storage_type: StorageBackend::S3,
            size: 12345,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["key"], "uuid-cat.jpg");
        assert_eq!(json["contentType"], "image/jpeg");
        assert_eq!(json["storageType"], "s3");
        assert_eq!(json["size"], 12345);

        let decoded: ProcessingRequest = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, request);
    }
}
