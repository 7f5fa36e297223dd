//! iCloud Drive API request and response types
//!
//! Data structures for the `drivews` (metadata) and `docws` (document)
//! web services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Item descriptor returned by `retrieveItemDetailsInFolders`.
///
/// Folder descriptors fetched directly carry their immediate children in
/// `items`; descriptors nested inside a listing do not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    /// Composite identifier (`KIND::zone::docid`)
    pub drivewsid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docwsid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Base name without extension; absent on the roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Raw kind (`FOLDER`, `FILE`, `APP_LIBRARY`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// Size in bytes (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_changed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_open_time: Option<String>,

    /// Version token required by mutations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Original location of a trashed item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_path: Option<String>,

    /// Per-descriptor status (`OK`, `ID_INVALID`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_items: Option<u64>,

    /// Immediate children, present only on directly fetched folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemDetails>>,

    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body element of `retrieveItemDetailsInFolders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetailsRequest<'a> {
    pub drivewsid: &'a str,
    pub partial_data: bool,
}

/// Reference to one item in a mutation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef<'a> {
    pub drivewsid: &'a str,
    pub etag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// Body of `putBackItemsFromTrash`, `deleteItems`, `moveItemsToTrash`, `renameItems`.
#[derive(Debug, Serialize)]
pub struct ItemsRequest<'a> {
    pub items: Vec<ItemRef<'a>>,
}

/// Body of `createFolders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoldersRequest<'a> {
    pub destination_drivews_id: &'a str,
    pub folders: Vec<NewFolder<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder<'a> {
    pub client_id: String,
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoldersResponse {
    #[serde(default)]
    pub folders: Vec<OperationItem>,
}

/// Raw result of a mutation, one entry per requested item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(default)]
    pub items: Vec<OperationItem>,
}

/// Per-item outcome of a mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivewsid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Success sentinel used in per-item statuses.
pub const STATUS_OK: &str = "OK";

impl OperationItem {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some(STATUS_OK)
    }
}

/// Response of `GET /ws/{zone}/download/by_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadTokenResponse {
    #[serde(default)]
    pub data_token: Option<DownloadToken>,

    /// Present instead of `data_token` for package documents
    #[serde(default)]
    pub package_token: Option<DownloadToken>,

    #[serde(default)]
    pub double_etag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadToken {
    pub url: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub signature: Option<String>,

    #[serde(default)]
    pub wrapping_key: Option<String>,

    #[serde(default)]
    pub reference_signature: Option<String>,
}

/// Short-lived signed location of a document's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub url: String,
    /// Expected length when known from the item descriptor
    pub size: Option<u64>,
}

/// Fully buffered body fetched from a signed URL.
#[derive(Debug, Clone)]
pub struct ContentBody {
    pub bytes: bytes::Bytes,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_folder_with_items() {
        let json = r#"{
            "drivewsid": "FOLDER::com.apple.CloudDocs::root",
            "docwsid": "root",
            "zone": "com.apple.CloudDocs",
            "type": "FOLDER",
            "dateCreated": "2019-05-08T21:05:32Z",
            "etag": "2ks",
            "status": "OK",
            "numberOfItems": 1,
            "assetQuota": 62418076,
            "items": [
                {
                    "drivewsid": "FOLDER::com.apple.CloudDocs::D5AA0425",
                    "name": "pyiCloud",
                    "type": "FOLDER",
                    "parentId": "FOLDER::com.apple.CloudDocs::root",
                    "etag": "2kt"
                }
            ]
        }"#;

        let details: ItemDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.drivewsid, "FOLDER::com.apple.CloudDocs::root");
        assert_eq!(details.name, None);
        assert_eq!(details.item_type.as_deref(), Some("FOLDER"));
        assert_eq!(details.extra.get("assetQuota"), Some(&Value::from(62418076)));

        let items = details.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name.as_deref(), Some("pyiCloud"));
        assert!(items[0].items.is_none());
    }

    #[test]
    fn test_deserialize_file_descriptor() {
        let json = r#"{
            "drivewsid": "FILE::com.apple.CloudDocs::33A41112",
            "docwsid": "33A41112",
            "zone": "com.apple.CloudDocs",
            "name": "Scanned document 1",
            "extension": "pdf",
            "type": "FILE",
            "size": 21644358,
            "dateChanged": "2020-05-03T00:16:17Z",
            "lastOpenTime": "2020-05-03T00:24:25Z"
        }"#;

        let details: ItemDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.size, Some(21644358));
        assert_eq!(details.extension.as_deref(), Some("pdf"));
        assert_eq!(details.last_open_time.as_deref(), Some("2020-05-03T00:24:25Z"));
    }

    #[test]
    fn test_serialize_mutation_body() {
        let body = ItemsRequest {
            items: vec![ItemRef {
                drivewsid: "FOLDER::com.apple.CloudDocs::1C7F1760",
                etag: "j9",
                client_id: None,
                name: None,
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": [{"drivewsid": "FOLDER::com.apple.CloudDocs::1C7F1760", "etag": "j9"}]})
        );

        let body = NodeDetailsRequest {
            drivewsid: "TRASH_ROOT",
            partial_data: false,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"drivewsid": "TRASH_ROOT", "partialData": false})
        );
    }

    #[test]
    fn test_deserialize_operation_result() {
        let json = r#"{"items": [{
            "drivewsid": "FOLDER::com.apple.CloudDocs::1C7F1760",
            "parentId": "FOLDER::com.apple.CloudDocs::root",
            "name": "test_random_uuid",
            "status": "OK",
            "isChainedToParent": true
        }]}"#;

        let result: OperationResult = serde_json::from_str(json).unwrap();
        assert!(result.items[0].is_ok());
        assert_eq!(
            result.items[0].parent_id.as_deref(),
            Some("FOLDER::com.apple.CloudDocs::root")
        );
        assert_eq!(
            result.items[0].extra.get("isChainedToParent"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_deserialize_download_token() {
        let json = r#"{
            "document_id": "33A41112",
            "data_token": {
                "url": "https://cvws.icloud-content.com/B/signed",
                "token": "AbC",
                "signature": "sig",
                "wrapping_key": "key"
            },
            "double_etag": "32::2x"
        }"#;

        let response: DownloadTokenResponse = serde_json::from_str(json).unwrap();
        let token = response.data_token.unwrap();
        assert_eq!(token.url, "https://cvws.icloud-content.com/B/signed");
        assert!(response.package_token.is_none());
    }
}
