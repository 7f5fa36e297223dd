//! Fixture iCloud web API shared by the integration tests.
//!
//! `FixtureHttpClient` answers `drivews` and `docws` requests with canned
//! responses shaped like real iCloud payloads and records every request so
//! tests can assert on round-trips.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::{Session, DOCWS_SERVICE, DRIVEWS_SERVICE};
use provider_icloud_drive::DriveService;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

pub const ROOT: &str = "FOLDER::com.apple.CloudDocs::root";
pub const PYICLOUD: &str = "FOLDER::com.apple.CloudDocs::D5AA0425-E84F-4501-AF5D-60F1D92648CF";
pub const TEST_FOLDER: &str = "FOLDER::com.apple.CloudDocs::1538E8E3-5D8A-4A49-9D0A-D13B7B9F5AE8";
pub const PREVIEW: &str = "FOLDER::com.apple.Preview::documents";
pub const SCANNED_DOC: &str = "33A41112-4131-4938-9691-7F356CE3C1B8";
pub const SCANNE_2_DOC: &str = "516C896C-6AA5-4A30-B30E-5502C2333DAE";
pub const RANDOM_UUID: &str = "FOLDER::com.apple.CloudDocs::1C7F1760-D940-480F-8C4F-005824A4E05B";
pub const FOREVER_AND_EVER: &str =
    "FOLDER::com.apple.CloudDocs::2BF8600B-5DCC-4421-805A-1C28D07197D5";
pub const FOREVER_PARENT: &str =
    "FOLDER::com.apple.CloudDocs::43D7C666-6E6E-4522-8999-0B519C3A1F4B";

/// Trashed folder whose recover and delete are refused with `ETAG_CONFLICT`.
pub const CONFLICTED: &str = "FOLDER::com.apple.CloudDocs::6B9E2C4D-3D7A-4F0E-A1B2-7C8D9E0F1A2B";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% scanned document fixture\n";

/// One recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct FixtureHttpClient {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FixtureHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path ends with `suffix`.
    pub fn count(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.path.ends_with(suffix))
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `drivewsid`s requested through `retrieveItemDetailsInFolders`, in order.
    pub fn detail_ids(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.path.ends_with("/retrieveItemDetailsInFolders"))
            .filter_map(|request| {
                request.body?[0]["drivewsid"]
                    .as_str()
                    .map(str::to_string)
            })
            .collect()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn route(&self, request: &HttpRequest) -> (u16, Vec<(String, String)>, Bytes) {
        let url = Url::parse(&request.url).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let body: Option<Value> = request
            .body
            .as_ref()
            .map(|body| serde_json::from_slice(body).unwrap());

        self.record(RecordedRequest {
            method: request.method,
            path: url.path().to_string(),
            body: body.clone(),
        });

        let host = url.host_str().unwrap_or_default();
        if host.ends_with("icloud-content.com") {
            return signed_content(url.path());
        }

        let authenticated = request
            .headers
            .get("Cookie")
            .is_some_and(|cookie| cookie.contains("X-APPLE-WEBAUTH-TOKEN"))
            && query.get("dsid").map(String::as_str) == Some("12345678901");
        if !authenticated {
            return (401, vec![], Bytes::from_static(b"Unauthorized"));
        }

        let reply = match (request.method, url.path()) {
            (HttpMethod::Post, "/retrieveItemDetailsInFolders") => {
                let body = body.unwrap_or_default();
                let id = body[0]["drivewsid"].as_str().unwrap_or_default();
                json!([details(id)])
            }
            (HttpMethod::Post, "/putBackItemsFromTrash") => {
                operation(&body.unwrap_or_default(), |_| ROOT)
            }
            (HttpMethod::Post, "/deleteItems") => {
                operation(&body.unwrap_or_default(), |_| FOREVER_PARENT)
            }
            (HttpMethod::Post, "/moveItemsToTrash") => {
                operation(&body.unwrap_or_default(), |_| "TRASH_ROOT")
            }
            (HttpMethod::Post, "/renameItems") => {
                let body = body.unwrap_or_default();
                let item = &body["items"][0];
                json!({"items": [{
                    "drivewsid": item["drivewsid"],
                    "etag": "3a",
                    "name": item["name"],
                    "status": "OK"
                }]})
            }
            (HttpMethod::Post, "/createFolders") => {
                let body = body.unwrap_or_default();
                let folder = &body["folders"][0];
                json!({
                    "destinationDrivewsId": body["destinationDrivewsId"],
                    "folders": [{
                        "clientId": folder["clientId"],
                        "drivewsid": "FOLDER::com.apple.CloudDocs::9E3F0A77-6D2D-4F3B-8E07-0C2B3B0D5C11",
                        "docwsid": "9E3F0A77-6D2D-4F3B-8E07-0C2B3B0D5C11",
                        "zone": "com.apple.CloudDocs",
                        "name": folder["name"],
                        "parentId": body["destinationDrivewsId"],
                        "etag": "1",
                        "type": "FOLDER",
                        "status": "OK"
                    }]
                })
            }
            (HttpMethod::Get, "/ws/com.apple.CloudDocs/download/by_id") => {
                match query.get("document_id").map(String::as_str) {
                    Some(SCANNED_DOC) => json!({
                        "document_id": SCANNED_DOC,
                        "data_token": {
                            "url": "https://cvws.icloud-content.com/B/scanned-document-1?o=signed",
                            "token": "AUJgIGnUX3Dw",
                            "signature": "AT1h8sEwW",
                            "wrapping_key": "PZb7Jcs1Q=="
                        },
                        "double_etag": "2k::2j"
                    }),
                    Some(SCANNE_2_DOC) => json!({
                        "document_id": SCANNE_2_DOC,
                        "data_token": {
                            "url": "https://cvws.icloud-content.com/B/expired?o=signed"
                        }
                    }),
                    _ => return (404, vec![], Bytes::from_static(b"NOT_FOUND")),
                }
            }
            _ => return (404, vec![], Bytes::from_static(b"Unknown endpoint")),
        };

        (
            200,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            Bytes::from(reply.to_string()),
        )
    }
}

#[async_trait]
impl HttpClient for FixtureHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let (status, headers, body) = self.route(&request);
        Ok(HttpResponse {
            status,
            headers: headers.into_iter().collect(),
            body,
        })
    }

    async fn download_stream(
        &self,
        url: String,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let request = HttpRequest::new(HttpMethod::Get, url);
        let (status, _, body) = self.route(&request);
        if status != 200 {
            return Err(BridgeError::OperationFailed(format!("HTTP {}", status)));
        }
        Ok(Box::new(std::io::Cursor::new(body.to_vec())))
    }
}

fn signed_content(path: &str) -> (u16, Vec<(String, String)>, Bytes) {
    match path {
        "/B/scanned-document-1" => (
            200,
            vec![("Content-Type".to_string(), "application/pdf".to_string())],
            Bytes::from_static(PDF_BYTES),
        ),
        _ => (410, vec![], Bytes::from_static(b"Gone")),
    }
}

fn operation(body: &Value, parent_of: impl Fn(&str) -> &'static str) -> Value {
    let items: Vec<Value> = body["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|item| {
            let id = item["drivewsid"].as_str().unwrap_or_default().to_string();
            json!({
                "drivewsid": id,
                "docwsid": id.rsplit("::").next(),
                "zone": "com.apple.CloudDocs",
                "name": trash_name(&id),
                "parentId": parent_of(&id),
                "etag": item["etag"],
                "type": "FOLDER",
                "status": if id == CONFLICTED { "ETAG_CONFLICT" } else { "OK" }
            })
        })
        .collect();
    json!({ "items": items })
}

fn trash_name(drivewsid: &str) -> Option<&'static str> {
    match drivewsid {
        RANDOM_UUID => Some("test_random_uuid"),
        FOREVER_AND_EVER => Some("test_delete_forever_and_ever"),
        CONFLICTED => Some("test12345"),
        _ => None,
    }
}

fn folder(drivewsid: &str, name: &str, parent: &str, etag: &str) -> Value {
    json!({
        "drivewsid": drivewsid,
        "docwsid": drivewsid.rsplit("::").next(),
        "zone": "com.apple.CloudDocs",
        "name": name,
        "parentId": parent,
        "etag": etag,
        "type": "FOLDER",
        "assetQuota": 42199120,
        "fileCount": 2,
        "shareCount": 0,
        "shareAliasCount": 0,
        "directChildrenCount": 1
    })
}

fn app_library(drivewsid: &str, name: &str, etag: &str) -> Value {
    json!({
        "drivewsid": drivewsid,
        "docwsid": "documents",
        "zone": drivewsid.split("::").nth(1),
        "name": name,
        "parentId": ROOT,
        "etag": etag,
        "type": "APP_LIBRARY",
        "maxDepth": "ANY",
        "icons": [],
        "supportedExtensions": [],
        "supportedTypes": []
    })
}

fn file(docwsid: &str, name: &str, size: u64, times: [&str; 4]) -> Value {
    json!({
        "drivewsid": format!("FILE::com.apple.CloudDocs::{}", docwsid),
        "docwsid": docwsid,
        "zone": "com.apple.CloudDocs",
        "name": name,
        "extension": "pdf",
        "parentId": TEST_FOLDER,
        "dateCreated": times[0],
        "dateChanged": times[1],
        "dateModified": times[2],
        "lastOpenTime": times[3],
        "size": size,
        "etag": "32::2x",
        "type": "FILE"
    })
}

fn trashed(drivewsid: &str, name: &str, extension: Option<&str>, kind: &str) -> Value {
    let mut item = json!({
        "drivewsid": drivewsid,
        "docwsid": drivewsid.rsplit("::").next(),
        "zone": "com.apple.CloudDocs",
        "name": name,
        "parentId": "TRASH_ROOT",
        "dateExpiration": "2020-08-27T18:22:46Z",
        "etag": "j9",
        "type": kind,
        "restorePath": format!("/{}", name)
    });
    if let Some(extension) = extension {
        item["extension"] = json!(extension);
        item["size"] = json!(0);
    }
    item
}

fn details(drivewsid: &str) -> Value {
    match drivewsid {
        ROOT => json!({
            "drivewsid": ROOT,
            "docwsid": "root",
            "zone": "com.apple.CloudDocs",
            "dateCreated": "2019-05-08T21:05:32Z",
            "etag": "2ks",
            "type": "FOLDER",
            "assetQuota": 62418076,
            "fileCount": 7,
            "shareCount": 0,
            "shareAliasCount": 0,
            "directChildrenCount": 5,
            "numberOfItems": 5,
            "status": "OK",
            "items": [
                app_library("FOLDER::com.apple.Keynote::documents", "Keynote", "2ig"),
                app_library("FOLDER::com.apple.Numbers::documents", "Numbers", "2if"),
                app_library("FOLDER::com.apple.Pages::documents", "Pages", "2ih"),
                app_library(PREVIEW, "Preview", "2ie"),
                folder(PYICLOUD, "pyiCloud", ROOT, "2kq"),
            ]
        }),
        PYICLOUD => {
            let mut pyicloud = folder(PYICLOUD, "pyiCloud", ROOT, "2kq");
            pyicloud["numberOfItems"] = json!(1);
            pyicloud["status"] = json!("OK");
            pyicloud["items"] = json!([folder(TEST_FOLDER, "Test", PYICLOUD, "2kp")]);
            pyicloud
        }
        TEST_FOLDER => {
            let mut test = folder(TEST_FOLDER, "Test", PYICLOUD, "2kp");
            test["numberOfItems"] = json!(2);
            test["status"] = json!("OK");
            test["items"] = json!([
                file(
                    SCANNE_2_DOC,
                    "Document scanné 2",
                    19876991,
                    [
                        "2020-05-03T00:18:17Z",
                        "2020-05-03T00:18:17Z",
                        "2020-05-03T00:18:17Z",
                        "2020-05-03T00:18:20Z",
                    ],
                ),
                file(
                    SCANNED_DOC,
                    "Scanned document 1",
                    21644358,
                    [
                        "2020-05-03T00:15:17Z",
                        "2020-05-03T00:16:17Z",
                        "2020-05-03T00:15:17Z",
                        "2020-05-03T00:24:25Z",
                    ],
                ),
            ]);
            test
        }
        PREVIEW => json!({
            "drivewsid": PREVIEW,
            "status": "ID_INVALID"
        }),
        "TRASH_ROOT" => json!({
            "drivewsid": "TRASH_ROOT",
            "numberOfItems": 6,
            "items": [
                trashed(
                    "FILE::com.apple.CloudDocs::0A5C3C5E-8B6F-4C2E-9C5A-3A0E6F0F7D41",
                    "dead-file",
                    Some("download"),
                    "FILE",
                ),
                trashed(
                    "FOLDER::com.apple.CloudDocs::2E1D7F6F-8E0B-4E4B-8D0C-DA3B5C19A0B2",
                    "test_create_folder",
                    None,
                    "FOLDER",
                ),
                trashed(FOREVER_AND_EVER, "test_delete_forever_and_ever", None, "FOLDER"),
                trashed(
                    "FOLDER::com.apple.CloudDocs::5F1C4E1A-2A6B-4C1B-9C2C-5B0F7B2D8E93",
                    "test_files_1",
                    None,
                    "FOLDER",
                ),
                trashed(RANDOM_UUID, "test_random_uuid", None, "FOLDER"),
                trashed(CONFLICTED, "test12345", None, "FOLDER"),
            ]
        }),
        other => json!({
            "drivewsid": other,
            "status": "ID_INVALID"
        }),
    }
}

pub fn session() -> Session {
    Session::new("12345678901")
        .with_cookie("X-APPLE-WEBAUTH-TOKEN", "v=2:t=AQAAAABe")
        .with_cookie("X-APPLE-WEBAUTH-USER", "v=1:s=0:d=12345678901")
        .with_service(DRIVEWS_SERVICE, "https://p00-drivews.icloud.com:443")
        .with_service(DOCWS_SERVICE, "https://p00-docws.icloud.com:443")
}

/// Drive service wired to a fresh fixture client.
pub fn drive() -> (Arc<FixtureHttpClient>, DriveService) {
    let http = FixtureHttpClient::new();
    let service = DriveService::from_session(http.clone(), session());
    (http, service)
}
