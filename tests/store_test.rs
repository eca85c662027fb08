//! End-to-end store tests against a scripted transport.
//!
//! The transport serves queued responses per URL and records every request,
//! which is what lets these tests pin down the round-trip budget of the
//! batched work load and the no-commit-on-failure behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use folio::client::Transport;
use folio::error::CatalogError;
use folio::store::CatalogStore;
use folio::urn::Urn;

const BASE: &str = "http://library.test";

#[derive(Clone, Default)]
struct ScriptedTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a URL. Repeated pushes to the same URL are
    /// served in order.
    fn push(&self, url: &str, response: Value) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, url: &str, _query: &[(&str, String)]) -> folio::Result<Value> {
        self.inner.requests.lock().unwrap().push(url.to_string());
        self.inner
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| CatalogError::Fetch {
                status: 404,
                status_text: "Not Found".to_string(),
            })
    }
}

fn urn(value: &str) -> Urn {
    Urn::parse(value).unwrap()
}

fn inventory() -> Value {
    json!({
        "text_groups": [
            {
                "urn": "urn:cts:greekLit:tlg0012",
                "label": "Homer",
                "works": [
                    {
                        "urn": "urn:cts:greekLit:tlg0012.tlg001",
                        "texts": [{"urn": "urn:cts:greekLit:tlg0012.tlg001.perseus-grc2"}]
                    }
                ]
            },
            {
                "urn": "urn:cts:latinLit:phi0690",
                "label": "Virgil",
                "works": [
                    {
                        "urn": "urn:cts:latinLit:phi0690.phi003",
                        "texts": [{"urn": "urn:cts:latinLit:phi0690.phi003.perseus-lat2"}]
                    }
                ]
            }
        ],
        "works": [
            {
                "urn": "urn:cts:greekLit:tlg0012.tlg001",
                "label": "Iliad",
                "texts": [{"urn": "urn:cts:greekLit:tlg0012.tlg001.perseus-grc2"}]
            },
            {
                "urn": "urn:cts:latinLit:phi0690.phi003",
                "label": "Aeneid",
                "texts": [{"urn": "urn:cts:latinLit:phi0690.phi003.perseus-lat2"}]
            }
        ],
        "texts": [
            {"urn": "urn:cts:greekLit:tlg0012.tlg001.perseus-grc2", "label": "Iliad (Greek)"},
            {"urn": "urn:cts:latinLit:phi0690.phi003.perseus-lat2", "label": "Aeneid (Latin)"}
        ]
    })
}

fn scripted_store() -> (CatalogStore, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let store = CatalogStore::new(Box::new(transport.clone()), BASE);
    (store, transport)
}

/// Build the three responses of a work load for one group of `works` works
/// with `texts` texts each.
fn work_load_fixture(group: &str, works: usize, texts: usize) -> (Value, Value, Value) {
    let mut stubs = Vec::new();
    let mut work_collections = serde_json::Map::new();
    let mut text_collections = serde_json::Map::new();

    for w in 0..works {
        let work_urn = format!("{group}.w{w:03}");
        stubs.push(json!({"urn": work_urn}));

        let mut text_stubs = Vec::new();
        for t in 0..texts {
            let text_urn = format!("{work_urn}.ed{t:02}");
            text_stubs.push(json!({"urn": text_urn}));
            text_collections.insert(
                text_urn.clone(),
                json!({"urn": text_urn, "label": format!("Text {w}.{t}")}),
            );
        }
        work_collections.insert(
            work_urn.clone(),
            json!({"urn": work_urn, "label": format!("Work {w}"), "texts": text_stubs}),
        );
    }

    let detail = json!({"urn": group, "label": "Stress Group", "works": stubs});
    (
        detail,
        json!({"collections": work_collections}),
        json!({"collections": text_collections}),
    )
}

#[tokio::test]
async fn test_work_load_issues_exactly_two_vector_calls() {
    let group = "urn:cts:greekLit:tlg9999";
    let (detail, work_vector, text_vector) = work_load_fixture(group, 50, 10);

    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/{group}/json/"), detail);
    let vector_url = format!("{BASE}/library/vector/{group}/");
    transport.push(&vector_url, work_vector);
    transport.push(&vector_url, text_vector);

    store.load_works(&urn(group)).await.unwrap();

    let requests = transport.requests();
    let vector_calls = requests.iter().filter(|url| *url == &vector_url).count();
    assert_eq!(vector_calls, 2);
    assert_eq!(requests.len(), 3);

    assert_eq!(store.works().len(), 50);
    assert_eq!(store.works()[0].texts.len(), 10);
}

#[tokio::test]
async fn test_work_load_with_no_works_still_issues_two_vector_calls() {
    let group = "urn:cts:greekLit:tlg9999";
    let (detail, work_vector, text_vector) = work_load_fixture(group, 0, 0);

    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/{group}/json/"), detail);
    let vector_url = format!("{BASE}/library/vector/{group}/");
    transport.push(&vector_url, work_vector);
    transport.push(&vector_url, text_vector);

    store.load_works(&urn(group)).await.unwrap();

    assert_eq!(transport.requests().len(), 3);
    assert!(store.works().is_empty());
}

#[tokio::test]
async fn test_work_load_assembles_in_detail_order_and_indexes() {
    let group = "urn:cts:greekLit:tlg9999";
    let (detail, work_vector, text_vector) = work_load_fixture(group, 3, 2);

    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/{group}/json/"), detail);
    let vector_url = format!("{BASE}/library/vector/{group}/");
    transport.push(&vector_url, work_vector);
    transport.push(&vector_url, text_vector);

    store.load_works(&urn(group)).await.unwrap();

    let labels: Vec<&str> = store.works().iter().map(|work| work.label.as_str()).collect();
    assert_eq!(labels, vec!["Work 0", "Work 1", "Work 2"]);
    assert_eq!(store.works()[1].texts[0].label, "Text 1.0");

    let work = store.lookup(&urn(&format!("{group}.w001"))).unwrap();
    assert_eq!(work.label(), "Work 1");
    let text = store.lookup(&urn(&format!("{group}.w001.ed00"))).unwrap();
    assert_eq!(text.label(), "Text 1.0");

    // The loaded group resolves as the parent of every work view entry.
    let parent = store.works()[0].text_group.as_ref().unwrap();
    assert_eq!(parent.label, "Stress Group");
}

#[tokio::test]
async fn test_not_found_fails_load_and_preserves_state() {
    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/json/"), inventory());

    store.load_text_groups().await.unwrap();
    assert_eq!(store.text_groups().len(), 2);

    // Nothing scripted for this group: the detail fetch gets a 404.
    let err = store
        .load_works(&urn("urn:cts:greekLit:tlg0999"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Fetch { status: 404, .. }));

    // Prior state is untouched.
    assert_eq!(store.text_groups().len(), 2);
    assert_eq!(store.group_works().len(), 2);
    assert!(store.works().is_empty());
    assert!(store.lookup(&urn("urn:cts:greekLit:tlg0012")).is_some());
}

#[tokio::test]
async fn test_malformed_payload_is_decode_error_and_commits_nothing() {
    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/json/"), json!(["not", "an", "inventory"]));

    let err = store.load_text_groups().await.unwrap_err();
    assert!(matches!(err, CatalogError::Decode { .. }));

    assert!(store.text_groups().is_empty());
    assert!(store.group_works().is_empty());
    assert!(store.lookup(&urn("urn:cts:greekLit:tlg0012")).is_none());
}

#[tokio::test]
async fn test_vector_response_missing_record_fails_load() {
    let group = "urn:cts:greekLit:tlg9999";
    let (detail, _, _) = work_load_fixture(group, 2, 1);

    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/{group}/json/"), detail);
    // The work vector omits every record the detail asked for.
    transport.push(
        &format!("{BASE}/library/vector/{group}/"),
        json!({"collections": {}}),
    );

    let err = store.load_works(&urn(group)).await.unwrap_err();
    assert!(matches!(err, CatalogError::MissingRecord { .. }));
    assert!(store.works().is_empty());
    assert!(store.lookup(&urn(&format!("{group}.w000"))).is_none());
}

#[tokio::test]
async fn test_filter_sequences_then_reset_restores_snapshot() {
    let (mut store, transport) = scripted_store();
    transport.push(&format!("{BASE}/library/json/"), inventory());
    store.load_text_groups().await.unwrap();

    let full: Vec<Urn> = store
        .text_groups()
        .iter()
        .map(|group| group.urn.clone())
        .collect();

    for query in ["homer", "iliad", "zzz", "", "VIRGIL"] {
        store.filter_text_groups(query);
    }
    store.reset_text_groups();

    let mut restored: Vec<Urn> = store
        .text_groups()
        .iter()
        .map(|group| group.urn.clone())
        .collect();
    let mut expected = full.clone();
    restored.sort();
    expected.sort();
    assert_eq!(restored, expected);
}

#[tokio::test]
async fn test_toc_load() {
    let text = "urn:cts:greekLit:tlg0012.tlg001.perseus-grc2";
    let (mut store, transport) = scripted_store();
    transport.push(
        &format!("{BASE}/library/{text}/json/"),
        json!({
            "urn": text,
            "label": "Iliad (Greek)",
            "toc": [
                {"label": "Book 1", "num": "1"},
                {"label": "Book 2", "num": "2"}
            ]
        }),
    );

    store.load_toc(&urn(text)).await.unwrap();
    assert_eq!(store.toc().len(), 2);
    assert_eq!(store.toc()[0]["label"], "Book 1");

    // A failed reload keeps the previously loaded toc.
    let err = store.load_toc(&urn(text)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Fetch { status: 404, .. }));
    assert_eq!(store.toc().len(), 2);
}
