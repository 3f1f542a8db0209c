// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Integration tests for nested proxies and sequences.

use buffered_proxy::{
    BufferedProxy, BufferedValue, ElementKind,
    host::{List, Object, ObjectKind, Value},
    host_value, object,
    observer::RecordingObserver,
};
use std::{cell::RefCell, rc::Rc};

#[test]
fn nested_address_is_committed_in_place() {
    let content = object! { "address" => { "city" => "X" } };
    let address = content.get("address");
    let address = address.as_object().unwrap().clone();
    let proxy = BufferedProxy::new(content.clone());

    let nested = proxy.get("address").into_proxy().unwrap();
    nested.set("city", "Y");
    assert_eq!(address.get("city"), Value::from("X"));

    let report = proxy.apply_changes();
    assert_eq!(report.applied, ["address.city", "address"]);

    // plain nested data keeps its identity: content still holds the same object
    let stored = content.get("address");
    let stored = stored.as_object().unwrap();
    assert!(stored.ptr_eq(&address));
    assert_eq!(stored.get("city"), Value::from("Y"));
}

#[test]
fn nested_records_are_committed_by_reference() {
    let author = Object::record("user").with("name", "Ada");
    let post = Object::record("post")
        .with("title", "Engines")
        .with("author", author.clone());
    let proxy = BufferedProxy::new(post.clone());

    let nested = proxy.get("author").into_proxy().unwrap();
    assert_eq!(nested.element_kind(), ElementKind::Record("user".into()));
    nested.set("name", "Grace");

    let _ = proxy.apply_changes();
    let stored = post.get("author");
    let stored = stored.as_object().unwrap();
    assert!(stored.ptr_eq(&author));
    assert_eq!(stored.kind(), ObjectKind::Record("user".into()));
    assert_eq!(author.get("name"), Value::from("Grace"));
}

#[test]
fn outer_apply_reaches_deeply_nested_edits() {
    let content = object! {
        "company" => {
            "address" => { "city" => "X", "zip" => "1000" }
        }
    };
    let proxy = BufferedProxy::new(content.clone());

    let city = proxy
        .get("company")
        .into_proxy()
        .unwrap()
        .get("address")
        .into_proxy()
        .unwrap();
    city.set("city", "Y");
    assert!(!proxy.has_changes());
    assert!(proxy.has_deep_changes());
    assert!(proxy.has_changed("company"));

    let report = proxy.apply_changes();
    assert_eq!(
        report.applied,
        ["company.address.city", "company.address", "company"]
    );
    assert_eq!(
        proxy.to_json(),
        serde_json::json!({ "company": { "address": { "city": "Y", "zip": "1000" } } })
    );
}

#[test]
fn discarding_the_outer_proxy_discards_nested_edits() {
    let content = object! { "address" => { "city" => "X" } };
    let proxy = BufferedProxy::new(content.clone());
    let nested = proxy.get("address").into_proxy().unwrap();
    nested.set("city", "Y");
    let observer = Rc::new(RefCell::new(RecordingObserver::new()));
    nested.observe(observer.clone());

    proxy.discard_changes();
    assert!(!nested.has_changes());
    assert!(!proxy.has_deep_changes());
    assert_eq!(
        observer.borrow_mut().take(),
        "will_change city, did_change city"
    );
    assert_eq!(
        content.get("address").as_object().unwrap().get("city"),
        Value::from("X")
    );
}

#[test]
fn sequences_commit_elements_and_store_a_new_list() {
    let content = object! {
        "tags" => [{ "label" => "rust" }, "plain"]
    };
    let original = content.get("tags");
    let original = original.as_list().unwrap().clone();
    let proxy = BufferedProxy::new(content.clone());

    let tags = proxy.get("tags").into_sequence().unwrap();
    assert_eq!(tags.element_kind(), ElementKind::Plain);
    let first = tags.get(0).and_then(BufferedValue::into_proxy).unwrap();
    first.set("label", "systems");
    tags.push(host_value!({ "label" => "new" }));
    assert!(proxy.has_changed("tags"));

    let report = proxy.apply_changes();
    assert_eq!(report.applied, ["tags.0.label", "tags"]);

    let stored = content.get("tags");
    let stored = stored.as_list().unwrap();
    assert!(!stored.ptr_eq(&original));
    assert_eq!(stored.len(), 3);
    assert_eq!(
        stored.get(0).unwrap().as_object().unwrap().get("label"),
        Value::from("systems")
    );
    assert_eq!(stored.get(1), Some(Value::from("plain")));
    assert_eq!(
        stored.get(2).unwrap().as_object().unwrap().get("label"),
        Value::from("new")
    );
    assert_eq!(original.len(), 2);
}

#[test]
fn removing_from_a_sequence() {
    let content = object! { "numbers" => [1, 2, 3] };
    let proxy = BufferedProxy::new(content.clone());
    let numbers = proxy.get("numbers").into_sequence().unwrap();
    assert_eq!(numbers.element_kind(), ElementKind::Primitive);

    assert_eq!(numbers.remove(1), Some(BufferedValue::from(2)));
    assert!(numbers.has_changes());
    assert_eq!(
        proxy.to_json(),
        serde_json::json!({ "numbers": [1, 3] })
    );
    assert_eq!(content.get("numbers").as_list().unwrap().len(), 3);

    let _ = proxy.apply_changes();
    assert_eq!(
        Value::from(content).to_json(),
        serde_json::json!({ "numbers": [1, 3] })
    );
}

#[test]
fn replacing_a_nested_object_outright() {
    let content = object! { "address" => { "city" => "X" } };
    let proxy = BufferedProxy::new(content.clone());
    let replacement = object! { "city" => "Z" };

    proxy.set("address", replacement.clone());
    assert!(proxy.has_changes());
    assert_eq!(
        proxy.get("address").as_value().and_then(Value::as_object).map(|o| o.ptr_eq(&replacement)),
        Some(true)
    );

    let _ = proxy.apply_changes();
    assert!(content
        .get("address")
        .as_object()
        .unwrap()
        .ptr_eq(&replacement));
}

#[test]
fn cyclic_graphs_terminate() {
    let parent = object! { "name" => "parent" };
    let child = object! { "name" => "child" };
    parent.insert("child", Value::from(child.clone()));
    child.insert("parent", Value::from(parent.clone()));
    let list: List = [parent.clone()].into_iter().collect();
    child.insert("siblings", Value::from(list));

    let proxy = BufferedProxy::new(parent.clone());
    let child_proxy = proxy.get("child").into_proxy().unwrap();
    child_proxy.set("name", "kid");
    // reading back up the graph wraps the parent again, and edits through it are separate
    let parent_again = child_proxy.get("parent").into_proxy().unwrap();
    assert!(!parent_again.ptr_eq(&proxy));
    child_proxy.set("parent", proxy.clone());
    child_proxy
        .get("siblings")
        .into_sequence()
        .unwrap()
        .push(proxy.clone());

    assert!(proxy.has_deep_changes());
    let report = proxy.apply_changes();
    assert!(report.is_complete());
    assert_eq!(child.get("name"), Value::from("kid"));
    assert!(child.get("parent").as_object().unwrap().ptr_eq(&parent));
    assert_eq!(child.get("siblings").as_list().unwrap().len(), 2);

    proxy.discard_changes();
    assert!(!proxy.has_deep_changes());
}
