use serde_json::{Value, json};

use super::*;
use crate::Error;

const FEED: &str = "http://example.com/api/user/evan/feed";

fn activity(id: &str, verb: &str) -> Value {
    json!({
        "id": id,
        "objectType": "activity",
        "verb": verb,
        "actor": { "id": "acct:evan@example.com", "objectType": "person", "displayName": "Evan" },
        "object": { "id": format!("{id}-note"), "objectType": "note", "content": "hello" },
    })
}

#[test]
fn test_resolve_returns_same_instance_for_same_key() {
    let mut store = Store::new();
    let first = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "content": "a" }))
        .unwrap();
    let second = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "displayName": "b" }))
        .unwrap();

    assert_eq!(first, second);
    let entity = store.get(first).unwrap();
    assert_eq!(entity.attr("content"), Some(&json!("a")));
    assert_eq!(entity.attr("displayName"), Some(&json!("b")));
}

#[test]
fn test_nested_references_share_identity() {
    let mut store = Store::new();
    let first = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();
    let second = store.resolve(Kind::Activity, &activity("a2", "post")).unwrap();

    let actor = |id| store.get(id).unwrap().nested("actor").unwrap();
    assert_eq!(actor(first), actor(second));
    assert_eq!(
        store.lookup(Kind::Person, "acct:evan@example.com"),
        Some(actor(first))
    );
}

#[test]
fn test_resolve_rejects_non_object_payload() {
    let mut store = Store::new();
    let err = store.resolve(Kind::Activity, &json!("a1")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedData(_)));
}

#[test]
fn test_merge_is_idempotent() {
    let mut store = Store::new();
    let id = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();
    let props = json!({
        "id": "a1",
        "content": "edited",
        "to": [{ "id": "http://activityschema.org/collection/public", "objectType": "collection" }],
        "object": { "id": "a1-note", "likes": { "url": "http://example.com/likes", "totalItems": 0 } },
    });

    store.merge(id, &props).unwrap();
    let once = store.serialize(id).unwrap();
    let entities = store.len();

    store.merge(id, &props).unwrap();
    assert_eq!(store.serialize(id).unwrap(), once);
    assert_eq!(store.len(), entities);
}

#[test]
fn test_merge_never_removes_fields() {
    let mut store = Store::new();
    let id = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "content": "a", "summary": "s" }))
        .unwrap();

    store
        .merge(id, &json!({ "id": "n1", "content": null, "updated": "2013-01-01T00:00:00Z" }))
        .unwrap();

    let json = store.serialize(id).unwrap();
    assert_eq!(json["content"], "a");
    assert_eq!(json["summary"], "s");
    assert_eq!(json["updated"], "2013-01-01T00:00:00Z");
}

#[test]
fn test_merge_scalar_last_write_wins() {
    let mut store = Store::new();
    let id = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "content": "a" }))
        .unwrap();
    store.merge(id, &json!({ "content": "b" })).unwrap();
    assert_eq!(store.get(id).unwrap().attr("content"), Some(&json!("b")));
}

#[test]
fn test_keyless_nested_merges_into_existing_child() {
    let mut store = Store::new();
    let id = store
        .resolve(
            Kind::ActivityObject,
            &json!({ "id": "n1", "location": { "displayName": "Montreal" } }),
        )
        .unwrap();
    let location = store.get(id).unwrap().nested("location").unwrap();

    store
        .merge(id, &json!({ "location": { "lat": 45.5 } }))
        .unwrap();

    assert_eq!(store.get(id).unwrap().nested("location"), Some(location));
    let json = store.serialize(id).unwrap();
    assert_eq!(json["location"]["displayName"], "Montreal");
    assert_eq!(json["location"]["lat"], 45.5);
}

#[test]
fn test_wrongly_shaped_nested_field_is_kept_as_attribute() {
    let mut store = Store::new();
    let id = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "author": "acct:evan@example.com" }))
        .unwrap();
    assert!(store.get(id).unwrap().nested("author").is_none());
    assert_eq!(store.serialize(id).unwrap()["author"], "acct:evan@example.com");
}

#[test]
fn test_serialize_terminates_on_cycles() {
    let mut store = Store::new();
    let person = store
        .resolve(
            Kind::Person,
            &json!({
                "id": "acct:evan@example.com",
                "objectType": "person",
                "favorites": {
                    "url": "http://example.com/api/user/evan/favorites",
                    "totalItems": 1,
                    "items": [{
                        "id": "n1",
                        "objectType": "note",
                        "author": { "id": "acct:evan@example.com", "objectType": "person" },
                    }],
                },
            }),
        )
        .unwrap();

    let json = store.serialize(person).unwrap();
    let note = &json["favorites"]["items"][0];
    assert_eq!(note["id"], "n1");
    assert_eq!(
        note["author"],
        json!({ "id": "acct:evan@example.com", "objectType": "person" })
    );
}

#[test]
fn test_serialize_breaks_in_reply_to_cycle() {
    let mut store = Store::new();
    let id = store
        .resolve(
            Kind::Activity,
            &json!({
                "id": "A",
                "objectType": "activity",
                "verb": "post",
                "object": {
                    "id": "N",
                    "objectType": "note",
                    "inReplyTo": { "id": "N", "objectType": "note" },
                },
            }),
        )
        .unwrap();

    let json = store.serialize(id).unwrap();
    assert_eq!(json["object"]["id"], "N");
    assert_eq!(
        json["object"]["inReplyTo"],
        json!({ "id": "N", "objectType": "note" })
    );
}

#[test]
fn test_serialize_keys_are_per_family() {
    let mut store = Store::new();
    let id = store
        .resolve(
            Kind::ActivityObject,
            &json!({
                "id": "http://example.com/x",
                "objectType": "note",
                "replies": {
                    "url": "http://example.com/x",
                    "totalItems": 1,
                    "items": [{ "id": "r1", "objectType": "comment" }],
                },
            }),
        )
        .unwrap();

    let json = store.serialize(id).unwrap();
    assert_eq!(json["replies"]["items"][0]["id"], "r1");
}

#[test]
fn test_serialize_then_resolve_round_trips() {
    let props = json!({
        "id": "a1",
        "objectType": "activity",
        "verb": "share",
        "actor": {
            "id": "acct:evan@example.com",
            "objectType": "person",
            "followers": { "url": "http://example.com/api/user/evan/followers", "totalItems": 3 },
        },
        "object": {
            "id": "n1",
            "objectType": "note",
            "content": "hello",
            "likes": { "totalItems": 0 },
            "tags": [],
        },
        "to": [{ "id": "http://activityschema.org/collection/public", "objectType": "collection" }],
    });

    let mut store = Store::new();
    let id = store.resolve(Kind::Activity, &props).unwrap();
    let once = store.serialize(id).unwrap();

    let mut fresh = Store::new();
    let copy = fresh.resolve(Kind::Activity, &once).unwrap();
    assert_eq!(fresh.serialize(copy).unwrap(), once);

    let again = store.resolve(Kind::Activity, &once).unwrap();
    assert_eq!(again, id);
    assert_eq!(store.serialize(id).unwrap(), once);
}

#[test]
fn test_serialize_stream_reference_stub() {
    let mut store = Store::new();
    let stream = store
        .resolve(
            Kind::ActivityObjectStream,
            &json!({
                "url": "http://example.com/api/note/n1/replies",
                "totalItems": 1,
                "items": [{ "id": "n2", "objectType": "comment" }],
            }),
        )
        .unwrap();
    let reply = store.lookup(Kind::ActivityObject, "n2").unwrap();
    store
        .merge(
            reply,
            &json!({ "replies": { "url": "http://example.com/api/note/n1/replies" } }),
        )
        .unwrap();

    let json = store.serialize(stream).unwrap();
    assert_eq!(
        json["items"][0]["replies"],
        json!({ "url": "http://example.com/api/note/n1/replies", "totalItems": 1 })
    );
}

#[test]
fn test_serialize_siblings_do_not_see_each_other() {
    let mut store = Store::new();
    let id = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();

    let json = store.serialize(id).unwrap();
    assert_eq!(json["actor"]["displayName"], "Evan");
    // The posted note's author is the actor, reached on a different path.
    assert_eq!(json["object"]["author"]["displayName"], "Evan");
}

#[test]
fn test_post_links_actor_as_author() {
    let mut store = Store::new();
    let id = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();
    let entity = store.get(id).unwrap();
    let object = store.get(entity.nested("object").unwrap()).unwrap();
    assert_eq!(object.nested("author"), entity.nested("actor"));

    let id = store.resolve(Kind::Activity, &activity("a2", "like")).unwrap();
    let entity = store.get(id).unwrap();
    let object = store.get(entity.nested("object").unwrap()).unwrap();
    assert!(object.nested("author").is_none());
}

#[test]
fn test_bags_serialize_as_arrays() {
    let mut store = Store::new();
    let id = store
        .resolve(
            Kind::Activity,
            &json!({
                "id": "a1",
                "verb": "post",
                "to": [{ "id": "acct:a@example.com", "objectType": "person" }],
                "cc": [{ "id": "acct:a@example.com", "objectType": "person" }],
            }),
        )
        .unwrap();

    let entity = store.get(id).unwrap();
    assert_ne!(entity.nested("to"), entity.nested("cc"));
    let json = store.serialize(id).unwrap();
    assert_eq!(json["to"][0]["id"], "acct:a@example.com");
    assert_eq!(json["cc"][0]["id"], "acct:a@example.com");
}

#[test]
fn test_rekey_moves_identity() {
    let mut store = Store::new();
    let id = store
        .resolve(Kind::ActivityObject, &json!({ "id": "old", "content": "x" }))
        .unwrap();

    store.set(id, "id", json!("new")).unwrap();

    assert_eq!(store.lookup(Kind::ActivityObject, "old"), None);
    assert_eq!(store.lookup(Kind::ActivityObject, "new"), Some(id));
    let again = store
        .resolve(Kind::ActivityObject, &json!({ "id": "new" }))
        .unwrap();
    assert_eq!(again, id);
}

#[test]
fn test_object_type_refines_kind() {
    let mut store = Store::new();
    let generic = store
        .resolve(Kind::ActivityObject, &json!({ "id": "acct:a@example.com" }))
        .unwrap();
    assert_eq!(store.get(generic).unwrap().kind(), Kind::ActivityObject);

    let person = store
        .resolve(
            Kind::ActivityObject,
            &json!({ "id": "acct:a@example.com", "objectType": "person" }),
        )
        .unwrap();
    assert_eq!(person, generic);
    assert_eq!(store.get(person).unwrap().kind(), Kind::Person);
}

#[test]
fn test_activity_stream_prepends_items() {
    let mut store = Store::new();
    let stream = store
        .resolve(
            Kind::ActivityStream,
            &json!({ "url": FEED, "items": [activity("a2", "post")] }),
        )
        .unwrap();
    store
        .merge(stream, &json!({ "items": [activity("a3", "post"), activity("a2", "post")] }))
        .unwrap();

    let ids: Vec<_> = store.serialize(stream).unwrap()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a3", "a2"]);
}

#[test]
fn test_clear_invalidates_handles() {
    let mut store = Store::new();
    let id = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();
    store.clear();

    assert!(store.is_empty());
    assert!(store.get(id).is_none());
    assert_eq!(store.serialize(id), None);
    assert_eq!(store.merge(id, &json!({})), Err(Error::StaleHandle));

    let fresh = store.resolve(Kind::Activity, &activity("a1", "post")).unwrap();
    assert_ne!(fresh, id);
}

#[test]
fn test_stale_handles_do_not_touch_new_entities() {
    let mut store = Store::new();
    let stale = store
        .resolve(Kind::ActivityObjectStream, &json!({ "url": "http://example.com/likes" }))
        .unwrap();
    store.clear();

    let note = store
        .resolve(Kind::ActivityObject, &json!({ "id": "n1", "objectType": "note" }))
        .unwrap();

    assert_eq!(store.insert_items(stale, &[note], false), 0);
    assert!(!store.remove_item(stale, note));
    store.ensure_nested(stale, "likes", Kind::ActivityObjectStream);
    assert!(store.get(note).unwrap().nested("likes").is_none());
}

#[test]
fn test_cursor_prefers_server_links() {
    let mut store = Store::new();
    let stream = store
        .resolve(
            Kind::ActivityStream,
            &json!({
                "url": FEED,
                "links": { "next": { "href": format!("{FEED}?before=x") } },
                "items": [activity("a1", "post")],
            }),
        )
        .unwrap();

    assert_eq!(
        store.cursor(stream, Direction::Older, DEFAULT_PAGE_SIZE),
        Some(format!("{FEED}?before=x"))
    );
    assert_eq!(
        store.cursor(stream, Direction::Older, 50),
        Some(format!("{FEED}?before=x&count=50"))
    );
}

#[test]
fn test_cursor_derived_from_items() {
    let mut store = Store::new();
    let stream = store
        .resolve(
            Kind::ActivityStream,
            &json!({ "url": FEED, "items": [activity("a2", "post"), activity("a1", "post")] }),
        )
        .unwrap();

    assert_eq!(
        store.cursor(stream, Direction::Newer, DEFAULT_PAGE_SIZE),
        Some(format!("{FEED}?since=a2&type=activity"))
    );
    assert_eq!(
        store.cursor(stream, Direction::Older, DEFAULT_PAGE_SIZE),
        Some(format!("{FEED}?before=a1&type=activity"))
    );
}

#[test]
fn test_cursor_absent_for_empty_stream() {
    let mut store = Store::new();
    let stream = store
        .resolve(Kind::ActivityStream, &json!({ "url": FEED }))
        .unwrap();
    assert_eq!(store.cursor(stream, Direction::Newer, DEFAULT_PAGE_SIZE), None);
    assert_eq!(store.cursor(stream, Direction::Older, DEFAULT_PAGE_SIZE), None);
}

#[test]
fn test_people_stream_cursor_asks_for_persons() {
    let mut store = Store::new();
    let followers = "http://example.com/api/user/evan/followers";
    let stream = store
        .resolve(
            Kind::PeopleStream,
            &json!({
                "url": followers,
                "links": { "prev": { "href": format!("{followers}?since=x") } },
            }),
        )
        .unwrap();

    assert_eq!(
        store.cursor(stream, Direction::Newer, DEFAULT_PAGE_SIZE),
        Some(format!("{followers}?since=x&type=person"))
    );
}

#[test]
fn test_stream_url_prefers_proxy() {
    let mut store = Store::new();
    let stream = store
        .resolve(
            Kind::ActivityObjectStream,
            &json!({
                "url": "http://remote.example/api/note/n1/likes",
                "pump_io": { "proxyURL": "http://example.com/api/proxy/abc" },
            }),
        )
        .unwrap();
    assert_eq!(
        store.stream_url(stream).as_deref(),
        Some("http://example.com/api/proxy/abc")
    );
}

#[test]
fn test_max_count() {
    let mut store = Store::new();
    let stream = store
        .resolve(Kind::ActivityStream, &json!({ "url": FEED }))
        .unwrap();
    assert_eq!(store.max_count(stream), MAX_PAGE_SIZE);

    store.set_total_items(stream, 45).unwrap();
    assert_eq!(store.max_count(stream), 45);

    store.set_total_items(stream, 4500).unwrap();
    assert_eq!(store.max_count(stream), MAX_PAGE_SIZE);
}

#[test]
fn test_set_link_adds_and_removes() {
    let mut store = Store::new();
    let stream = store
        .resolve(Kind::ActivityStream, &json!({ "url": FEED }))
        .unwrap();

    store.set_link(stream, "next", Some("http://x/next")).unwrap();
    assert_eq!(store.link(stream, "next").as_deref(), Some("http://x/next"));

    store.set_link(stream, "next", None).unwrap();
    assert_eq!(store.link(stream, "next"), None);
}

fn open_feed(store: &mut Store, items: Vec<Value>) -> EntityId {
    store
        .resolve(Kind::ActivityStream, &json!({ "url": FEED, "items": items }))
        .unwrap()
}

fn like(id: &str, verb: &str, liker: &str) -> Value {
    json!({
        "id": id,
        "objectType": "activity",
        "verb": verb,
        "actor": { "id": liker, "objectType": "person" },
        "object": { "id": "a1-note", "objectType": "note" },
    })
}

#[test]
fn test_fold_like_and_unlike() {
    let mut store = Store::new();
    let feed = open_feed(&mut store, vec![activity("a1", "post")]);
    let note = store.lookup(Kind::ActivityObject, "a1-note").unwrap();

    let liked = store
        .resolve(Kind::Activity, &like("l1", "like", "acct:b@example.com"))
        .unwrap();
    assert!(fold(&mut store, &[feed], liked));

    let likes = store.get(note).unwrap().nested("likes").unwrap();
    let liker = store.lookup(Kind::Person, "acct:b@example.com").unwrap();
    assert_eq!(store.get(likes).unwrap().items(), &[liker]);
    assert_eq!(store.total_items(likes), Some(1));

    let unliked = store
        .resolve(Kind::Activity, &like("l2", "unlike", "acct:b@example.com"))
        .unwrap();
    assert!(fold(&mut store, &[feed], unliked));
    assert!(store.get(likes).unwrap().items().is_empty());
    assert_eq!(store.total_items(likes), Some(0));
}

#[test]
fn test_fold_share_is_idempotent() {
    let mut store = Store::new();
    let feed = open_feed(&mut store, vec![activity("a1", "post")]);
    let note = store.lookup(Kind::ActivityObject, "a1-note").unwrap();

    let shared = store
        .resolve(Kind::Activity, &like("s1", "share", "acct:b@example.com"))
        .unwrap();
    fold(&mut store, &[feed], shared);
    fold(&mut store, &[feed], shared);

    let shares = store.get(note).unwrap().nested("shares").unwrap();
    assert_eq!(store.get(shares).unwrap().items().len(), 1);
    assert_eq!(store.total_items(shares), Some(1));
}

#[test]
fn test_fold_reply_appends_to_parent() {
    let mut store = Store::new();
    let feed = open_feed(&mut store, vec![activity("a1", "post")]);
    let note = store.lookup(Kind::ActivityObject, "a1-note").unwrap();

    let reply = store
        .resolve(
            Kind::Activity,
            &json!({
                "id": "r1",
                "verb": "post",
                "actor": { "id": "acct:b@example.com", "objectType": "person" },
                "object": {
                    "id": "c1",
                    "objectType": "comment",
                    "inReplyTo": { "id": "a1-note", "objectType": "note" },
                },
            }),
        )
        .unwrap();
    assert!(fold(&mut store, &[feed], reply));

    let replies = store.get(note).unwrap().nested("replies").unwrap();
    let comment = store.lookup(Kind::ActivityObject, "c1").unwrap();
    assert_eq!(store.get(replies).unwrap().items(), &[comment]);
    assert_eq!(store.total_items(replies), Some(1));
    assert_eq!(
        store.get(comment).unwrap().nested("author"),
        store.lookup(Kind::Person, "acct:b@example.com")
    );
}

#[test]
fn test_fold_without_visible_post_is_noop() {
    let mut store = Store::new();
    let feed = open_feed(&mut store, vec![]);

    let liked = store
        .resolve(Kind::Activity, &like("l1", "like", "acct:b@example.com"))
        .unwrap();
    store.insert_items(feed, &[liked], true);

    assert!(!fold(&mut store, &[feed], liked));
    let note = store.lookup(Kind::ActivityObject, "a1-note").unwrap();
    assert!(store.get(note).unwrap().nested("likes").is_none());
}

#[test]
fn test_fold_unknown_verb_is_noop() {
    let mut store = Store::new();
    let feed = open_feed(&mut store, vec![activity("a1", "post")]);
    let follow = store
        .resolve(Kind::Activity, &like("f1", "follow", "acct:b@example.com"))
        .unwrap();
    assert!(!fold(&mut store, &[feed], follow));
}

#[test]
fn test_user_stream_urls() {
    assert_eq!(
        UserStream::MajorDirectInbox.url("http://example.com/", "evan"),
        "http://example.com/api/user/evan/inbox/direct/major"
    );
    assert_eq!(UserStream::ALL.len(), 9);
}
