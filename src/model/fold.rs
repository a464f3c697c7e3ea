use serde_json::Value;

use super::kind::Kind;
use super::store::{EntityId, Store};

/// Applies the side effects of `activity` to the posts it refers to.
///
/// Replies land in the parent's `replies`, likes and shares toggle the actor
/// in `likes` and `shares`. The target must be visible in one of the `open`
/// streams through an entry other than `activity` itself. Returns whether
/// anything was applied.
pub fn fold(store: &mut Store, open: &[EntityId], activity: EntityId) -> bool {
    let Some(entity) = store.get(activity) else {
        return false;
    };

    let verb = entity
        .attr("verb")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let actor = entity.nested("actor");
    let object = entity.nested("object");

    let target = Target {
        open,
        activity,
        actor,
    };

    match verb.as_str() {
        "post" | "create" => target.reply(store, object),
        "like" | "favorite" => target.toggle(store, object, "likes", true),
        "unlike" | "unfavorite" => target.toggle(store, object, "likes", false),
        "share" => target.toggle(store, object, "shares", true),
        "unshare" => target.toggle(store, object, "shares", false),
        _ => false,
    }
}

struct Target<'a> {
    open: &'a [EntityId],
    activity: EntityId,
    actor: Option<EntityId>,
}

impl Target<'_> {
    fn reply(&self, store: &mut Store, object: Option<EntityId>) -> bool {
        let Some(object) = object else {
            return false;
        };
        let Some(post) = store.get(object).and_then(|entity| entity.nested("inReplyTo")) else {
            return false;
        };
        if !self.is_visible(store, post) {
            return false;
        }

        if let Some(actor) = self.actor {
            store.adopt_author(object, actor);
        }

        let replies = store.ensure_nested(post, "replies", Kind::ActivityObjectStream);
        store.insert_items(replies, &[object], false);
        sync_total(store, replies)
    }

    fn toggle(&self, store: &mut Store, object: Option<EntityId>, field: &str, add: bool) -> bool {
        let (Some(post), Some(actor)) = (object, self.actor) else {
            return false;
        };
        if !self.is_visible(store, post) {
            return false;
        }

        let collection = if add {
            let collection = store.ensure_nested(post, field, Kind::ActivityObjectStream);
            store.insert_items(collection, &[actor], false);
            collection
        } else {
            let Some(collection) = store.get(post).and_then(|entity| entity.nested(field)) else {
                return false;
            };
            store.remove_item(collection, actor);
            collection
        };

        sync_total(store, collection)
    }

    /// Whether `post` is an item of an open stream, or the object of one.
    fn is_visible(&self, store: &Store, post: EntityId) -> bool {
        self.open
            .iter()
            .filter_map(|stream| store.get(*stream))
            .flat_map(|stream| stream.items())
            .filter(|item| **item != self.activity)
            .any(|item| {
                *item == post
                    || store
                        .get(*item)
                        .and_then(|entity| entity.nested("object"))
                        .is_some_and(|object| object == post)
            })
    }
}

/// Sets `totalItems` to the item count. `false` if the handle is stale.
fn sync_total(store: &mut Store, collection: EntityId) -> bool {
    let Some(total) = store
        .get(collection)
        .map(|entity| entity.items().len() as u64)
    else {
        return false;
    };
    store.set_total_items(collection, total).is_ok()
}
