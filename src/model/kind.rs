use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The concrete type of an entity held by the [`Store`](super::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Activity,
    ActivityObject,
    Person,
    List,
    User,
    ActivityStream,
    ActivityObjectStream,
    PeopleStream,
    ListStream,
    /// Keyless collection such as `to` or `attachments`
    ObjectBag,
}

/// Kinds sharing an identity key share one identity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Activities and activity objects, keyed by `id`
    Objects,
    /// Paginated collections, keyed by `url`
    Streams,
    /// Local accounts, keyed by `nickname`
    Users,
}

impl Family {
    /// Name of the attribute holding the identity key.
    pub fn key_attr(self) -> &'static str {
        match self {
            Family::Objects => "id",
            Family::Streams => "url",
            Family::Users => "nickname",
        }
    }
}

/// A nested field of a kind and the kind its value resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
}

const fn field(name: &'static str, kind: Kind) -> Field {
    Field { name, kind }
}

const ACTIVITY_FIELDS: &[Field] = &[
    field("actor", Kind::ActivityObject),
    field("object", Kind::ActivityObject),
    field("target", Kind::ActivityObject),
    field("generator", Kind::ActivityObject),
    field("provider", Kind::ActivityObject),
    field("location", Kind::ActivityObject),
    field("to", Kind::ObjectBag),
    field("cc", Kind::ObjectBag),
    field("bto", Kind::ObjectBag),
    field("bcc", Kind::ObjectBag),
];

const OBJECT_FIELDS: &[Field] = &[
    field("author", Kind::ActivityObject),
    field("location", Kind::ActivityObject),
    field("inReplyTo", Kind::ActivityObject),
    field("attachments", Kind::ObjectBag),
    field("tags", Kind::ObjectBag),
    field("likes", Kind::ActivityObjectStream),
    field("replies", Kind::ActivityObjectStream),
    field("shares", Kind::ActivityObjectStream),
];

const PERSON_FIELDS: &[Field] = &[
    field("author", Kind::ActivityObject),
    field("location", Kind::ActivityObject),
    field("inReplyTo", Kind::ActivityObject),
    field("attachments", Kind::ObjectBag),
    field("tags", Kind::ObjectBag),
    field("likes", Kind::ActivityObjectStream),
    field("replies", Kind::ActivityObjectStream),
    field("shares", Kind::ActivityObjectStream),
    field("favorites", Kind::ActivityObjectStream),
    field("lists", Kind::ListStream),
    field("followers", Kind::PeopleStream),
    field("following", Kind::PeopleStream),
];

const LIST_FIELDS: &[Field] = &[
    field("author", Kind::ActivityObject),
    field("location", Kind::ActivityObject),
    field("inReplyTo", Kind::ActivityObject),
    field("attachments", Kind::ObjectBag),
    field("tags", Kind::ObjectBag),
    field("likes", Kind::ActivityObjectStream),
    field("replies", Kind::ActivityObjectStream),
    field("shares", Kind::ActivityObjectStream),
    field("members", Kind::PeopleStream),
];

const STREAM_FIELDS: &[Field] = &[field("author", Kind::Person)];

const USER_FIELDS: &[Field] = &[field("profile", Kind::Person)];

impl Kind {
    /// Identity map shared by this kind, or `None` for keyless kinds.
    pub fn family(self) -> Option<Family> {
        match self {
            Kind::Activity | Kind::ActivityObject | Kind::Person | Kind::List => {
                Some(Family::Objects)
            }
            Kind::ActivityStream
            | Kind::ActivityObjectStream
            | Kind::PeopleStream
            | Kind::ListStream => Some(Family::Streams),
            Kind::User => Some(Family::Users),
            Kind::ObjectBag => None,
        }
    }

    /// Name of the identity key attribute, or `None` for keyless kinds.
    pub fn key_attr(self) -> Option<&'static str> {
        self.family().map(Family::key_attr)
    }

    /// Static schema of the nested fields of this kind.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Kind::Activity => ACTIVITY_FIELDS,
            Kind::ActivityObject => OBJECT_FIELDS,
            Kind::Person => PERSON_FIELDS,
            Kind::List => LIST_FIELDS,
            Kind::User => USER_FIELDS,
            Kind::ActivityStream
            | Kind::ActivityObjectStream
            | Kind::PeopleStream
            | Kind::ListStream => STREAM_FIELDS,
            Kind::ObjectBag => &[],
        }
    }

    /// Kind the value of field `name` resolves to, if it is a nested field.
    pub fn field(self, name: &str) -> Option<Kind> {
        self.fields()
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.kind)
    }

    /// Kind of the members of `items`, for streams and bags.
    pub fn item_kind(self) -> Option<Kind> {
        match self {
            Kind::ActivityStream => Some(Kind::Activity),
            Kind::ActivityObjectStream | Kind::ObjectBag => Some(Kind::ActivityObject),
            Kind::PeopleStream => Some(Kind::Person),
            Kind::ListStream => Some(Kind::List),
            _ => None,
        }
    }

    pub fn is_stream(self) -> bool {
        self.family() == Some(Family::Streams)
    }

    /// Whether merged `items` go to the front of the collection.
    pub fn prepends_items(self) -> bool {
        self == Kind::ActivityStream
    }

    /// Picks a more specific kind from the payload's `objectType`.
    pub fn refine(self, props: &Map<String, Value>) -> Kind {
        if self != Kind::ActivityObject {
            return self;
        }

        match props.get("objectType").and_then(Value::as_str) {
            Some("person") => Kind::Person,
            Some("collection") => Kind::List,
            _ => self,
        }
    }

    /// Whether an entity of kind `current` should be upgraded to `self`.
    pub fn specializes(self, current: Kind) -> bool {
        matches!(
            (current, self),
            (Kind::ActivityObject, Kind::Person)
                | (Kind::ActivityObject, Kind::List)
                | (Kind::ActivityObjectStream, Kind::PeopleStream)
                | (Kind::ActivityObjectStream, Kind::ListStream)
        )
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kind::Activity => "activity",
            Kind::ActivityObject => "activity object",
            Kind::Person => "person",
            Kind::List => "list",
            Kind::User => "user",
            Kind::ActivityStream => "activity stream",
            Kind::ActivityObjectStream => "activity object stream",
            Kind::PeopleStream => "people stream",
            Kind::ListStream => "list stream",
            Kind::ObjectBag => "object bag",
        };
        write!(f, "{name}")
    }
}
