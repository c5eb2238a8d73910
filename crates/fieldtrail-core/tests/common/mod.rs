use std::sync::{Arc, Mutex};

use fieldtrail_core::types::ActorId;
use fieldtrail_core::{
    ChangeTracker, Country, EntityPolicy, EventSink, ExError, ExErrorKind, ExclusionPolicy, FieldKind, FieldMap,
    FieldValue, MemorySink, SerializerRegistry, SettingChangedEvent, TrackedEntity,
};

/// Account record shaped like a typical auth user table
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub groups: Vec<String>,
    pub password_history: Vec<String>,
}

impl User {
    #[allow(dead_code)]
    pub fn new(id: u64, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "pbkdf2_sha256$1$salt$hash".to_string(),
            is_staff: false,
            groups: Vec::new(),
            password_history: Vec::new(),
        }
    }
}

impl TrackedEntity for User {
    fn entity_kind(&self) -> &str {
        "user"
    }

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    fn field_values(&self) -> FieldMap {
        FieldMap::new()
            .with("username", self.username.as_str())
            .with("email", self.email.as_str())
            .with("password", self.password.as_str())
            .with("is_staff", self.is_staff)
            .with("groups", FieldValue::related(self.groups.iter().cloned()))
            .with(
                "passwordhistory_set",
                FieldValue::related(self.password_history.iter().cloned()),
            )
    }
}

/// Profile record hanging off a user
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub year_of_birth: Option<i64>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub country: Option<Country>,
    pub meta: serde_json::Value,
}

impl UserProfile {
    #[allow(dead_code)]
    pub fn new(id: u64, user_id: u64, name: &str) -> Self {
        Self {
            id,
            user_id,
            name: name.to_string(),
            year_of_birth: None,
            gender: None,
            bio: None,
            country: None,
            meta: serde_json::json!({}),
        }
    }
}

impl TrackedEntity for UserProfile {
    fn entity_kind(&self) -> &str {
        "user_profile"
    }

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    fn field_values(&self) -> FieldMap {
        let country = match &self.country {
            Some(country) => FieldValue::composite(country.clone()),
            None => FieldValue::Null,
        };
        FieldMap::new()
            .with("user_id", self.user_id.to_string())
            .with("name", self.name.as_str())
            .with("year_of_birth", self.year_of_birth)
            .with("gender", self.gender.clone())
            .with("bio", self.bio.clone())
            .with("country", country)
            .with("meta", self.meta.clone())
    }
}

#[allow(dead_code)]
pub fn user_policy() -> EntityPolicy {
    EntityPolicy::builder("user", "auth_user")
        .field("username", FieldKind::Text)
        .field("email", FieldKind::Text)
        .field("password", FieldKind::Text)
        .field("is_staff", FieldKind::Bool)
        .field("groups", FieldKind::Relation)
        .field("passwordhistory_set", FieldKind::Relation)
        .redact("password")
        .exclude_relations()
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn profile_policy() -> EntityPolicy {
    EntityPolicy::builder("user_profile", "auth_userprofile")
        .field("user_id", FieldKind::Text)
        .field("name", FieldKind::Text)
        .field("year_of_birth", FieldKind::Integer)
        .field("gender", FieldKind::Text)
        .field("bio", FieldKind::Text)
        .field("country", FieldKind::composite("country"))
        .field("meta", FieldKind::Json)
        .exclude("meta")
        .build()
        .unwrap()
}

/// Tracker covering users and profiles, publishing into a memory sink
#[allow(dead_code)]
pub fn new_tracker() -> (ChangeTracker, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let tracker = tracker_with_sink(sink.clone());
    (tracker, sink)
}

#[allow(dead_code)]
pub fn tracker_with_sink(sink: Arc<dyn EventSink>) -> ChangeTracker {
    let policy = ExclusionPolicy::from_entities([user_policy(), profile_policy()]).unwrap();
    ChangeTracker::new(policy, SerializerRegistry::with_defaults(), sink).unwrap()
}

#[allow(dead_code)]
pub fn actor() -> ActorId {
    ActorId::new("42")
}

/// Apply `mutate` to `entity` inside a tracked mutation
#[allow(dead_code)]
pub fn save<E, F>(tracker: &ChangeTracker, entity: &mut E, mutate: F) -> Vec<SettingChangedEvent>
where
    E: TrackedEntity,
    F: FnOnce(&mut E),
{
    tracker
        .track(entity, &actor(), |e| {
            mutate(e);
            Ok::<_, String>(())
        })
        .unwrap()
        .events
}

/// Sink that fails after accepting `accept` events
#[allow(dead_code)]
pub struct FailingSink {
    accept: usize,
    published: Mutex<Vec<SettingChangedEvent>>,
}

#[allow(dead_code)]
impl FailingSink {
    pub fn new(accept: usize) -> Self {
        Self {
            accept,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<SettingChangedEvent> {
        self.published.lock().unwrap().clone()
    }
}

impl EventSink for FailingSink {
    fn publish(&self, event: &SettingChangedEvent) -> Result<(), ExError> {
        let mut published = self.published.lock().unwrap();
        if published.len() >= self.accept {
            return Err(ExError::new(ExErrorKind::SinkFailed).with_message("transport closed"));
        }
        published.push(event.clone());
        Ok(())
    }
}
