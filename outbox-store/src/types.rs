use serde::Deserialize;

/// Identifier for a send-task
///
/// A globally unique identifier (ULID) assigned when the task is created.
/// ULIDs are lexicographically sortable by creation time and
/// collision-resistant, which makes them usable as both the row key and a
/// human-pasteable tracking id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    id: ulid::Ulid,
}

impl TaskId {
    /// Create a task ID from an existing ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique task ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Parse a task ID from its string form
    ///
    /// Returns `None` if the string is not a valid ULID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        ulid::Ulid::from_string(value).ok().map(|id| Self { id })
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }

    /// Get the timestamp (milliseconds since Unix epoch) encoded in this ID
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_roundtrip() {
        let id = TaskId::generate();
        let parsed = TaskId::parse(&id.to_string()).expect("Failed to parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_task_id_rejects_garbage() {
        assert!(TaskId::parse("not-a-ulid").is_none());
        assert!(TaskId::parse("").is_none());
        assert!(TaskId::parse("../etc/passwd").is_none());
    }

    #[test]
    fn test_task_ids_sort_by_creation_time() {
        let first = TaskId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = TaskId::generate();
        assert!(first < second);
        assert!(first.timestamp_ms() <= second.timestamp_ms());
    }
}
