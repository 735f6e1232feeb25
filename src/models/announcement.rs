use serde_json::Value;

/// A participant-originated request to inject a route into the
/// exchange's BGP session; forwarded to the speaker verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement(Value);

impl Announcement {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Announcement {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
