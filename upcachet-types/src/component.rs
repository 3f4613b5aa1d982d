//! Status-page components.

use std::fmt;

use crate::ComponentId;

/// Status code of a status-page component.
///
/// The well-known codes are provided as constants; any other value is passed
/// through to the status page untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ComponentStatus(pub u8);

impl ComponentStatus {
    pub const OPERATIONAL: ComponentStatus = ComponentStatus(1);
    pub const PERFORMANCE_ISSUES: ComponentStatus = ComponentStatus(2);
    pub const PARTIAL_OUTAGE: ComponentStatus = ComponentStatus(3);
    pub const MAJOR_OUTAGE: ComponentStatus = ComponentStatus(4);

    /// The numeric code sent to the status page.
    pub fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A component listed on the status page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
}

impl Component {
    pub fn new(id: ComponentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
