use std::fmt;

const SEPARATOR: &str = "::";

/// Qualified name of a declared unit, scalar, vector or vector group.
///
/// The value-equality key for every population lookup: two declarations with
/// the same namespace path and name are the same type, whatever their kind.
///
/// ```
/// use quantities_core::TypeIdentity;
///
/// let unit = TypeIdentity::from("Physics::Units::UnitOfLength");
/// assert_eq!(unit.name(), "UnitOfLength");
/// assert_eq!(unit.namespace(), ["Physics", "Units"]);
/// assert_eq!(unit, TypeIdentity::from("::Physics::Units::UnitOfLength"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity {
    namespace: Vec<String>,
    name: String,
}

impl TypeIdentity {
    /// Identity in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            namespace: Vec::new(),
            name: name.into(),
        }
    }

    /// Identity named `name` inside `namespace`, outermost segment first.
    pub fn in_namespace<I, S>(namespace: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Parse `A::B::Name`. Empty segments are skipped, so a leading `::`
    /// names the same identity.
    pub fn from_qualified_string(qualified: &str) -> Self {
        let mut segments: Vec<String> = qualified
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        let name = segments.pop().unwrap_or_default();
        Self {
            namespace: segments,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{}{}", segment, SEPARATOR)?;
        }
        f.write_str(&self.name)
    }
}

impl From<&str> for TypeIdentity {
    fn from(qualified: &str) -> Self {
        Self::from_qualified_string(qualified)
    }
}

impl From<String> for TypeIdentity {
    fn from(qualified: String) -> Self {
        Self::from_qualified_string(&qualified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn global_identity_renders_bare_name() {
        let length = TypeIdentity::global("Length");
        assert!(length.namespace().is_empty());
        assert_eq!(length.to_string(), "Length");
    }

    #[test]
    fn namespaced_identity_round_trips_through_display() {
        let speed = TypeIdentity::in_namespace(["Physics", "Kinematics"], "Speed");
        assert_eq!(speed.to_string(), "Physics::Kinematics::Speed");
        assert_eq!(TypeIdentity::from(speed.to_string()), speed);
    }

    #[test]
    fn empty_segments_are_ignored() {
        assert_eq!(
            TypeIdentity::from("::Physics::Length"),
            TypeIdentity::from("Physics::Length")
        );
        assert_eq!(TypeIdentity::from("::").name(), "");
    }

    #[test]
    fn namespace_is_part_of_the_key() {
        let mut seen = FxHashSet::default();
        seen.insert(TypeIdentity::from("Physics::Length"));

        assert!(seen.contains(&TypeIdentity::in_namespace(["Physics"], "Length")));
        assert!(!seen.contains(&TypeIdentity::global("Length")));
    }
}
