//! Tri-state property slots.
//!
//! Every inheritable property of a declaration is stored as a [`Property`]:
//!
//! ```text
//! Unset        - not mentioned by this declaration; inherit from the original
//! Explicit(v)  - set by this declaration
//! Inherited(v) - filled from the nearest ancestor that sets it
//! ```
//!
//! A raw specialization only ever holds `Unset` or `Explicit`. `Inherited` is
//! produced by chain resolution. An optional value that was explicitly cleared
//! is `Explicit(None)`, which is distinct from `Unset`.

/// A property slot that records whether the value was set, inherited, or absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Property<T> {
    /// Not set here. After resolution this means "absent, not generated".
    #[default]
    Unset,
    /// Set by the declaration itself.
    Explicit(T),
    /// Filled from an ancestor.
    Inherited(T),
}

impl<T> Property<T> {
    /// The value regardless of where it came from.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        match self {
            Property::Unset => None,
            Property::Explicit(v) | Property::Inherited(v) => Some(v),
        }
    }

    /// The value only if this declaration set it.
    #[inline]
    pub fn explicit(&self) -> Option<&T> {
        match self {
            Property::Explicit(v) => Some(v),
            _ => None,
        }
    }

    /// Consume the slot, returning its value.
    #[inline]
    pub fn into_value(self) -> Option<T> {
        match self {
            Property::Unset => None,
            Property::Explicit(v) | Property::Inherited(v) => Some(v),
        }
    }

    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Property::Unset)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    #[inline]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Property::Explicit(_))
    }

    #[inline]
    pub fn is_inherited(&self) -> bool {
        matches!(self, Property::Inherited(_))
    }

    /// Drop the value, leaving the slot absent.
    #[inline]
    pub fn clear(&mut self) {
        *self = Property::Unset;
    }

    /// Replace the value while keeping its provenance.
    ///
    /// Does nothing on an `Unset` slot.
    pub fn replace(&mut self, value: T) {
        match self {
            Property::Unset => {}
            Property::Explicit(v) | Property::Inherited(v) => *v = value,
        }
    }

    /// Map the value, keeping provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Property<U> {
        match self {
            Property::Unset => Property::Unset,
            Property::Explicit(v) => Property::Explicit(f(v)),
            Property::Inherited(v) => Property::Inherited(f(v)),
        }
    }

    /// Borrowing view of the slot.
    pub fn as_ref(&self) -> Property<&T> {
        match self {
            Property::Unset => Property::Unset,
            Property::Explicit(v) => Property::Explicit(v),
            Property::Inherited(v) => Property::Inherited(v),
        }
    }
}

impl<T: Clone> Property<T> {
    /// The slot as a child would see it: any set value becomes `Inherited`.
    pub fn inherited(&self) -> Property<T> {
        match self.value() {
            Some(v) => Property::Inherited(v.clone()),
            None => Property::Unset,
        }
    }

    /// Fill an unset slot from the parent's slot.
    ///
    /// Explicit values are never overwritten.
    #[inline]
    pub fn inherit(&mut self, parent: &Property<T>) {
        if self.is_unset() {
            *self = parent.inherited();
        }
    }
}

impl<T> Property<Option<T>> {
    /// The inner value of an optional property, if both layers are present.
    pub fn flatten(&self) -> Option<&T> {
        self.value().and_then(Option::as_ref)
    }
}

impl Property<bool> {
    /// Value of a flag, with absent treated as `false`.
    pub fn enabled(&self) -> bool {
        self.value().copied().unwrap_or(false)
    }
}

impl<T> From<Option<T>> for Property<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Property::Explicit(v),
            None => Property::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_fills_only_unset() {
        let parent = Property::Explicit(3);

        let mut unset = Property::Unset;
        unset.inherit(&parent);
        assert_eq!(unset, Property::Inherited(3));

        let mut own = Property::Explicit(7);
        own.inherit(&parent);
        assert_eq!(own, Property::Explicit(7));
    }

    #[test]
    fn inherited_values_stay_inherited_down_the_chain() {
        let root = Property::Explicit("Metre");
        let mut middle = Property::Unset;
        middle.inherit(&root);
        let mut leaf = Property::Unset;
        leaf.inherit(&middle);
        assert_eq!(leaf, Property::Inherited("Metre"));
    }

    #[test]
    fn explicit_none_is_not_unset() {
        let cleared: Property<Option<u32>> = Property::Explicit(None);
        assert!(cleared.is_set());
        assert_eq!(cleared.flatten(), None);

        let mut child = Property::Unset;
        child.inherit(&cleared);
        assert_eq!(child, Property::Inherited(None));
    }

    #[test]
    fn replace_keeps_provenance() {
        let mut p = Property::Inherited(1);
        p.replace(2);
        assert_eq!(p, Property::Inherited(2));

        let mut unset: Property<i32> = Property::Unset;
        unset.replace(2);
        assert!(unset.is_unset());
    }

    #[test]
    fn flag_defaults_to_disabled() {
        assert!(!Property::<bool>::Unset.enabled());
        assert!(Property::Inherited(true).enabled());
    }
}
