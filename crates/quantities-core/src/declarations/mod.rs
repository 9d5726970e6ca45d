//! Raw declarations, as handed over by the declaration extractor.
//!
//! These are the inputs of the population builder. They are plain data:
//! nothing here is resolved, and references between declarations are only
//! [`TypeIdentity`] names.
//!
//! - [`UnitDeclaration`] - a unit and its named instances
//! - [`ScalarDeclaration`] - base scalar or specialization
//! - [`VectorDeclaration`] - base vector or specialization, fixed dimension
//! - [`GroupDeclaration`] - dimension-agnostic vector family
//! - [`GroupMemberDeclaration`] - one dimension-keyed member of a group
//! - [`DeclarationSet`] - the five flat, order-stable input collections

mod scalar;
mod set;
mod unit;
mod vector;

use std::fmt;

use crate::{Span, TypeIdentity};

pub use scalar::{PowerRelation, ScalarDeclaration, ScalarDefinition, ScalarProperties};
pub use set::{DeclarationSet, DeclarationStats};
pub use unit::{
    InstanceDefinition, InstanceRef, InstanceSelection, Prefix, UnitDeclaration, UnitInstance,
};
pub use vector::{
    GroupDeclaration, GroupDefinition, GroupMemberDeclaration, VectorDeclaration,
    VectorDefinition, VectorProperties,
};

/// Closed set of declaration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclarationKind {
    Unit,
    Scalar,
    Vector,
    VectorGroup,
    /// A vector that is one dimension-keyed member of a group.
    GroupMember,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Unit => "unit",
            DeclarationKind::Scalar => "scalar",
            DeclarationKind::Vector => "vector",
            DeclarationKind::VectorGroup => "vector group",
            DeclarationKind::GroupMember => "vector group member",
        }
    }

    /// Whether this kind is a concrete vector of fixed dimension.
    pub fn is_vector_like(self) -> bool {
        matches!(self, DeclarationKind::Vector | DeclarationKind::GroupMember)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything stored in a population.
pub trait Identified {
    fn identity(&self) -> &TypeIdentity;
    fn span(&self) -> Span;
}

/// A property bag whose unset slots can be filled from a parent's bag.
pub trait Inheritable: Clone {
    /// Fill every unset slot of `self` from `parent`, marking it inherited.
    fn inherit_from(&mut self, parent: &Self);
}

/// A declaration that is either a base or a specialization of an original.
pub trait Specializable: Identified {
    type Properties: Inheritable;

    /// The original this declaration specializes, `None` for a base.
    fn original(&self) -> Option<&TypeIdentity>;

    /// This declaration's own slots: everything `Explicit` for a base,
    /// the explicitly set subset for a specialization.
    fn own_properties(&self) -> Self::Properties;
}

/// Base/specialization duality shared by scalars, vectors and groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape<D, P> {
    /// Fully defined root of a chain.
    Base(D),
    /// Refines `original`; only the explicitly set slots are stored.
    Specialization { original: TypeIdentity, overrides: P },
}

impl<D, P> Shape<D, P> {
    pub fn is_base(&self) -> bool {
        matches!(self, Shape::Base(_))
    }

    pub fn original(&self) -> Option<&TypeIdentity> {
        match self {
            Shape::Base(_) => None,
            Shape::Specialization { original, .. } => Some(original),
        }
    }
}

impl<D, P> Shape<D, P>
where
    D: Clone + Into<P>,
    P: Clone,
{
    /// The declaration's own slots.
    pub fn own_properties(&self) -> P {
        match self {
            Shape::Base(definition) => definition.clone().into(),
            Shape::Specialization { overrides, .. } => overrides.clone(),
        }
    }
}
