//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use quantities::prelude::*;

pub fn id(name: &str) -> TypeIdentity {
    TypeIdentity::global(name)
}

pub fn at(line: u32) -> Span {
    Span::point(line, 1)
}

pub fn resolve(set: DeclarationSet) -> Resolution {
    Resolver::default()
        .resolve(set)
        .unwrap_or_else(|e| panic!("resolution aborted: {}", e))
}

/// Codes reported for `identity`, in report order.
pub fn codes_for(resolution: &Resolution, identity: &str) -> Vec<DiagnosticCode> {
    resolution
        .diagnostics()
        .iter()
        .filter(|d| d.identity() == &id(identity))
        .map(|d| d.code())
        .collect()
}

pub fn unit(identity: &str, quantity: &str, instances: &[(&str, &str)]) -> UnitDeclaration {
    instances.iter().fold(
        UnitDeclaration::new(identity, Span::default()).with_quantity(quantity),
        |unit, (name, plural)| unit.with_instance(UnitInstance::fixed(*name, *plural, 1.0)),
    )
}

/// Length and Area with their units, Distance specializing Length.
pub fn length_and_area() -> DeclarationSet {
    DeclarationSet::new()
        .with_unit(unit("UnitOfLength", "Length", &[("Metre", "Metres")]))
        .with_unit(unit("UnitOfArea", "Area", &[("SquareMetre", "SquareMetres")]))
        .with_scalar(ScalarDeclaration::base(
            "Length",
            at(10),
            ScalarDefinition::new("UnitOfLength")
                .with_power(PowerRelation::Square, "Area")
                .with_default_unit_instance("Metre"),
        ))
        .with_scalar(ScalarDeclaration::base(
            "Area",
            at(11),
            ScalarDefinition::new("UnitOfArea").with_power(PowerRelation::SquareRoot, "Length"),
        ))
        .with_scalar(ScalarDeclaration::specialization(
            "Distance",
            at(12),
            "Length",
            ScalarProperties::new(),
        ))
}

/// A position group with members of dimension 2 and 3, plus vectors of
/// dimension 3 and 4 whose difference names the group.
pub fn position_group() -> DeclarationSet {
    let mut set = DeclarationSet::new()
        .with_unit(unit("UnitOfLength", "Length", &[("Metre", "Metres")]))
        .with_scalar(ScalarDeclaration::base(
            "Length",
            at(1),
            ScalarDefinition::new("UnitOfLength"),
        ));
    set.merge(positions());
    set
}

/// [`length_and_area`] and the position declarations of [`position_group`].
pub fn everything() -> DeclarationSet {
    let mut set = length_and_area();
    set.merge(positions());
    set
}

fn positions() -> DeclarationSet {
    DeclarationSet::new()
        .with_group(GroupDeclaration::base(
            "Position",
            at(2),
            GroupDefinition::new("UnitOfLength").with_scalar("Length"),
        ))
        .with_member(GroupMemberDeclaration::new("Position2", at(3), "Position", 2))
        .with_member(GroupMemberDeclaration::new("Position3", at(4), "Position", 3))
        .with_vector(VectorDeclaration::base(
            "Displacement3",
            at(5),
            VectorDefinition::new("UnitOfLength", 3)
                .with_scalar("Length")
                .with_difference("Position"),
        ))
        .with_vector(VectorDeclaration::base(
            "Displacement4",
            at(6),
            VectorDefinition::new("UnitOfLength", 4)
                .with_scalar("Length")
                .with_difference("Position"),
        ))
}
