//! Update builder tests: key extraction, SET rendering, and the gating
//! condition left over when the `matching` block says more than the key.

use crate::item::AttributeValue;
use crate::schema::{AttributeDescriptor, AttributeType, KeyAttribute, TableDefinition};
use crate::update::UpdateBuilder;
use crate::Error;

const USER_ID: AttributeDescriptor<String> = AttributeDescriptor::new("UserId");
const SCORE: AttributeDescriptor<i64> = AttributeDescriptor::new("Score");
const INT_ATTRIBUTE: AttributeDescriptor<i64> = AttributeDescriptor::new("IntAttribute");
const STR_ATTRIBUTE: AttributeDescriptor<String> = AttributeDescriptor::new("StrAttribute");

/// Hash and range key, like the ranking example table.
fn composite_definition() -> TableDefinition {
    TableDefinition::builder("rankings", KeyAttribute::new("UserId", AttributeType::String))
        .range_key(KeyAttribute::new("Score", AttributeType::Number))
        .attribute("IntAttribute", AttributeType::Number)
        .attribute("StrAttribute", AttributeType::String)
        .build()
        .unwrap()
}

/// Hash key only; Score is a plain attribute here.
fn hash_only_definition() -> TableDefinition {
    TableDefinition::builder("rankings", KeyAttribute::new("UserId", AttributeType::String))
        .attribute("Score", AttributeType::Number)
        .build()
        .unwrap()
}

fn build(
    definition: &TableDefinition,
    f: impl FnOnce(&mut UpdateBuilder),
) -> Result<crate::update::UpdateExpression, Error> {
    let mut builder = UpdateBuilder::new();
    f(&mut builder);
    builder.into_expression(definition)
}

#[test]
fn full_key_condition_yields_key_and_set_clause() {
    let update = build(&composite_definition(), |u| {
        u.set(&INT_ATTRIBUTE, 10);
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap();

    assert_eq!(update.expression, "SET #s0 = :u0");
    assert_eq!(update.names["#s0"], "IntAttribute");
    assert_eq!(update.values[":u0"], AttributeValue::number("10"));
    assert_eq!(update.key["UserId"], AttributeValue::string("username_1"));
    assert_eq!(update.key["Score"], AttributeValue::number("5"));
    assert!(update.condition.is_none());
}

#[test]
fn assignments_keep_declaration_order() {
    let update = build(&composite_definition(), |u| {
        u.set(&INT_ATTRIBUTE, 10);
        u.set(&STR_ATTRIBUTE, "patched");
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap();

    assert_eq!(update.expression, "SET #s0 = :u0, #s1 = :u1");
    assert_eq!(update.names["#s0"], "IntAttribute");
    assert_eq!(update.names["#s1"], "StrAttribute");
}

#[test]
fn assigning_a_key_attribute_fails_at_build_time() {
    let err = build(&composite_definition(), |u| {
        u.set(&SCORE, 10);
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap_err();

    assert!(matches!(err, Error::KeyAssignment(name) if name == "Score"));
}

#[test]
fn empty_patch_fails_at_build_time() {
    let err = build(&composite_definition(), |u| {
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap_err();

    assert!(matches!(err, Error::EmptyUpdate));
}

#[test]
fn missing_range_key_is_an_incomplete_key() {
    let err = build(&composite_definition(), |u| {
        u.set(&INT_ATTRIBUTE, 10);
        u.matching(|w| {
            w.eq(&USER_ID, "username_1");
        });
    })
    .unwrap_err();

    assert!(matches!(err, Error::IncompleteKey(name) if name == "Score"));
}

#[test]
fn missing_condition_is_an_incomplete_key() {
    let err = build(&composite_definition(), |u| {
        u.set(&INT_ATTRIBUTE, 10);
    })
    .unwrap_err();

    assert!(matches!(err, Error::IncompleteKey(name) if name == "UserId"));
}

#[test]
fn non_key_equality_becomes_a_gate() {
    // On the hash-only table, `Score eq 5` cannot be part of the key, so it
    // gates the update store-side instead.
    let update = build(&hash_only_definition(), |u| {
        u.set(&SCORE, 10);
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap();

    assert_eq!(update.key.len(), 1);
    assert_eq!(update.key["UserId"], AttributeValue::string("username_1"));

    let gate = update.condition.expect("gate expected");
    assert_eq!(gate.expression, "#n0 = :v0");
    assert_eq!(gate.names["#n0"], "Score");
    assert_eq!(gate.values[":v0"], AttributeValue::number("5"));
}

#[test]
fn unknown_assignment_attribute_fails_at_build_time() {
    const MISSING: AttributeDescriptor<i64> = AttributeDescriptor::new("Missing");

    let err = build(&composite_definition(), |u| {
        u.set(&MISSING, 1);
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap_err();

    assert!(matches!(err, Error::UnknownAttribute(name) if name == "Missing"));
}

#[test]
fn assignment_type_disagreement_fails_at_build_time() {
    const SCORE_AS_STRING: AttributeDescriptor<String> = AttributeDescriptor::new("Score");

    let err = build(&composite_definition(), |u| {
        u.set(&SCORE_AS_STRING, "10");
        u.matching(|w| {
            w.eq(&USER_ID, "username_1").eq(&SCORE, 5);
        });
    })
    .unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { attribute, .. } if attribute == "Score"));
}
