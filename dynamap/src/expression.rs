//! Rendering conditions into the store's expression language.
//!
//! Every attribute gets a `#nN` name alias and every bound value a `:vN`
//! placeholder, numbered in declaration order, so a fixed condition always
//! renders to the same expression string. Aliasing also keeps attribute names
//! clear of the store's reserved words.

use crate::condition::{Comparator, Condition};
use crate::error::Error;
use crate::item::AttributeValue;
use crate::schema::TableDefinition;
use std::collections::HashMap;

/// A rendered condition: expression string plus the alias and value binding
/// tables the store resolves it against.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Render `condition` against `definition`. Fails before any store call when
/// a term references an undeclared attribute or disagrees with its declared
/// type.
pub(crate) fn build_condition(
    condition: &Condition,
    definition: &TableDefinition,
) -> Result<ConditionExpression, Error> {
    let mut expression = String::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut next_value = 0usize;

    for (index, term) in condition.terms.iter().enumerate() {
        let declared = definition
            .declared_type(term.attribute)
            .ok_or_else(|| Error::UnknownAttribute(term.attribute.to_string()))?;
        if declared != term.attribute_type {
            return Err(Error::mismatch(
                term.attribute,
                crate::codec::TypeMismatch {
                    expected: declared,
                    found: term.attribute_type.as_str(),
                },
            ));
        }

        let name_alias = format!("#n{index}");
        names.insert(name_alias.clone(), term.attribute.to_string());

        let mut placeholders = Vec::with_capacity(term.values.len());
        for value in &term.values {
            let placeholder = format!(":v{next_value}");
            next_value += 1;
            values.insert(placeholder.clone(), value.clone());
            placeholders.push(placeholder);
        }

        if index > 0 {
            expression.push_str(" AND ");
        }
        expression.push_str(&render_term(term.comparator, &name_alias, &placeholders));
    }

    Ok(ConditionExpression {
        expression,
        names,
        values,
    })
}

fn render_term(comparator: Comparator, name: &str, placeholders: &[String]) -> String {
    match comparator {
        Comparator::Eq => format!("{name} = {}", placeholders[0]),
        Comparator::Lt => format!("{name} < {}", placeholders[0]),
        Comparator::Le => format!("{name} <= {}", placeholders[0]),
        Comparator::Gt => format!("{name} > {}", placeholders[0]),
        Comparator::Ge => format!("{name} >= {}", placeholders[0]),
        Comparator::Between => {
            format!("{name} BETWEEN {} AND {}", placeholders[0], placeholders[1])
        }
        Comparator::BeginsWith => format!("begins_with({name}, {})", placeholders[0]),
    }
}
