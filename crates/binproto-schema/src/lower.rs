//! Lowering of schema ASTs to runtime type definitions

use std::collections::HashSet;

use binproto::{ArrayOptions, Shape, Size, StringOptions, StructureDefinition, TypeDef};

use crate::ast::*;
use crate::{Result, SchemaError};

/// Whether `selector` names a built-in codec kind
pub fn is_codec(selector: &str) -> bool {
    selector == "ArrayOf" || TypeDef::from_selector(selector).is_some()
}

/// Lower every structure of a schema to a record-backed shape
pub fn lower(schema: &Schema) -> Result<Vec<Shape>> {
    schema
        .structs
        .iter()
        .map(|s| -> Result<Shape> { Ok(Shape::record(s.name.clone(), lower_struct(s)?)) })
        .collect()
}

/// Lower the fields of a structure, keeping their order
pub fn lower_struct(item: &StructDef) -> Result<StructureDefinition> {
    item.fields
        .iter()
        .try_fold(StructureDefinition::new(), |definition, field| -> Result<_> {
            Ok(definition.field(field.name.clone(), lower_type(&field.type_expr)?))
        })
}

/// Lower a type expression
///
/// Selectors that are not codec kinds become [`TypeDef::Named`] references,
/// resolved against the shapes registered with the protocol.
pub fn lower_type(expr: &TypeExpr) -> Result<TypeDef> {
    check_unique_options(expr)?;
    match expr.selector.as_str() {
        "BinaryString" | "NullableString" => lower_string(expr),
        "ArrayOf" => lower_array(expr),
        selector => {
            if !expr.options.is_empty() {
                return Err(SchemaError::Validation(format!(
                    "`{selector}` does not take options"
                )));
            }
            Ok(TypeDef::from_selector(selector).unwrap_or_else(|| TypeDef::named(selector)))
        }
    }
}

fn lower_string(expr: &TypeExpr) -> Result<TypeDef> {
    let nullable_kind = expr.selector == "NullableString";
    let mut options = StringOptions::new();
    for option in &expr.options {
        options = match (option.name.as_str(), &option.value) {
            ("size", value) => options.size(lower_size(expr, value)?),
            ("envelope", OptionValue::Type(envelope)) => options.envelope(lower_type(envelope)?),
            ("nullable", OptionValue::Bool(nullable)) if !nullable_kind => options.nullable(*nullable),
            _ => return Err(invalid_option(expr, option)),
        };
    }
    Ok(if nullable_kind {
        TypeDef::NullableString(options)
    } else {
        TypeDef::BinaryString(options)
    })
}

fn lower_array(expr: &TypeExpr) -> Result<TypeDef> {
    let item = match expr.option("item") {
        Some(OptionValue::Type(item)) => lower_type(item)?,
        Some(_) => {
            return Err(SchemaError::Validation(
                "Option `item` of `ArrayOf` expects a type".to_string(),
            ))
        }
        None => {
            return Err(SchemaError::Validation(
                "`ArrayOf` requires the `item` option".to_string(),
            ))
        }
    };

    let mut options = ArrayOptions::new(item);
    for option in &expr.options {
        options = match (option.name.as_str(), &option.value) {
            ("item", _) => options,
            ("size", value) => options.size(lower_size(expr, value)?),
            ("key", OptionValue::String(key)) => options.key(key.clone()),
            ("nullable", OptionValue::Bool(nullable)) => options.nullable(*nullable),
            _ => return Err(invalid_option(expr, option)),
        };
    }
    Ok(TypeDef::ArrayOf(options))
}

fn lower_size(expr: &TypeExpr, value: &OptionValue) -> Result<Size> {
    match value {
        OptionValue::Type(prefix) => Ok(Size::from(lower_type(prefix)?)),
        OptionValue::Integer(n) if *n >= 0 => Ok(Size::Fixed(*n as usize)),
        other => Err(SchemaError::Validation(format!(
            "Option `size` of `{}` expects a type or a non-negative integer, got {other}",
            expr.selector
        ))),
    }
}

fn check_unique_options(expr: &TypeExpr) -> Result<()> {
    let mut seen = HashSet::new();
    for option in &expr.options {
        if !seen.insert(option.name.as_str()) {
            return Err(SchemaError::Validation(format!(
                "Option `{}` of `{}` is given more than once",
                option.name, expr.selector
            )));
        }
    }
    Ok(())
}

fn invalid_option(expr: &TypeExpr, option: &TypeOption) -> SchemaError {
    let expected = match (expr.selector.as_str(), option.name.as_str()) {
        ("BinaryString", "nullable") | ("ArrayOf", "nullable") => "a bool",
        ("ArrayOf", "key") => "a string",
        (_, "envelope") => "a type",
        _ => {
            return SchemaError::Validation(format!(
                "Unknown option `{}` for `{}`",
                option.name, expr.selector
            ))
        }
    };
    SchemaError::Validation(format!(
        "Option `{}` of `{}` expects {expected}, got {}",
        option.name, expr.selector, option.value
    ))
}
