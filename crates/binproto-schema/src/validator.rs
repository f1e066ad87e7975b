//! Validator for BinProto schema ASTs

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::lower::{is_codec, lower_type};
use crate::{Result, SchemaError};

/// Validate a schema AST
pub fn validate(schema: &Schema) -> Result<()> {
    let mut validator = SchemaValidator::new();
    validator.validate(schema)
}

/// Schema validation context
struct SchemaValidator<'a> {
    structs: HashMap<&'a str, &'a StructDef>,
    current_field: Option<String>,
}

impl<'a> SchemaValidator<'a> {
    /// Create a new validator
    fn new() -> Self {
        Self {
            structs: HashMap::new(),
            current_field: None,
        }
    }

    /// Validate the entire schema
    fn validate(&mut self, schema: &'a Schema) -> Result<()> {
        // First pass: collect all structure names
        self.collect_struct_names(schema)?;

        // Second pass: validate every structure
        for item in &schema.structs {
            self.validate_struct(item)?;
        }

        Ok(())
    }

    /// Collect all structure names from the schema
    fn collect_struct_names(&mut self, schema: &'a Schema) -> Result<()> {
        for item in &schema.structs {
            if is_codec(&item.name) {
                return Err(SchemaError::Validation(format!(
                    "Structure name '{}' is reserved for a codec",
                    item.name
                )));
            }
            if self.structs.insert(item.name.as_str(), item).is_some() {
                return Err(SchemaError::Validation(format!(
                    "Duplicate structure name '{}' found",
                    item.name
                )));
            }
        }
        Ok(())
    }

    /// Validate a structure definition
    fn validate_struct(&mut self, item: &StructDef) -> Result<()> {
        let mut field_names = HashSet::new();
        for field in &item.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(SchemaError::Validation(format!(
                    "Duplicate field name '{}' in structure '{}'",
                    field.name, item.name
                )));
            }
        }

        for field in &item.fields {
            self.current_field = Some(format!("{}.{}", item.name, field.name));
            self.validate_type_expr(&field.type_expr)?;
            lower_type(&field.type_expr).map_err(|e| self.in_field(e))?;
        }

        self.current_field = None;
        Ok(())
    }

    /// Check selectors and array keys throughout a type expression
    fn validate_type_expr(&self, expr: &TypeExpr) -> Result<()> {
        if !is_codec(&expr.selector) && !self.structs.contains_key(expr.selector.as_str()) {
            return Err(self.in_field(SchemaError::Validation(format!(
                "Unknown type '{}'",
                expr.selector
            ))));
        }

        for option in &expr.options {
            if let OptionValue::Type(nested) = &option.value {
                self.validate_type_expr(nested)?;
            }
        }

        if expr.selector == "ArrayOf" {
            self.validate_array_key(expr)?;
        }
        Ok(())
    }

    /// A key must name a field of the structure the array holds
    fn validate_array_key(&self, expr: &TypeExpr) -> Result<()> {
        let (Some(OptionValue::String(key)), Some(OptionValue::Type(item))) =
            (expr.option("key"), expr.option("item"))
        else {
            return Ok(());
        };

        match self.structs.get(item.selector.as_str()) {
            Some(target) if target.fields.iter().any(|f| &f.name == key) => Ok(()),
            Some(target) => Err(self.in_field(SchemaError::Validation(format!(
                "Array key '{}' is not a field of '{}'",
                key, target.name
            )))),
            None => Err(self.in_field(SchemaError::Validation(format!(
                "Array key '{}' requires structure items, got '{}'",
                key, item.selector
            )))),
        }
    }

    fn in_field(&self, err: SchemaError) -> SchemaError {
        match (err, &self.current_field) {
            (SchemaError::Validation(message), Some(field)) => {
                SchemaError::Validation(format!("{message} in field '{field}'"))
            }
            (err, _) => err,
        }
    }
}
