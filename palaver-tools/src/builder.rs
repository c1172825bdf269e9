//! Builder that binds a callable into a described tool

use crate::bound::BoundTool;
use crate::callable::{Callable, FnCallable, Handler, Input, Output, Signature, ToolFn};
use crate::error::{BindError, ValidationError};
use crate::schema::ParameterField;
use palaver_core::{PropertySchema, PropertyType, ToolDescriptor};
use std::fmt;
use tracing::debug;

type Fixup = Box<dyn Fn(&str) -> String + Send + Sync>;
type Refine = Box<dyn FnOnce(&mut PropertySchema) + Send>;

enum Step {
    Bind(Vec<ParameterField>),
    Property(String, Refine),
    Required(Vec<String>),
}

/// Builder for [`BoundTool`]
///
/// Options are applied in call order when [`build`](Self::build) runs;
/// parameter fixups run after all of them, in registration order. The first
/// error wins and no tool is produced.
///
/// ```rust,ignore
/// let tool = BoundTool::builder()
///     .func(find_orders)
///     .description("finds orders")
///     .enumerate("status", ["pending", "delivered"])
///     .camel_names()
///     .build()?;
/// ```
#[derive(Default)]
pub struct ToolBuilder {
    name: Option<String>,
    inferred_name: Option<String>,
    description: String,
    signature: Option<Signature>,
    handler: Option<Handler>,
    steps: Vec<Step>,
    fixups: Vec<Fixup>,
    error: Option<BindError>,
}

impl ToolBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tool name; otherwise it is inferred from the function
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set what the tool does
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Bind a Rust function
    pub fn func<F, Args, M>(self, func: F) -> Self
    where
        F: ToolFn<Args, M>,
        Args: 'static,
        M: 'static,
    {
        self.callable(FnCallable::new(func))
    }

    /// Bind any callable; its signature is checked here
    pub fn callable(mut self, callable: impl Callable) -> Self {
        if self.error.is_some() {
            return self;
        }

        let signature = callable.signature();
        let tool = self
            .name
            .clone()
            .or_else(|| callable.name())
            .unwrap_or_default();

        if !valid_inputs(&signature.inputs) {
            self.error = Some(BindError::InputArity { tool });
            return self;
        }
        if !valid_outputs(&signature.outputs) {
            self.error = Some(BindError::OutputArity { tool });
            return self;
        }

        self.inferred_name = callable.name();
        self.steps.push(Step::Bind(callable.parameters()));
        self.signature = Some(signature);
        self.handler = Some(callable.into_handler());
        self
    }

    /// Declare a parameter, or replace the type and description of one
    pub fn parameter(
        self,
        name: impl Into<String>,
        kind: impl Into<PropertyType>,
        description: impl Into<String>,
    ) -> Self {
        let kind = kind.into();
        let description = description.into();
        self.refine(name, move |p| {
            p.kind = Some(kind);
            p.description = description;
        })
    }

    /// Add allowed values for a parameter
    ///
    /// Values are advertised to the model but not enforced.
    pub fn enumerate(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.refine(name, move |p| p.enumeration.extend(values))
    }

    /// Mark parameters as required
    pub fn required(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.steps
            .push(Step::Required(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Rename every parameter; mapping a name to `""` removes it
    pub fn fix_parameter_names<F>(mut self, fix: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.fixups.push(Box::new(fix));
        self
    }

    /// Rename every parameter to lowerCamelCase
    pub fn camel_names(self) -> Self {
        self.fix_parameter_names(to_lower_camel)
    }

    fn refine<F>(mut self, name: impl Into<String>, refine: F) -> Self
    where
        F: FnOnce(&mut PropertySchema) + Send + 'static,
    {
        self.steps.push(Step::Property(name.into(), Box::new(refine)));
        self
    }

    /// Apply all options, validate, and produce the tool
    pub fn build(self) -> Result<BoundTool, BindError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let name = self.name.or(self.inferred_name).unwrap_or_default();
        let (signature, handler) = match (self.signature, self.handler) {
            (Some(signature), Some(handler)) => (signature, handler),
            _ => return Err(BindError::MissingFunction { tool: name }),
        };

        let mut descriptor = ToolDescriptor {
            name,
            description: self.description,
            ..ToolDescriptor::default()
        };

        let mut decode_keys = Vec::new();
        for step in self.steps {
            match step {
                Step::Bind(fields) => {
                    decode_keys.extend(
                        fields
                            .iter()
                            .filter_map(|f| Some((f.name.clone(), f.key.clone()?))),
                    );
                    bind_fields(&mut descriptor, fields);
                }
                Step::Property(name, refine) => {
                    refine(descriptor.properties.entry(name).or_default());
                }
                Step::Required(names) => {
                    for name in names {
                        add_required(&mut descriptor, name);
                    }
                }
            }
        }

        // (advertised name, decode key) for every property
        let mut names: Vec<(String, String)> = descriptor
            .properties
            .keys()
            .map(|name| {
                let key = decode_keys
                    .iter()
                    .find(|(advertised, _)| advertised == name)
                    .map_or(name, |(_, key)| key);
                (name.clone(), key.clone())
            })
            .collect();
        for fixup in &self.fixups {
            rename_parameters(&mut descriptor, fixup);
            names.retain_mut(|(advertised, _)| {
                *advertised = fixup(advertised.as_str());
                !advertised.is_empty()
            });
        }
        names.retain(|(advertised, key)| advertised != key);

        validate(&descriptor)?;
        debug!(
            tool = %descriptor.name,
            parameters = descriptor.properties.len(),
            "Bound tool"
        );

        Ok(BoundTool::new(
            descriptor,
            handler,
            signature.expects_context(),
            signature.returns_errors(),
        )
        .with_renames(names))
    }
}

impl fmt::Debug for ToolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBuilder")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("signature", &self.signature)
            .field("steps", &self.steps.len())
            .field("fixups", &self.fixups.len())
            .finish()
    }
}

fn valid_inputs(inputs: &[Input]) -> bool {
    matches!(
        inputs,
        [] | [Input::Parameters] | [Input::Context, Input::Parameters]
    )
}

fn valid_outputs(outputs: &[Output]) -> bool {
    matches!(outputs, [Output::Content] | [Output::Content, Output::Error])
}

// Introspected fields fill an unset type and overwrite the description only
// when they carry one.
fn bind_fields(descriptor: &mut ToolDescriptor, fields: Vec<ParameterField>) {
    for field in fields {
        let property = descriptor.properties.entry(field.name.clone()).or_default();
        if let Some(description) = field.description {
            property.description = description;
        }
        if property.kind.as_ref().map_or(true, PropertyType::is_empty) {
            property.kind = field.kind;
        }
        if !field.optional {
            add_required(descriptor, field.name);
        }
    }
}

fn add_required(descriptor: &mut ToolDescriptor, name: String) {
    if !descriptor.is_required(&name) {
        descriptor.required.push(name);
    }
}

fn rename_parameters(descriptor: &mut ToolDescriptor, fix: &Fixup) {
    let properties = std::mem::take(&mut descriptor.properties);
    for (name, property) in properties {
        let renamed = fix(&name);
        if !renamed.is_empty() {
            descriptor.properties.insert(renamed, property);
        }
    }

    let required = std::mem::take(&mut descriptor.required);
    for name in required {
        let renamed = fix(&name);
        if !renamed.is_empty() {
            add_required(descriptor, renamed);
        }
    }
}

fn validate(descriptor: &ToolDescriptor) -> Result<(), ValidationError> {
    if descriptor.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if descriptor.description.is_empty() {
        return Err(ValidationError::MissingDescription {
            tool: descriptor.name.clone(),
        });
    }
    for (name, property) in &descriptor.properties {
        if name.is_empty() {
            return Err(ValidationError::UnnamedParameter {
                tool: descriptor.name.clone(),
            });
        }
        if property.kind.as_ref().map_or(true, PropertyType::is_empty) {
            return Err(ValidationError::MissingParameterType {
                parameter: name.clone(),
            });
        }
        if property.description.is_empty() {
            return Err(ValidationError::MissingParameterDescription {
                parameter: name.clone(),
            });
        }
    }
    for name in &descriptor.required {
        if !descriptor.properties.contains_key(name) {
            return Err(ValidationError::UnknownRequired {
                parameter: name.clone(),
            });
        }
    }
    Ok(())
}

/// Convert `order_id` or `OrderId` to `orderId`
pub fn to_lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, c) in name.chars().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            upper_next = !out.is_empty();
        } else if i == 0 || out.is_empty() {
            out.extend(c.to_lowercase());
            upper_next = false;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::{HandlerError, RawCallable};
    use crate::schema::ToolParameters;
    use crate::Optional;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Deserialize)]
    struct OrderQuery {
        #[allow(dead_code)]
        order_id: u64,
        #[allow(dead_code)]
        status: Optional<String>,
    }

    impl ToolParameters for OrderQuery {
        fn parameters() -> Vec<ParameterField> {
            vec![
                ParameterField::new("order_id", PropertyType::Number).description("order to find"),
                ParameterField::new("status", PropertyType::String)
                    .description("order status")
                    .optional(),
            ]
        }
    }

    fn find_order(_: OrderQuery) -> Vec<String> {
        Vec::new()
    }

    fn raw(inputs: Vec<Input>, outputs: Vec<Output>) -> RawCallable {
        RawCallable::new(Signature::new(inputs, outputs), |_, _| Ok(Value::Null)).name("raw")
    }

    #[test]
    fn test_bind_infers_name_and_required() {
        let tool = ToolBuilder::new()
            .func(find_order)
            .description("finds an order")
            .build()
            .unwrap();

        let d = tool.descriptor();
        assert_eq!(d.name, "find_order");
        assert_eq!(
            d.properties.keys().collect::<Vec<_>>(),
            vec!["order_id", "status"]
        );
        assert_eq!(d.required, vec!["order_id".to_string()]);
        assert!(!tool.expects_context());
        assert!(!tool.returns_errors());
    }

    #[test]
    fn test_input_arity() {
        for inputs in [
            vec![Input::Context],
            vec![Input::Parameters, Input::Context],
            vec![Input::Parameters, Input::Parameters],
            vec![Input::Context, Input::Parameters, Input::Parameters],
        ] {
            let err = ToolBuilder::new()
                .callable(raw(inputs, vec![Output::Content]))
                .description("x")
                .build()
                .unwrap_err();
            assert_eq!(err, BindError::InputArity { tool: "raw".into() });
        }
    }

    #[test]
    fn test_output_arity() {
        for outputs in [
            vec![],
            vec![Output::Error],
            vec![Output::Content, Output::Content],
            vec![Output::Content, Output::Error, Output::Error],
        ] {
            let err = ToolBuilder::new()
                .callable(raw(vec![Input::Parameters], outputs))
                .description("x")
                .build()
                .unwrap_err();
            assert_eq!(err, BindError::OutputArity { tool: "raw".into() });
        }
    }

    #[test]
    fn test_valid_raw_signatures() {
        for inputs in [
            vec![],
            vec![Input::Parameters],
            vec![Input::Context, Input::Parameters],
        ] {
            let tool = ToolBuilder::new()
                .callable(raw(inputs, vec![Output::Content, Output::Error]))
                .description("x")
                .build()
                .unwrap();
            assert!(tool.returns_errors());
        }
    }

    #[test]
    fn test_missing_function() {
        let err = ToolBuilder::new()
            .name("nothing")
            .description("does nothing")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::MissingFunction {
                tool: "nothing".into()
            }
        );
    }

    #[test]
    fn test_refinements_merge_in_order() {
        let tool = ToolBuilder::new()
            .name("orders")
            .description("lists orders")
            .parameter("status", "string", "first")
            .func(find_order)
            .enumerate("status", ["pending", "delivered"])
            .enumerate("status", ["cancelled"])
            .parameter("when", "datetime", "delivery time")
            .required(["when"])
            .build()
            .unwrap();

        let d = tool.descriptor();
        let status = d.property("status").unwrap();
        // The bound field carries a description, so it replaces "first".
        assert_eq!(status.description, "order status");
        assert_eq!(status.enumeration, vec!["pending", "delivered", "cancelled"]);
        assert_eq!(
            d.property("when").unwrap().kind,
            Some(PropertyType::Custom("datetime".into()))
        );
        assert_eq!(d.required, vec!["order_id".to_string(), "when".to_string()]);
    }

    #[test]
    fn test_bound_field_keeps_explicit_type() {
        let tool = ToolBuilder::new()
            .description("x")
            .parameter("order_id", "string", "order reference")
            .func(find_order)
            .build()
            .unwrap();
        let order_id = tool.descriptor().property("order_id").unwrap();
        assert_eq!(order_id.kind, Some(PropertyType::String));
        assert_eq!(order_id.description, "order to find");
    }

    #[test]
    fn test_fixups_rename_and_delete() {
        let tool = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .camel_names()
            .build()
            .unwrap();
        let d = tool.descriptor();
        assert!(d.property("orderId").is_some());
        assert_eq!(d.required, vec!["orderId".to_string()]);

        let tool = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .fix_parameter_names(|name| {
                if name == "order_id" {
                    String::new()
                } else {
                    name.to_uppercase()
                }
            })
            .build()
            .unwrap();
        let d = tool.descriptor();
        assert_eq!(d.properties.keys().collect::<Vec<_>>(), vec!["STATUS"]);
        assert!(d.required.is_empty());
    }

    #[derive(Deserialize)]
    struct Lookup {
        order_id: u64,
        status: Optional<String>,
    }

    impl ToolParameters for Lookup {
        fn parameters() -> Vec<ParameterField> {
            OrderQuery::parameters()
        }
    }

    fn lookup(query: Lookup) -> String {
        format!("{}:{}", query.order_id, query.status.unwrap_or("any".into()))
    }

    #[test]
    fn test_renamed_parameters_decode_under_advertised_names() {
        let tool = ToolBuilder::new()
            .func(lookup)
            .description("looks up an order")
            .camel_names()
            .build()
            .unwrap();
        assert_eq!(tool.descriptor().required, vec!["orderId".to_string()]);

        let ctx = Default::default();
        assert_eq!(tool.call(&ctx, &json!({ "orderId": 7 })).unwrap(), json!("7:any"));
        assert_eq!(
            tool.call(&ctx, &json!({ "orderId": 7, "status": "pending" }))
                .unwrap(),
            json!("7:pending")
        );
        // the struct's own names still decode
        assert_eq!(tool.call(&ctx, &json!({ "order_id": 8 })).unwrap(), json!("8:any"));
    }

    #[derive(Deserialize)]
    struct Keyed {
        order_id: u64,
    }

    impl ToolParameters for Keyed {
        fn parameters() -> Vec<ParameterField> {
            vec![ParameterField::new("ref", PropertyType::Number)
                .description("order reference")
                .decoded_from("order_id")]
        }
    }

    #[test]
    fn test_field_decode_key_survives_fixups() {
        let tool = ToolBuilder::new()
            .name("keyed")
            .description("x")
            .func(|k: Keyed| k.order_id)
            .build()
            .unwrap();
        assert_eq!(tool.descriptor().required, vec!["ref".to_string()]);
        assert_eq!(tool.call(&Default::default(), &json!({ "ref": 3 })).unwrap(), json!(3));

        let tool = ToolBuilder::new()
            .name("keyed")
            .description("x")
            .func(|k: Keyed| k.order_id)
            .fix_parameter_names(|name| name.to_uppercase())
            .build()
            .unwrap();
        assert_eq!(tool.call(&Default::default(), &json!({ "REF": 4 })).unwrap(), json!(4));
    }

    #[test]
    fn test_chained_fixups_map_back_to_the_field() {
        let tool = ToolBuilder::new()
            .func(lookup)
            .description("looks up an order")
            .fix_parameter_names(|name| format!("{}_x", name))
            .camel_names()
            .build()
            .unwrap();
        let out = tool
            .call(&Default::default(), &json!({ "orderIdX": 1, "statusX": "done" }))
            .unwrap();
        assert_eq!(out, json!("1:done"));
    }

    #[test]
    fn test_fixups_run_in_registration_order() {
        let tool = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .fix_parameter_names(|name| format!("{}_x", name))
            .camel_names()
            .build()
            .unwrap();
        assert!(tool.descriptor().property("orderIdX").is_some());
    }

    #[test]
    fn test_validation_order() {
        let err = ToolBuilder::new().func(|| 1).description("x").build().unwrap_err();
        assert_eq!(err, BindError::Invalid(ValidationError::MissingName));

        let err = ToolBuilder::new().func(find_order).build().unwrap_err();
        assert_eq!(
            err,
            BindError::Invalid(ValidationError::MissingDescription {
                tool: "find_order".into()
            })
        );

        let err = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .enumerate("color", ["red"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::Invalid(ValidationError::MissingParameterType {
                parameter: "color".into()
            })
        );

        let err = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .parameter("color", "string", "")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::Invalid(ValidationError::MissingParameterDescription {
                parameter: "color".into()
            })
        );

        let err = ToolBuilder::new()
            .func(find_order)
            .description("x")
            .required(["ghost"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::Invalid(ValidationError::UnknownRequired {
                parameter: "ghost".into()
            })
        );
    }

    #[test]
    fn test_first_error_wins() {
        let err = ToolBuilder::new()
            .callable(raw(vec![Input::Context], vec![Output::Content]))
            .callable(raw(vec![Input::Parameters], vec![]))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::InputArity { .. }));
    }

    #[test]
    fn test_raw_callable_parameters() {
        let tool = ToolBuilder::new()
            .callable(
                RawCallable::new(
                    Signature::new(vec![Input::Parameters], vec![Output::Content, Output::Error]),
                    |_, args| {
                        args.get("n")
                            .cloned()
                            .ok_or_else(|| HandlerError::Invocation("n is missing".into()))
                    },
                )
                .name("echo")
                .parameter(ParameterField::new("n", PropertyType::Number).description("a number")),
            )
            .description("echoes n")
            .build()
            .unwrap();
        assert_eq!(tool.descriptor().required, vec!["n".to_string()]);
        assert_eq!(
            tool.call(&Default::default(), &json!({ "n": 3 })).unwrap(),
            json!(3)
        );
    }

    #[test]
    fn test_to_lower_camel() {
        assert_eq!(to_lower_camel("order_id"), "orderId");
        assert_eq!(to_lower_camel("OrderId"), "orderId");
        assert_eq!(to_lower_camel("customer-name"), "customerName");
        assert_eq!(to_lower_camel("name"), "name");
        assert_eq!(to_lower_camel("_leading"), "leading");
        assert_eq!(to_lower_camel(""), "");
    }
}
