//! Binding typed functions into tools and dispatching calls to them

use chrono::{DateTime, Utc};
use palaver::tools::{
    BindError, BoundTool, Optional, ToolErrorKind, ToolParameters, Toolkit, ValidationError,
};
use palaver::{PropertyType, Role, ToolCall, ToolContext};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
struct Order {
    id: String,
    status: String,
    description: String,
    time: DateTime<Utc>,
}

fn orders() -> Vec<Order> {
    let order = |id: &str, status: &str, description: &str, time: &str| Order {
        id: id.into(),
        status: status.into(),
        description: description.into(),
        time: time.parse().unwrap(),
    };
    vec![
        order("1001", "completed", "large pepperoni pizza", "2024-07-01T18:00:00Z"),
        order("1002", "delivering", "two calzones", "2024-07-02T19:30:00Z"),
        order("1003", "pending", "garden salad", "2024-07-03T12:15:00Z"),
    ]
}

#[derive(Deserialize, ToolParameters)]
#[tool(crate = "palaver::tools")]
struct FindOrders {
    #[tool(description = "only return orders matching this ID")]
    id: Optional<String>,
    #[tool(type = "datetime", description = "only return orders created on or after this time")]
    start: Optional<DateTime<Utc>>,
    #[tool(type = "datetime", description = "only return orders created on or before this time")]
    end: Optional<DateTime<Utc>>,
    #[tool(description = "only return orders with the specified status")]
    status: Optional<String>,
    /// only return orders whose full text matches this description
    description: Optional<String>,
}

fn find_orders(q: FindOrders) -> anyhow::Result<Vec<Order>> {
    let mut results = orders();
    if let Optional::Present(id) = &q.id {
        results.retain(|o| &o.id == id);
    }
    if let Optional::Present(start) = q.start {
        results.retain(|o| o.time >= start);
    }
    if let Optional::Present(end) = q.end {
        results.retain(|o| o.time <= end);
    }
    if let Optional::Present(status) = &q.status {
        results.retain(|o| &o.status == status);
    }
    if let Optional::Present(text) = &q.description {
        let text = text.trim().to_lowercase();
        results.retain(|o| o.description.to_lowercase().contains(&text));
    }
    Ok(results)
}

fn order_tool() -> BoundTool {
    BoundTool::builder()
        .description("Finds orders, applying various search parameters.")
        .func(find_orders)
        .enumerate("status", ["completed", "delivering", "preparing", "pending"])
        .build()
        .unwrap()
}

#[test]
fn test_descriptor_from_parameter_struct() {
    let tool = order_tool();
    let d = tool.descriptor();

    assert_eq!(d.name, "find_orders");
    let names: Vec<_> = d.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["id", "start", "end", "status", "description"]);
    assert!(d.required.is_empty());
    assert_eq!(
        d.property("start").unwrap().kind,
        Some(PropertyType::Custom("datetime".into()))
    );
    assert_eq!(
        d.property("description").unwrap().description,
        "only return orders whose full text matches this description"
    );
    assert_eq!(
        d.property("status").unwrap().enumeration,
        vec!["completed", "delivering", "preparing", "pending"]
    );
    assert!(!tool.expects_context());
    assert!(tool.returns_errors());
}

#[test]
fn test_dispatch_filters() {
    let kit = Toolkit::new([order_tool()]).unwrap();
    let ctx = ToolContext::new();

    let out = kit.dispatch(
        &ctx,
        &ToolCall::function("find_orders", json!({ "status": "pending" })),
    );
    assert!(out.is_ok());
    assert_eq!(out.message.role, Role::Tool);
    let found: Value = serde_json::from_str(&out.message.content).unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], "1003");

    let out = kit.dispatch(
        &ctx,
        &ToolCall::function(
            "find_orders",
            json!({ "start": "2024-07-02T00:00:00Z", "description": " CALZONE " }),
        ),
    );
    let found: Value = serde_json::from_str(&out.message.content).unwrap();
    assert_eq!(found[0]["id"], "1002");
}

#[test]
fn test_enum_values_are_not_enforced() {
    let kit = Toolkit::new([order_tool()]).unwrap();
    let out = kit.dispatch(
        &ToolContext::new(),
        &ToolCall::function("find_orders", json!({ "status": "shipped" })),
    );
    assert!(out.is_ok());
    assert_eq!(out.message.content, "[]");
}

#[test]
fn test_declared_types_are_decoded() {
    let kit = Toolkit::new([order_tool()]).unwrap();
    let out = kit.dispatch(
        &ToolContext::new(),
        &ToolCall::function("find_orders", json!({ "start": "last tuesday" })),
    );
    assert_eq!(out.error.unwrap().kind(), ToolErrorKind::ArgumentDecode);
    let envelope: Value = serde_json::from_str(&out.message.content).unwrap();
    assert!(envelope["error"].is_string());
}

#[derive(Deserialize, ToolParameters)]
#[tool(crate = "palaver::tools")]
struct Greeting {
    #[tool(description = "who to greet")]
    name: String,
}

#[derive(Serialize)]
struct Hello {
    hello: String,
}

fn hello(g: Greeting) -> Hello {
    Hello { hello: g.name }
}

#[test]
fn test_hello_world() {
    let tool = BoundTool::builder()
        .description("says hello")
        .func(hello)
        .build()
        .unwrap();

    let d = tool.descriptor();
    assert_eq!(d.required, vec!["name"]);
    assert_eq!(d.property("name").unwrap().kind, Some(PropertyType::String));

    let out = tool
        .call(&ToolContext::new(), &json!({ "name": "world" }))
        .unwrap();
    assert_eq!(out.to_string(), r#"{"hello":"world"}"#);
}

#[derive(Deserialize, ToolParameters)]
#[tool(crate = "palaver::tools")]
struct Now {
    #[tool(description = "IANA timezone name")]
    time_zone: Optional<String>,
    #[tool(description = "strftime pattern")]
    output_format: String,
}

fn now(q: Now) -> String {
    format!("{} {}", q.time_zone.unwrap_or("UTC".into()), q.output_format)
}

#[test]
fn test_camel_names() {
    let tool = BoundTool::builder()
        .camel_names()
        .description("current time")
        .func(now)
        .build()
        .unwrap();

    let d = tool.descriptor();
    let names: Vec<_> = d.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["timeZone", "outputFormat"]);
    assert_eq!(d.required, vec!["outputFormat"]);

    let out = tool
        .call(
            &ToolContext::new(),
            &json!({ "timeZone": "CET", "outputFormat": "rfc3339" }),
        )
        .unwrap();
    assert_eq!(out, json!("CET rfc3339"));
}

#[derive(Deserialize, ToolParameters)]
#[tool(crate = "palaver::tools")]
struct Renamed {
    #[tool(rename = "orderId", description = "order to look up")]
    order_id: u64,
    #[serde(rename = "note")]
    #[tool(rename = "comment", description = "free text")]
    remark: Optional<String>,
}

fn renamed(args: Renamed) -> String {
    format!("{}/{}", args.order_id, args.remark.unwrap_or("-".into()))
}

#[test]
fn test_renamed_fields_decode_under_advertised_names() {
    let tool = BoundTool::builder()
        .description("looks up an order")
        .func(renamed)
        .build()
        .unwrap();
    let d = tool.descriptor();
    let names: Vec<_> = d.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["orderId", "comment"]);

    let ctx = ToolContext::new();
    assert_eq!(tool.call(&ctx, &json!({ "orderId": 7 })).unwrap(), json!("7/-"));
    assert_eq!(
        tool.call(&ctx, &json!({ "orderId": 7, "comment": "rush" }))
            .unwrap(),
        json!("7/rush")
    );
}

#[test]
fn test_bind_errors() {
    let err = BoundTool::builder().func(hello).build().unwrap_err();
    assert_eq!(
        err,
        BindError::Invalid(ValidationError::MissingDescription {
            tool: "hello".into()
        })
    );

    let err = BoundTool::builder()
        .description("says hello")
        .func(hello)
        .required(["nickname"])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        BindError::Invalid(ValidationError::UnknownRequired {
            parameter: "nickname".into()
        })
    );

    let err = BoundTool::builder()
        .name("lonely")
        .description("has no function")
        .build()
        .unwrap_err();
    assert!(matches!(err, BindError::MissingFunction { .. }));

    let duplicate = || {
        BoundTool::builder()
            .description("says hello")
            .func(hello)
            .build()
            .unwrap()
    };
    assert!(matches!(
        Toolkit::new([duplicate(), duplicate()]),
        Err(BindError::DuplicateTool { .. })
    ));
}

#[test]
fn test_optional_round_trip() {
    let absent: Optional<u32> = Optional::Absent;
    let encoded = serde_json::to_value(&absent).unwrap();
    assert_eq!(encoded, Value::Null);
    assert_eq!(serde_json::from_value::<Optional<u32>>(encoded).unwrap(), absent);

    let present = Optional::Present(7u32);
    let encoded = serde_json::to_value(&present).unwrap();
    assert_eq!(encoded, json!(7));
    assert_eq!(serde_json::from_value::<Optional<u32>>(encoded).unwrap(), present);
}
