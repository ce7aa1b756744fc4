use super::{EmitContext, NodeTemplate, PropertyRegistration, Section};
use crate::graph::{FieldValue, Fields, GROUP_INPUT_TYPE, GROUP_OUTPUT_TYPE, GROUP_TYPE, Node};
use ahash::AHashMap;

/// Wraps an expression in parentheses when it has top-level whitespace.
pub fn operand(expr: &str) -> String {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for ch in expr.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => return format!("({})", expr),
            _ => {}
        }
    }
    expr.to_string()
}

fn fields(entries: &[(&str, FieldValue)]) -> Fields {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn text_field<'a>(node: &'a Node, name: &str, fallback: &'a str) -> &'a str {
    node.field(name)
        .and_then(FieldValue::as_text)
        .unwrap_or(fallback)
}

/// Renders input `index`, falling back to the node field and then to `fallback`.
fn input_or(ctx: &EmitContext, index: usize, node: &Node, field: &str, fallback: &str) -> String {
    match (ctx.input(index), node.field(field)) {
        (Some(expr), _) => expr.to_string(),
        (None, Some(value)) => value.to_source(),
        (None, None) => fallback.to_string(),
    }
}

/// Joins non-empty chunks of statement text.
fn lines(chunks: &[&str]) -> String {
    chunks
        .iter()
        .filter(|c| !c.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Section anchors ---

struct EventTemplate {
    node_type: &'static str,
    section: Section,
    outputs: &'static [&'static str],
}

impl NodeTemplate for EventTemplate {
    fn node_type(&self) -> &str {
        self.node_type
    }
    fn inputs(&self) -> &[&'static str] {
        &[]
    }
    fn outputs(&self) -> &[&'static str] {
        self.outputs
    }
    fn anchor(&self, _node: &Node) -> Option<Section> {
        Some(self.section.clone())
    }
    fn emit(&self, _node: &Node, _ctx: &EmitContext) -> String {
        String::new()
    }
    // Data outputs of an event are the hook's parameters.
    fn output_access(&self, _node: &Node, _base: &str, label: &str) -> Option<String> {
        Some(label.to_string())
    }
}

struct CustomEventTemplate;

impl NodeTemplate for CustomEventTemplate {
    fn node_type(&self) -> &str {
        "custom-event"
    }
    fn inputs(&self) -> &[&'static str] {
        &[]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow"]
    }
    fn anchor(&self, node: &Node) -> Option<Section> {
        Some(Section::Custom(text_field(node, "name", "customEvent").to_string()))
    }
    fn default_fields(&self) -> Fields {
        fields(&[("name", FieldValue::from("customEvent"))])
    }
    fn emit(&self, _node: &Node, _ctx: &EmitContext) -> String {
        String::new()
    }
}

// --- Pure value nodes ---

struct LiteralTemplate {
    node_type: &'static str,
    default: FieldValue,
}

impl NodeTemplate for LiteralTemplate {
    fn node_type(&self) -> &str {
        self.node_type
    }
    fn inputs(&self) -> &[&'static str] {
        &[]
    }
    fn outputs(&self) -> &[&'static str] {
        &["value"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[("value", self.default.clone())])
    }
    fn emit(&self, node: &Node, _ctx: &EmitContext) -> String {
        node.field("value")
            .unwrap_or(&self.default)
            .to_source()
    }
}

struct Vector3Template;

impl NodeTemplate for Vector3Template {
    fn node_type(&self) -> &str {
        "vector3"
    }
    fn inputs(&self) -> &[&'static str] {
        &["x", "y", "z"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["vector"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[
            ("x", FieldValue::Number(0.0)),
            ("y", FieldValue::Number(0.0)),
            ("z", FieldValue::Number(0.0)),
        ])
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        format!(
            "vec3({}, {}, {})",
            input_or(ctx, 0, node, "x", "0"),
            input_or(ctx, 1, node, "y", "0"),
            input_or(ctx, 2, node, "z", "0")
        )
    }
}

struct SplitVectorTemplate;

impl NodeTemplate for SplitVectorTemplate {
    fn node_type(&self) -> &str {
        "split-vector"
    }
    fn inputs(&self) -> &[&'static str] {
        &["vector"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["x", "y", "z"]
    }
    fn emit(&self, _node: &Node, ctx: &EmitContext) -> String {
        ctx.input(0).unwrap_or("vec3(0, 0, 0)").to_string()
    }
}

struct GetPropertyTemplate;

impl NodeTemplate for GetPropertyTemplate {
    fn node_type(&self) -> &str {
        "get-property"
    }
    fn inputs(&self) -> &[&'static str] {
        &[]
    }
    fn outputs(&self) -> &[&'static str] {
        &["value"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[("name", FieldValue::from("value"))])
    }
    fn emit(&self, node: &Node, _ctx: &EmitContext) -> String {
        format!("this.{}", text_field(node, "name", "value"))
    }
}

struct NotTemplate;

impl NodeTemplate for NotTemplate {
    fn node_type(&self) -> &str {
        "not"
    }
    fn inputs(&self) -> &[&'static str] {
        &["value"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["result"]
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        format!("!{}", operand(&input_or(ctx, 0, node, "value", "false")))
    }
}

/// Defines infix operator templates and the list that registers them.
macro_rules! define_binary_templates {
    ( $( ($struct_name:ident, $node_type:expr, $op:expr, $fallback:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeTemplate for $struct_name {
                fn node_type(&self) -> &str { $node_type }
                fn inputs(&self) -> &[&'static str] { &["a", "b"] }
                fn outputs(&self) -> &[&'static str] { &["result"] }
                fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
                    format!(
                        "{} {} {}",
                        operand(&input_or(ctx, 0, node, "a", $fallback)),
                        $op,
                        operand(&input_or(ctx, 1, node, "b", $fallback)),
                    )
                }
            }
        )*

        fn binary_templates() -> Vec<Box<dyn NodeTemplate>> {
            vec![ $( Box::new($struct_name), )* ]
        }
    };
}

define_binary_templates! {
    // Arithmetic
    (AddTemplate, "add", "+", "0"),
    (SubtractTemplate, "subtract", "-", "0"),
    (MultiplyTemplate, "multiply", "*", "0"),
    (DivideTemplate, "divide", "/", "1"),
    // Comparison
    (GreaterTemplate, "greater", ">", "0"),
    (LessTemplate, "less", "<", "0"),
    (EqualTemplate, "equal", "==", "0"),
    // Logical
    (AndTemplate, "and", "&&", "false"),
    (OrTemplate, "or", "||", "false"),
}

// --- Flow nodes ---

struct SetPropertyTemplate;

impl NodeTemplate for SetPropertyTemplate {
    fn node_type(&self) -> &str {
        "set-property"
    }
    fn inputs(&self) -> &[&'static str] {
        &["flow", "value"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[
            ("name", FieldValue::from("value")),
            ("value", FieldValue::Number(0.0)),
            ("expose", FieldValue::Bool(false)),
        ])
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        format!(
            "this.{} = {};",
            text_field(node, "name", "value"),
            input_or(ctx, 1, node, "value", "null")
        )
    }
    fn property(&self, node: &Node) -> Option<PropertyRegistration> {
        if !node.field("expose").and_then(FieldValue::as_bool)? {
            return None;
        }
        Some(PropertyRegistration {
            name: text_field(node, "name", "value").to_string(),
            default: node
                .field("value")
                .cloned()
                .unwrap_or(FieldValue::Number(0.0)),
        })
    }
}

struct LogTemplate;

impl NodeTemplate for LogTemplate {
    fn node_type(&self) -> &str {
        "log"
    }
    fn inputs(&self) -> &[&'static str] {
        &["flow", "message"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[("message", FieldValue::from(""))])
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        format!("log({});", input_or(ctx, 1, node, "message", "\"\""))
    }
}

struct BranchTemplate;

impl NodeTemplate for BranchTemplate {
    fn node_type(&self) -> &str {
        "branch"
    }
    fn inputs(&self) -> &[&'static str] {
        &["flow", "condition"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow:true", "flow:false"]
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        let condition = input_or(ctx, 1, node, "condition", "false");
        let on_true = ctx.branch(0);
        let on_false = ctx.branch(1);
        if on_false.trim().is_empty() {
            lines(&[&format!("if ({}) {{", condition), on_true, "}"])
        } else {
            lines(&[
                &format!("if ({}) {{", condition),
                on_true,
                "} else {",
                on_false,
                "}",
            ])
        }
    }
}

struct ForLoopTemplate;

impl NodeTemplate for ForLoopTemplate {
    fn node_type(&self) -> &str {
        "for-loop"
    }
    fn inputs(&self) -> &[&'static str] {
        &["flow", "count"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow:body", "flow:completed", "index"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[("count", FieldValue::Number(1.0))])
    }
    fn single_value_output(&self) -> bool {
        true
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        let index = ctx.variable();
        let count = input_or(ctx, 1, node, "count", "0");
        lines(&[
            &format!(
                "for (let {index} = 0; {index} < {}; {index}++) {{",
                operand(&count)
            ),
            ctx.branch(0),
            "}",
            ctx.branch(1),
        ])
    }
}

struct CallMethodTemplate;

impl NodeTemplate for CallMethodTemplate {
    fn node_type(&self) -> &str {
        "call-method"
    }
    fn inputs(&self) -> &[&'static str] {
        &["flow", "argument"]
    }
    fn outputs(&self) -> &[&'static str] {
        &["flow", "result"]
    }
    fn default_fields(&self) -> Fields {
        fields(&[("method", FieldValue::from("call"))])
    }
    fn single_value_output(&self) -> bool {
        true
    }
    fn emit(&self, node: &Node, ctx: &EmitContext) -> String {
        let argument = match (ctx.input(1), node.field("argument")) {
            (Some(expr), _) => expr.to_string(),
            (None, Some(value)) => value.to_source(),
            (None, None) => String::new(),
        };
        format!(
            "const {} = this.{}({});",
            ctx.variable(),
            text_field(node, "method", "call"),
            argument
        )
    }
}

// --- Groups ---

/// Group containers and their boundary pseudo-nodes render nothing themselves;
/// the generator stitches their contents.
struct StructuralTemplate {
    node_type: &'static str,
    inputs: &'static [&'static str],
    outputs: &'static [&'static str],
}

impl NodeTemplate for StructuralTemplate {
    fn node_type(&self) -> &str {
        self.node_type
    }
    fn inputs(&self) -> &[&'static str] {
        self.inputs
    }
    fn outputs(&self) -> &[&'static str] {
        self.outputs
    }
    fn emit(&self, _node: &Node, _ctx: &EmitContext) -> String {
        String::new()
    }
}

/// Every built-in template.
pub fn standard_templates() -> Vec<Box<dyn NodeTemplate>> {
    let mut templates: Vec<Box<dyn NodeTemplate>> = vec![
        Box::new(EventTemplate {
            node_type: "on-start",
            section: Section::Init,
            outputs: &["flow"],
        }),
        Box::new(EventTemplate {
            node_type: "on-update",
            section: Section::Update,
            outputs: &["flow", "delta"],
        }),
        Box::new(EventTemplate {
            node_type: "on-render",
            section: Section::Render,
            outputs: &["flow"],
        }),
        Box::new(EventTemplate {
            node_type: "on-destroy",
            section: Section::Teardown,
            outputs: &["flow"],
        }),
        Box::new(CustomEventTemplate),
        Box::new(LiteralTemplate {
            node_type: "number",
            default: FieldValue::Number(0.0),
        }),
        Box::new(LiteralTemplate {
            node_type: "boolean",
            default: FieldValue::Bool(false),
        }),
        Box::new(LiteralTemplate {
            node_type: "text",
            default: FieldValue::from(""),
        }),
        Box::new(Vector3Template),
        Box::new(SplitVectorTemplate),
        Box::new(GetPropertyTemplate),
        Box::new(NotTemplate),
        Box::new(SetPropertyTemplate),
        Box::new(LogTemplate),
        Box::new(BranchTemplate),
        Box::new(ForLoopTemplate),
        Box::new(CallMethodTemplate),
        Box::new(StructuralTemplate {
            node_type: GROUP_TYPE,
            inputs: &["flow"],
            outputs: &["flow"],
        }),
        Box::new(StructuralTemplate {
            node_type: GROUP_INPUT_TYPE,
            inputs: &[],
            outputs: &["flow"],
        }),
        Box::new(StructuralTemplate {
            node_type: GROUP_OUTPUT_TYPE,
            inputs: &["flow"],
            outputs: &[],
        }),
    ];
    templates.extend(binary_templates());
    templates
}

pub(super) fn register_standard_templates(registry: &mut AHashMap<String, Box<dyn NodeTemplate>>) {
    for template in standard_templates() {
        registry.insert(template.node_type().to_string(), template);
    }
}

pub(super) fn create_template_by_name(name: &str) -> Option<Box<dyn NodeTemplate>> {
    standard_templates()
        .into_iter()
        .find(|t| t.node_type() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_wraps_top_level_whitespace_only() {
        assert_eq!(operand("3"), "3");
        assert_eq!(operand("3 + 4"), "(3 + 4)");
        assert_eq!(operand("vec3(1, 2, 3)"), "vec3(1, 2, 3)");
        assert_eq!(operand("\"a b\""), "\"a b\"");
    }

    #[test]
    fn test_branch_omits_empty_else() {
        let node = Node::new(1, "branch");
        let ctx = EmitContext::new(
            vec![None, Some("ready".to_string())],
            vec!["go();".to_string(), String::new()],
            "n1".to_string(),
        );
        assert_eq!(BranchTemplate.emit(&node, &ctx), "if (ready) {\ngo();\n}");
    }
}
