use crate::function::{Function, Parameter};
use crate::value::{Value, ValueType};
use dotmark_parser::ast::Node;

pub(super) fn functions() -> Vec<Function> {
    vec![Function::new(
        "html",
        vec![Parameter::new("content", ValueType::String).body()],
        |inv| Ok(Value::Node(Node::Html(inv.string("content")?))),
    )]
}

#[cfg(test)]
mod tests {
    use crate::stdlib::tests::{compile, output};
    use dotmark_parser::ast::Node;

    #[test]
    fn raw_html() {
        let (nodes, _) = compile(".html\n    <div class=\"x\">\n      *raw*\n    </div>\n");
        assert_eq!(
            output(&nodes, 0),
            vec![Node::Html("<div class=\"x\">\n  *raw*\n</div>".into())]
        );
    }
}
