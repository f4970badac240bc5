use crate::error::Error;
use crate::function::{Function, Invocation, Parameter};
use crate::value::{Value, ValueType};
use dotmark_parser::ast::{
    Code, Node, TextCase, TextDecoration, TextSize, TextStyle, TextTransform, TextTransformData,
    TextWeight,
};

const SIZES: &[&str] = &["tiny", "small", "normal", "medium", "larger", "large", "huge"];
const WEIGHTS: &[&str] = &["normal", "bold"];
const STYLES: &[&str] = &["normal", "italic"];
const DECORATIONS: &[&str] = &["none", "underline", "overline", "strikethrough"];
const CASES: &[&str] = &["none", "uppercase", "lowercase", "capitalize"];

const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in \
reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint \
occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.";

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "text",
            vec![
                Parameter::new("text", ValueType::InlineMarkdown).body(),
                Parameter::new("size", ValueType::Enum(SIZES)).optional(),
                Parameter::new("weight", ValueType::Enum(WEIGHTS)).optional(),
                Parameter::new("style", ValueType::Enum(STYLES)).optional(),
                Parameter::new("decoration", ValueType::Enum(DECORATIONS)).optional(),
                Parameter::new("case", ValueType::Enum(CASES)).optional(),
            ],
            |inv| {
                let data = transform_data(inv)?;
                Ok(Value::Node(Node::TextTransform(TextTransform {
                    data,
                    children: inv.markdown("text")?,
                })))
            },
        ),
        Function::new(
            "code",
            vec![
                Parameter::new("lang", ValueType::String).optional(),
                Parameter::new("caption", ValueType::String).optional(),
                Parameter::new("code", ValueType::String).body(),
            ],
            |inv| {
                Ok(Value::Node(Node::Code(Code {
                    language: inv.optional_string("lang")?.map(|l| l.trim().to_string()),
                    content: inv.string("code")?,
                    caption: inv.optional_string("caption")?,
                    custom_id: None,
                })))
            },
        ),
        Function::new("loremipsum", vec![], |_| {
            Ok(Value::String(LOREM_IPSUM.to_string()))
        }),
    ]
}

fn transform_data(inv: &mut Invocation) -> Result<TextTransformData, Error> {
    let size = inv.enum_value("size")?.map(|size| match size.as_str() {
        "tiny" => TextSize::Tiny,
        "small" => TextSize::Small,
        "medium" => TextSize::Medium,
        "larger" => TextSize::Larger,
        "large" => TextSize::Large,
        "huge" => TextSize::Huge,
        _ => TextSize::Normal,
    });
    let weight = inv.enum_value("weight")?.map(|weight| match weight.as_str() {
        "bold" => TextWeight::Bold,
        _ => TextWeight::Normal,
    });
    let style = inv.enum_value("style")?.map(|style| match style.as_str() {
        "italic" => TextStyle::Italic,
        _ => TextStyle::Normal,
    });
    let decoration = inv
        .enum_value("decoration")?
        .map(|decoration| match decoration.as_str() {
            "underline" => TextDecoration::Underline,
            "overline" => TextDecoration::Overline,
            "strikethrough" => TextDecoration::Strikethrough,
            _ => TextDecoration::None,
        });
    let case = inv.enum_value("case")?.map(|case| match case.as_str() {
        "uppercase" => TextCase::Uppercase,
        "lowercase" => TextCase::Lowercase,
        "capitalize" => TextCase::Capitalize,
        _ => TextCase::None,
    });
    Ok(TextTransformData {
        size,
        weight,
        style,
        decoration,
        case,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::stdlib::tests::{compile, output, try_compile};
    use dotmark_parser::ast::{Code, Node, TextCase, TextSize, TextWeight};

    #[test]
    fn transforms() {
        let (nodes, _) = compile(".text {Big *news*} size:{huge} weight:{bold} case:{uppercase}\n");
        match &output(&nodes, 0)[0] {
            Node::TextTransform(transform) => {
                assert_eq!(transform.data.size, Some(TextSize::Huge));
                assert_eq!(transform.data.weight, Some(TextWeight::Bold));
                assert_eq!(transform.data.case, Some(TextCase::Uppercase));
                assert_eq!(transform.data.style, None);
                assert_eq!(transform.children.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_variants() {
        assert!(matches!(
            try_compile(".text {x} size:{gigantic}\n"),
            Err(Error::NoSuchElement(_))
        ));
    }

    #[test]
    fn code_blocks() {
        let (nodes, _) = compile(".code {rust}\n    fn main() {}\n");
        assert_eq!(
            output(&nodes, 0),
            vec![Node::Code(Code {
                language: Some("rust".into()),
                content: "fn main() {}".into(),
                caption: None,
                custom_id: None,
            })]
        );
    }
}
