extern crate stache;
use stache::{
    compile, Collaborators, Configuration, ContentType, Context, Delimiters,
    Error, FilterRegistry, JsonValue, Position, RenderError, SyntaxErrorKind,
    Template, TemplateMap, YamlValue, MAX_NESTING_DEPTH, MAX_PARTIAL_DEPTH,
};

use std::{sync::Arc, thread, collections::HashMap};
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;


fn filters() -> FilterRegistry {
    let mut filters = FilterRegistry::new();
    filters
        .add("upper", |value: &JsonValue, _: &[JsonValue]| -> Result<JsonValue, String> {
            Ok(JsonValue::from(value.as_str().unwrap_or_default().to_uppercase()))
        })
        .add("join", |value: &JsonValue, args: &[JsonValue]| -> Result<JsonValue, String> {
            let separator = args.first().and_then(JsonValue::as_str).unwrap_or(",");
            let items = value.as_array().ok_or("expected a list")?;
            let items = items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>();
            Ok(JsonValue::from(items.join(separator)))
        })
        .add("default", |value: &JsonValue, args: &[JsonValue]| -> Result<JsonValue, String> {
            match value {
                JsonValue::Null => Ok(args.first().cloned().unwrap_or(JsonValue::Null)),
                other => Ok(other.clone()),
            }
        })
        .add("fail", |_: &JsonValue, _: &[JsonValue]| -> Result<JsonValue, String> {
            Err("always fails".to_owned())
        });
    filters
}

fn render_filtered(source: &str, data: &JsonValue) -> Result<String, RenderError> {
    let filters = filters();
    let collaborators = Collaborators::default().with_filters(&filters);
    Template::from(source).unwrap().render_with(data, &collaborators)
}


#[test]
fn text_without_tags_is_unchanged() {
    let source = "plain {text}\n with } braces {\r\n";
    let template = Template::from(source).unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), source);
}

#[test]
fn escaping() {
    let data = json!({ "v": "<b>" });
    let template = Template::from("<p>{{v}}</p>").unwrap();
    assert_eq!(template.render(&data).unwrap(), "<p>&lt;b&gt;</p>");
    let template = Template::from("<p>{{{v}}}</p><p>{{&v}}</p>").unwrap();
    assert_eq!(template.render(&data).unwrap(), "<p><b></p><p><b></p>");
}

#[test]
fn text_templates_are_not_escaped() {
    let data = json!({ "v": "a & b" });
    let template = Template::compile_with("{{v}}", &Configuration::text()).unwrap();
    assert_eq!(template.render(&data).unwrap(), "a & b");
    let template = Template::from("{{%CONTENT_TYPE:TEXT}}{{v}}").unwrap();
    assert_eq!(template.render(&data).unwrap(), "a & b");
}

#[test]
fn section_truth_table() {
    let cases = [
        (json!(null), false),
        (json!(false), false),
        (json!(true), true),
        (json!(0), true),
        (json!(""), true),
        (json!("text"), true),
        (json!([]), false),
        (json!([1]), true),
        (json!({}), true),
    ];
    let section = Template::from("{{#v}}yes{{/v}}").unwrap();
    let inverted = Template::from("{{^v}}yes{{/v}}").unwrap();
    for (value, rendered) in cases {
        let data = json!({ "v": value.clone() });
        let expected = if rendered { "yes" } else { "" };
        let inverse = if rendered { "" } else { "yes" };
        assert_eq!(section.render(&data).unwrap(), expected, "section on {}", value);
        assert_eq!(inverted.render(&data).unwrap(), inverse, "inverted on {}", value);
    }
    assert_eq!(section.render(&json!({})).unwrap(), "");
    assert_eq!(inverted.render(&json!({})).unwrap(), "yes");
}

#[test]
fn iteration() {
    let template = Template::from("{{#items}}{{.}},{{/items}}").unwrap();
    assert_eq!(template.render(&json!({ "items": [1, 2, 3] })).unwrap(), "1,2,3,");
}

#[test]
fn scoping_fallback() {
    let template = Template::from("{{#a}}{{x}}{{y}}{{/a}}").unwrap();
    let data = json!({ "a": { "x": 1 }, "y": 2 });
    assert_eq!(template.render(&data).unwrap(), "12");
}

#[test]
fn delimiter_change() {
    let template = Template::from("{{=<% %>=}}<%x%>").unwrap();
    assert_eq!(template.render(&json!({ "x": "x" })).unwrap(), "x");
}

#[test]
fn custom_initial_delimiters() {
    let delimiters = Delimiters::new("[[", "]]").unwrap();
    let template = compile("[[#a]][[.]][[/a]]{{a}}", &delimiters, ContentType::Html).unwrap();
    assert_eq!(template.render(&json!({ "a": "1" })).unwrap(), "1{{a}}");
    assert!(Delimiters::new("", "]]").is_none());
    assert!(Delimiters::new("< %", "%>").is_none());
}

#[test]
fn configuration_from_yaml() {
    let config: Configuration = serde_yaml::from_str(
        "content_type: text\ndelimiters: ['<%', '%>']\n"
    ).unwrap();
    assert_eq!(config.content_type, ContentType::Text);
    let template = Template::compile_with("<% v %>", &config).unwrap();
    assert_eq!(template.render(&json!({ "v": "<" })).unwrap(), "<");
}


#[test]
fn unexpected_closing_tag() {
    let error = Template::from("hello\n  {{/section}}").unwrap_err();
    assert_eq!(error.kind, SyntaxErrorKind::UnexpectedClosingTag {
        found: "section".to_owned(),
        expected: None,
    });
    assert_eq!(error.position, Position { line: 2, column: 3, offset: 8 });
    assert_eq!(
        error.to_string(),
        "Unexpected closing tag `section` at line 2, column 3"
    );
}

#[test]
fn syntax_errors() {
    let kind = |source: &str| Template::from(source).unwrap_err().kind;
    assert_eq!(kind("{{a"), SyntaxErrorKind::UnclosedTag);
    assert_eq!(kind("{{{a}}"), SyntaxErrorKind::UnclosedTag);
    assert_eq!(kind("{{}}"), SyntaxErrorKind::EmptyTag);
    assert_eq!(kind("{{#}}"), SyntaxErrorKind::EmptyTag);
    assert_eq!(kind("{{=<%=}}"), SyntaxErrorKind::InvalidDelimiters);
    assert_eq!(kind("{{#a}}"), SyntaxErrorKind::UnclosedSection("a".to_owned()));
    assert!(matches!(kind("{{a.}}"), SyntaxErrorKind::InvalidExpression(_)));
    assert!(matches!(kind("{{a | }}"), SyntaxErrorKind::InvalidExpression(_)));
}


#[test]
fn partial_indentation() {
    let mut partials = TemplateMap::new();
    partials.load("p", "x\ny\n").unwrap();
    let template = Template::from("a\n  {{> p}}\nb").unwrap();
    let result = template.render_with_partials(&json!({}), &partials).unwrap();
    assert_eq!(result, "a\n  x\n  y\nb");

    let template = Template::from("a {{> p}}b").unwrap();
    let result = template.render_with_partials(&json!({}), &partials).unwrap();
    assert_eq!(result, "a x\ny\nb");
}

#[test]
fn missing_partial() {
    let template = Template::from("{{> nowhere}}").unwrap();
    let error = template.render(&json!({})).unwrap_err();
    assert_eq!(error, RenderError::PartialNotFound {
        name: "nowhere".to_owned(),
        position: Position { line: 1, column: 1, offset: 0 },
    });
}

#[test]
fn cyclic_partials_hit_the_recursion_limit() {
    let mut partials = TemplateMap::new();
    partials.load("a", "a{{> b}}").unwrap();
    partials.load("b", "b{{> a}}").unwrap();
    let template = Template::from("{{> a}}").unwrap();
    match template.render_with_partials(&json!({}), &partials) {
        Err(RenderError::RecursionLimitExceeded { depth, .. }) => {
            assert_eq!(depth, MAX_PARTIAL_DEPTH)
        }
        other => panic!("unexpected {:?}", other),
    }
}

fn nested_sections(depth: usize, inner: &str) -> String {
    format!("{}{}{}", "{{#a}}".repeat(depth), inner, "{{/a}}".repeat(depth))
}

#[test]
fn deep_nesting_fails_to_compile() {
    let error = Template::from(&nested_sections(1000, "x")).unwrap_err();
    assert_eq!(error.kind, SyntaxErrorKind::NestingTooDeep(MAX_NESTING_DEPTH));

    let template = Template::from(&nested_sections(MAX_NESTING_DEPTH, "x")).unwrap();
    assert_eq!(template.render(&json!({ "a": true })).unwrap(), "x");
}

#[test]
fn nesting_through_partials_is_bounded() {
    let mut partials = TemplateMap::new();
    partials.load("p", &nested_sections(50, "{{> p}}")).unwrap();
    let template = Template::from("{{> p}}").unwrap();
    match template.render_with_partials(&json!({ "a": true }), &partials) {
        Err(RenderError::NestingLimitExceeded { depth, .. }) => {
            assert_eq!(depth, MAX_NESTING_DEPTH)
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn text_partial_in_html_template() {
    let mut partials = TemplateMap::with_configuration(Configuration::text());
    partials.load("raw", "[{{v}}]").unwrap();
    let template = Template::from("{{v}}{{> raw}}").unwrap();
    let result = template.render_with_partials(&json!({ "v": "<" }), &partials).unwrap();
    assert_eq!(result, "&lt;[<]");
}

#[test]
fn parent_with_missing_template() {
    let template = Template::from("{{<layout}}{{$a}}x{{/a}}{{/layout}}").unwrap();
    assert!(matches!(
        template.render(&json!({})),
        Err(RenderError::PartialNotFound { name, .. }) if name == "layout"
    ));
}

#[test]
fn layout_inheritance() {
    let mut partials = TemplateMap::new();
    partials
        .load("layout", "<title>{{$title}}Default{{/title}}</title>{{$body}}{{/body}}")
        .unwrap();
    let template = Template::from(
        "{{<layout}}{{$title}}{{name}}{{/title}}{{$body}}<p>{{text}}</p>{{/body}}{{/layout}}"
    ).unwrap();
    let data = json!({ "name": "Home", "text": "a < b" });
    let result = template.render_with_partials(&data, &partials).unwrap();
    assert_eq!(result, "<title>Home</title><p>a &lt; b</p>");
}


#[test]
fn filters_transform_values() {
    let data = json!({ "name": "ann", "tags": ["a", "b"], "sep": "+" });
    assert_eq!(render_filtered("{{name | upper}}", &data).unwrap(), "ANN");
    assert_eq!(render_filtered("{{tags | join: \"-\"}}", &data).unwrap(), "a-b");
    assert_eq!(render_filtered("{{tags | join: sep}}", &data).unwrap(), "a+b");
    assert_eq!(render_filtered("{{tags | join | upper}}", &data).unwrap(), "A,B");
    assert_eq!(render_filtered("{{missing | default: 42}}", &data).unwrap(), "42");
}

#[test]
fn filtered_values_drive_sections() {
    let data = json!({ "user": null, "items": [{ "n": 1 }, { "n": 2 }] });
    assert_eq!(
        render_filtered("{{#user | default: \"anon\"}}{{.}}{{/user | default: \"anon\"}}", &data).unwrap(),
        "anon"
    );
    assert_eq!(render_filtered("{{#items | default}}{{n}}{{/items | default}}", &data).unwrap(), "12");
}

#[test]
fn unknown_filter() {
    let error = Template::from("{{x | nope}}").unwrap().render(&json!({ "x": 1 })).unwrap_err();
    assert_eq!(error, RenderError::UnknownFilter {
        name: "nope".to_owned(),
        position: Position { line: 1, column: 1, offset: 0 },
    });
}

#[test]
fn failing_filter_produces_no_output() {
    let error = render_filtered("before {{x | fail}} after", &json!({})).unwrap_err();
    assert!(matches!(error, RenderError::Filter { ref message, .. } if message == "always fails"));
    assert_eq!(
        error.to_string(),
        "Filter `fail` failed at line 1, column 8: always fails"
    );
}

#[test]
fn custom_escaper() {
    let escaper = |value: &str, _: ContentType| value.replace('a', "4");
    let collaborators = Collaborators::default().with_escaper(&escaper);
    let template = Template::from("{{v}} {{{v}}}").unwrap();
    let result = template.render_with(&json!({ "v": "banana" }), &collaborators).unwrap();
    assert_eq!(result, "b4n4n4 banana");
}


#[derive(Serialize)]
struct Invoice {
    customer: String,
    lines: Vec<Line>,
}

#[derive(Serialize)]
struct Line {
    item: String,
    quantity: u32,
}

#[test]
fn render_serializable_data() {
    let invoice = Invoice {
        customer: "ACME".to_owned(),
        lines: vec![
            Line { item: "bolt".to_owned(), quantity: 3 },
            Line { item: "nut".to_owned(), quantity: 5 },
        ],
    };
    let template = Template::from("{{customer}}:{{#lines}} {{quantity}}x{{item}}{{/lines}}").unwrap();
    let result = template.render_data(&invoice, &Collaborators::default()).unwrap();
    assert_eq!(result, "ACME: 3xbolt 5xnut");
}

#[test]
fn yaml_values_reach_filters_as_they_render() {
    let data = serde_yaml::from_str::<YamlValue>(
        "v: !shout hi\nn: { 1: one }\nm: { [1, 2]: x, k: y }\n"
    ).unwrap();
    let mut filters = FilterRegistry::new();
    filters.add("show", |value: &JsonValue, _: &[JsonValue]| -> Result<JsonValue, String> {
        Ok(JsonValue::from(value.to_string()))
    });
    let collaborators = Collaborators::default().with_filters(&filters);
    let render = |source: &str| Template::from(source).unwrap().render_with(&data, &collaborators);

    assert_eq!(render("{{{v}}} {{{v | show}}}").unwrap(), "hi \"hi\"");
    assert_eq!(render("{{{n | show}}}").unwrap(), r#"{"1":"one"}"#);
    assert_eq!(render("{{#m}}{{k}}{{/m}}").unwrap(), "y");
    match render("{{{m | show}}}") {
        Err(RenderError::Filter { name, message, .. }) => {
            assert_eq!(name, "show");
            assert!(message.contains("no JSON counterpart"), "{}", message);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn errors_convert_into_crate_error() {
    fn run() -> stache::Result<String> {
        let template = Template::from("{{> missing}}")?;
        Ok(template.render(&json!({}))?)
    }
    assert!(matches!(run(), Err(Error::Render(RenderError::PartialNotFound { .. }))));
}

#[test]
fn std_maps_as_context() {
    let mut data: HashMap<String, Box<dyn Context>> = HashMap::new();
    data.insert("name".to_owned(), Box::new("kim".to_owned()));
    data.insert("scores".to_owned(), Box::new(vec![7u32, 9]));
    let template = Template::from("{{name}}:{{#scores}} {{.}}{{/scores}}").unwrap();
    assert_eq!(template.render(&data).unwrap(), "kim: 7 9");
}


#[test]
fn rendering_is_deterministic_across_threads() {
    let template = Arc::new(
        Template::from("{{#people}}{{name}} is {{age}}\n{{/people}}").unwrap()
    );
    let data = json!({
        "people": [{ "name": "a", "age": 1 }, { "name": "b", "age": 2 }]
    });
    let expected = template.render(&data).unwrap();
    let handles = (0..4)
        .map(|_| {
            let template = Arc::clone(&template);
            let data = data.clone();
            thread::spawn(move || template.render(&data).unwrap())
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(expected, "a is 1\nb is 2\n");
}
