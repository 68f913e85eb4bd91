use udf_bridge::docstring::{DocString, parse_docstring};

#[test]
fn google_style_sections() {
    let doc = parse_docstring(
        "Fetches orders for a customer.

        Longer explanation that belongs to the summary.

        Args:
            customer_id (str): The customer.
            limit: Maximum rows,
                at most 100.

        Returns:
            A list of order ids.

        Raises:
            ValueError: if the customer is unknown.
        ",
    );
    assert_eq!(
        doc.summary,
        "Fetches orders for a customer. Longer explanation that belongs to the summary."
    );
    assert_eq!(doc.params.len(), 2);
    assert_eq!(doc.params[0].name, "customer_id");
    assert_eq!(doc.params[0].type_hint.as_deref(), Some("str"));
    assert_eq!(doc.param_description("limit"), "Maximum rows, at most 100.");
    assert_eq!(doc.returns.as_deref(), Some("A list of order ids."));
    assert_eq!(doc.raises.as_deref(), Some("ValueError: if the customer is unknown."));
}

#[test]
fn undocumented_parameters_get_default_text() {
    let doc = parse_docstring("Adds.\n\nArgs:\n    a: left\n");
    assert_eq!(doc.param_description("a"), "left");
    assert_eq!(doc.param_description("b"), "Parameter `b`");
    assert_eq!(doc.undeclared_params(&["b"]), vec!["a"]);
}

#[test]
fn text_without_sections_yields_defaults() {
    assert_eq!(parse_docstring("Just prose, no sections."), DocString::default());
    assert_eq!(parse_docstring(""), DocString::default());
}

#[test]
fn malformed_input_never_panics() {
    let inputs = [
        "Args:",
        "Args:\n",
        "Args:\n\n\n",
        "Returns:",
        "Args:\n    : no name\n    (int): nothing\n",
        "Args:\n    x (int: unclosed\n",
        "\tArgs:\n\t\tx: tab indented\n  y: shallower\n",
        "Args:\n        deep: first\n    shallow: second\n",
        "Args: inline text\nReturns: inline too",
        "::::\nArgs:\n::::",
        "Args:\n    ünïcode: välue\n    名前: 説明\n",
        "Returns:\nArgs:\nRaises:\nArgs:\n",
    ];
    for input in inputs {
        let doc = parse_docstring(input);
        for param in &doc.params {
            assert!(!param.name.is_empty(), "empty parameter name from {input:?}");
        }
    }
}
