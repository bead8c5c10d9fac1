//! Integration tests for compiling message definitions.

use insta::assert_snapshot;
use skycast::weather::data_schema;
use skycast::{
    Choice, CompileErrorKind, CompileWarning, ExprRole, Message, MessageCompileError, MessageSet,
    Variable,
};

#[test]
fn undeclared_template_variable_fails_compilation() {
    let messages = vec![
        Message::builder()
            .template("'Wear ' + layer")
            .variables(vec![Variable::new("layr", vec![Choice::new("true", "coat")])])
            .build(),
    ];
    let Err(error) = MessageSet::compile(&messages, &data_schema()) else {
        panic!("expected compile error");
    };
    let MessageCompileError::Expression { index, role, source, .. } = &error else {
        panic!("expected expression error, got {error:?}");
    };
    assert_eq!(*index, 0);
    assert_eq!(*role, ExprRole::Template);
    assert_eq!(source.fragment(), "layer");
    let CompileErrorKind::UnknownIdentifier { name, suggestions } = &source.cause else {
        panic!("expected unknown identifier, got {:?}", source.cause);
    };
    assert_eq!(name, "layer");
    assert_eq!(suggestions.first().map(String::as_str), Some("layr"));
}

#[test]
fn template_cannot_see_data_fields() {
    let messages = vec![Message::builder().template("sprintf('%f', temperature)").build()];
    let error = MessageSet::compile(&messages, &data_schema()).err().unwrap();
    assert_eq!(error.compile_error().unwrap().fragment(), "temperature");
}

#[test]
fn guard_errors_name_variable_and_choice() {
    let messages = vec![
        Message::builder()
            .id("layer")
            .template("layer")
            .variables(vec![Variable::new(
                "layer",
                vec![
                    Choice::new("temperature < 5", "coat"),
                    Choice::new("temprature < 12", "jumper"),
                ],
            )])
            .build(),
    ];
    let error = MessageSet::compile(&messages, &data_schema()).err().unwrap();
    assert_snapshot!(
        error.to_string(),
        @"message 'layer': guard of choice 2 of variable 'layer': cannot compile `temprature < 12`: unknown identifier 'temprature', did you mean: temperature?"
    );
}

#[test]
fn compile_stops_at_first_failing_message() {
    let messages = vec![
        Message::builder().template("'ok'").build(),
        Message::builder().template("'ok'").condition("rain3h >").build(),
        Message::builder().template("missing").build(),
    ];
    let error = MessageSet::compile(&messages, &data_schema()).err().unwrap();
    assert_eq!(error.index(), 1);
    assert!(matches!(
        error.compile_error().map(|e| &e.cause),
        Some(CompileErrorKind::Parse(_))
    ));
}

#[test]
fn duplicate_variable_names_are_rejected() {
    let messages = vec![
        Message::builder()
            .template("a")
            .variables(vec![Variable::new("a", vec![]), Variable::new("a", vec![])])
            .build(),
    ];
    let error = MessageSet::compile(&messages, &data_schema()).err().unwrap();
    assert_snapshot!(error.to_string(), @"message #0: variable 'a' is declared more than once");
}

#[test]
fn diagnose_collects_every_error() {
    let messages = vec![
        Message::builder()
            .template("missing")
            .condition("cloudiness + 'x'")
            .build(),
        Message::builder().template("'fine'").build(),
        Message::builder()
            .template("'ok'")
            .variables(vec![Variable::new("v", vec![Choice::new("forecast.rian > 0", "x")])])
            .build(),
    ];
    let errors = MessageSet::diagnose(&messages, &data_schema());
    let summary: Vec<(usize, String)> = errors
        .iter()
        .map(|error| match error {
            MessageCompileError::Expression { index, role, .. } => (*index, role.to_string()),
            MessageCompileError::DuplicateVariable { index, name, .. } => (*index, name.clone()),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "condition".to_string()),
            (0, "template".to_string()),
            (2, "guard of choice 1 of variable 'v'".to_string()),
        ]
    );
}

#[test]
fn diagnose_is_empty_for_valid_messages() {
    let messages = vec![
        Message::builder()
            .template("'Bring an umbrella'")
            .condition("rain3h > 0")
            .build(),
    ];
    assert!(MessageSet::diagnose(&messages, &data_schema()).is_empty());
}

#[test]
fn warnings_are_recorded() {
    let messages = vec![
        Message::builder().template("1 + 2").build(),
        Message::builder()
            .template("'x'")
            .negative_template("'y'")
            .build(),
        Message::builder()
            .template("'z'")
            .condition("cloudiness")
            .build(),
    ];
    let set = MessageSet::compile(&messages, &data_schema()).unwrap();
    let warnings: Vec<String> = set.warnings().iter().map(ToString::to_string).collect();
    assert_eq!(
        warnings,
        vec![
            "message #0: template has kind int, expected string",
            "message #1: negative template is never used without a condition",
            "message #2: condition has kind int, expected bool",
        ]
    );
    assert!(matches!(
        set.warnings()[1],
        CompileWarning::UnusedNegativeTemplate { index: 1, .. }
    ));
}
