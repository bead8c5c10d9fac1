//! Integration tests for evaluating compiled messages.

use skycast::weather::data_schema;
use skycast::{
    Choice, EnvironmentSchema, EvalError, Forecast, HourlyForecast, Kind, Message, MessageSet,
    Outcome, RuntimeError, UNMATCHED, Variable, WeatherData, environment,
};

fn temperature_schema() -> EnvironmentSchema {
    EnvironmentSchema::new().with("temperature", Kind::Float)
}

fn compile(messages: &[Message]) -> MessageSet {
    MessageSet::compile(messages, &temperature_schema()).unwrap()
}

// =========================================================================
// Rendering
// =========================================================================

#[test]
fn variable_choice_renders_template() {
    let messages = vec![
        Message::builder()
            .template("'Test is ' + test")
            .variables(vec![Variable::new(
                "test",
                vec![
                    Choice::new("temperature < 20 && temperature > 10", "test"),
                    Choice::new("temperature <= 10", "foo"),
                ],
            )])
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(set.evaluate_all(&environment! { "temperature" => 15 }), vec!["Test is test"]);
    assert_eq!(set.evaluate_all(&environment! { "temperature" => 5 }), vec!["Test is foo"]);
}

#[test]
fn false_condition_without_negative_template_is_skipped() {
    let messages = vec![
        Message::builder()
            .template("'Bring an umbrella'")
            .condition("temperature < 20")
            .build(),
    ];
    let set = compile(&messages);
    let env = environment! { "temperature" => 21 };
    assert_eq!(set.evaluate_all(&env), vec![""]);
    assert_eq!(set.outcomes(&env), vec![Outcome::Skipped]);
}

#[test]
fn false_condition_renders_negative_template() {
    let messages = vec![
        Message::builder()
            .template("'Bring an umbrella'")
            .negative_template("'Bring two umbrellas'")
            .condition("temperature < 20")
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(
        set.evaluate_all(&environment! { "temperature" => 21 }),
        vec!["Bring two umbrellas"]
    );
    assert_eq!(
        set.evaluate_all(&environment! { "temperature" => 19 }),
        vec!["Bring an umbrella"]
    );
}

#[test]
fn blank_condition_is_treated_as_absent() {
    let messages = vec![
        Message::builder()
            .template("'always'")
            .condition("   ")
            .negative_template("")
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(set.evaluate_all(&environment! { "temperature" => 1 }), vec!["always"]);
}

// =========================================================================
// Choice resolution
// =========================================================================

#[test]
fn first_matching_choice_wins() {
    let messages = vec![
        Message::builder()
            .template("size")
            .variables(vec![Variable::new(
                "size",
                vec![
                    Choice::new("temperature > 0", "first"),
                    Choice::new("temperature > 10", "second"),
                ],
            )])
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(set.evaluate_all(&environment! { "temperature" => 15 }), vec!["first"]);
}

#[test]
fn unmatched_choices_bind_sentinel() {
    let messages = vec![
        Message::builder()
            .template("'[' + layer + ']'")
            .variables(vec![Variable::new(
                "layer",
                vec![Choice::new("temperature > 100", "nothing")],
            )])
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(
        set.evaluate_all(&environment! { "temperature" => 15 }),
        vec![format!("[{UNMATCHED}]")]
    );
}

#[test]
fn variable_without_choices_binds_empty_string() {
    let messages = vec![
        Message::builder()
            .template("'[' + layer + ']'")
            .variables(vec![Variable::new("layer", vec![])])
            .build(),
    ];
    let set = compile(&messages);
    assert_eq!(set.evaluate_all(&environment! { "temperature" => 15 }), vec!["[]"]);
}

#[test]
fn failing_guard_is_skipped() {
    let schema = EnvironmentSchema::new().with("cloudiness", Kind::Int);
    let messages = vec![
        Message::builder()
            .template("sky")
            .variables(vec![Variable::new(
                "sky",
                vec![
                    Choice::new("100 % cloudiness == 0", "odd"),
                    Choice::new("cloudiness > 50", "cloudy"),
                ],
            )])
            .build(),
    ];
    let set = MessageSet::compile(&messages, &schema).unwrap();
    assert_eq!(set.evaluate_all(&environment! { "cloudiness" => 0 }), vec![UNMATCHED]);
    assert_eq!(set.evaluate_all(&environment! { "cloudiness" => 75 }), vec!["cloudy"]);
}

// =========================================================================
// Failure isolation
// =========================================================================

#[test]
fn non_string_template_fails_with_render_type() {
    let messages = vec![Message::builder().template("1 + 2").build()];
    let set = compile(&messages);
    let env = environment! { "temperature" => 15 };
    assert_eq!(set.evaluate_all(&env), vec![""]);
    assert!(matches!(
        set.outcomes(&env).as_slice(),
        [Outcome::Failed(EvalError::RenderType { .. })]
    ));
}

#[test]
fn non_bool_condition_fails_with_condition_type() {
    let messages = vec![
        Message::builder()
            .template("'hot'")
            .condition("temperature")
            .build(),
    ];
    let set = compile(&messages);
    let env = environment! { "temperature" => 31.5 };
    assert_eq!(set.evaluate_all(&env), vec![""]);

    let outcomes = set.outcomes(&env);
    let [Outcome::Failed(EvalError::ConditionType { expression, found })] = outcomes.as_slice()
    else {
        panic!("expected condition type failure, got {outcomes:?}");
    };
    assert_eq!(expression, "temperature");
    assert_eq!(found, "float");
}

#[test]
fn template_runtime_error_fails_with_render_eval() {
    let messages = vec![Message::builder().template("sprintf('%d', 'a')").build()];
    let set = compile(&messages);
    let env = environment! { "temperature" => 15 };
    assert_eq!(set.evaluate_all(&env), vec![""]);

    let outcomes = set.outcomes(&env);
    let [Outcome::Failed(error @ EvalError::RenderEval { source, .. })] = outcomes.as_slice()
    else {
        panic!("expected render failure, got {outcomes:?}");
    };
    assert!(matches!(source, RuntimeError::Format { .. }));
    assert_eq!(error.expression(), "sprintf('%d', 'a')");
}

#[test]
fn condition_runtime_error_fails_only_that_message() {
    let messages = vec![
        Message::builder().template("'first'").build(),
        Message::builder()
            .template("'second'")
            .condition("temperature / 0 > 1")
            .build(),
        Message::builder().template("'third'").build(),
    ];
    let set = compile(&messages);
    let env = environment! { "temperature" => 15 };
    assert_eq!(set.evaluate_all(&env), vec!["first", "", "third"]);

    let outcomes = set.outcomes(&env);
    let Outcome::Failed(error) = &outcomes[1] else {
        panic!("expected failure, got {:?}", outcomes[1]);
    };
    assert!(matches!(error, EvalError::ConditionEval { .. }));
    assert_eq!(error.expression(), "temperature / 0 > 1");
}

#[test]
fn missing_data_fails_the_condition() {
    let messages = vec![
        Message::builder()
            .template("'warm'")
            .condition("temperature > 10")
            .build(),
    ];
    let set = compile(&messages);
    let outcome = set.evaluate_one(0, &environment! {}).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Failed(EvalError::ConditionEval { .. })
    ));
    assert!(set.evaluate_one(1, &environment! {}).is_none());
}

#[test]
fn output_order_matches_configuration() {
    let messages: Vec<Message> = (0..20)
        .map(|i| {
            Message::builder()
                .template(format!("'m{i}'"))
                .condition(if i % 3 == 0 { "temperature > 100" } else { "true" })
                .build()
        })
        .collect();
    let set = compile(&messages);
    let output = set.evaluate_all(&environment! { "temperature" => 15 });
    assert_eq!(output.len(), 20);
    for (i, text) in output.iter().enumerate() {
        if i % 3 == 0 {
            assert_eq!(text, "");
        } else {
            assert_eq!(text, &format!("m{i}"));
        }
    }
}

#[test]
fn parallel_evaluation_matches_sequential() {
    let messages: Vec<Message> = (0..13)
        .map(|i| {
            Message::builder()
                .template(format!("'#{i} ' + feel"))
                .variables(vec![Variable::new(
                    "feel",
                    vec![
                        Choice::new(format!("temperature > {i}"), "warm"),
                        Choice::new("true", "cold"),
                    ],
                )])
                .build()
        })
        .collect();
    let set = compile(&messages);
    let env = environment! { "temperature" => 6.5 };
    let sequential = set.evaluate_all(&env);
    for workers in [0, 1, 2, 4, 13, 32] {
        assert_eq!(set.evaluate_all_parallel(&env, workers), sequential);
    }
}

#[test]
fn empty_message_list_renders_nothing() {
    let set = compile(&[]);
    assert!(set.is_empty());
    assert!(set.evaluate_all(&environment! {}).is_empty());
    assert!(set.evaluate_all_parallel(&environment! {}, 4).is_empty());
}

// =========================================================================
// Weather environment
// =========================================================================

#[test]
fn renders_against_weather_snapshot() {
    let data = WeatherData::builder()
        .temperature(8.25)
        .feels_like(7.0)
        .cloudiness(90)
        .rain3h(1.5)
        .current_time("2026-10-18T07:30:00+02:00".parse().unwrap())
        .forecast(Forecast::new(vec![
            HourlyForecast::builder().temperature(9.0).rain(0.0).build(),
            HourlyForecast::builder().temperature(11.0).rain(3.0).build(),
        ]))
        .build();

    let messages = vec![
        Message::builder()
            .id("umbrella")
            .template("'Bring an umbrella'")
            .negative_template("'No umbrella needed'")
            .condition("rain3h > 0 || forecast.rain > 2")
            .build(),
        Message::builder()
            .id("layer")
            .template("sprintf('Wear a %s, it is %s', layer, sky)")
            .variables(vec![
                Variable::new(
                    "layer",
                    vec![
                        Choice::new("feelsLike < 5 || temperatureIn(1) < 5", "coat"),
                        Choice::new("temperature < 12", "jumper"),
                    ],
                ),
                Variable::new(
                    "sky",
                    vec![
                        Choice::new("cloudiness > 80", "overcast"),
                        Choice::new("true", "fair"),
                    ],
                ),
            ])
            .build(),
        Message::builder()
            .id("morning")
            .template("'Good morning'")
            .condition("currentTime.hour < 12 && currentTime.weekday == 0")
            .build(),
    ];

    let set = MessageSet::compile(&messages, &data_schema()).unwrap();
    assert_eq!(
        set.evaluate_all(&data.environment()),
        vec![
            "Bring an umbrella",
            "Wear a jumper, it is overcast",
            "Good morning"
        ]
    );
}
