use http_message_signatures::{
    ComponentIdentifier, ComponentParameters, ComponentValueProvider, Error, StructuredDataType,
};
use pretty_assertions::assert_eq;


fn identifier(name: &str, params: ComponentParameters) -> ComponentIdentifier {
    ComponentIdentifier::with_params(name, params)
}

#[test]
fn multiple_field_lines_combine_with_comma_space() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[
            ("cache-control", "max-age=60"),
            ("cache-control", "   must-revalidate"),
        ]))
        .build();

    assert_eq!(
        provider
            .component_value(&ComponentIdentifier::new("cache-control"))
            .unwrap(),
        Some("max-age=60, must-revalidate".to_owned())
    );
}

#[test]
fn field_lookup_is_case_insensitive() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[("X-Custom", "value")]))
        .build();

    assert_eq!(
        provider
            .component_value(&ComponentIdentifier::new("x-custom"))
            .unwrap(),
        Some("value".to_owned())
    );
}

#[test]
fn sf_round_trips_through_the_strict_serializer() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[(
            "example-dict",
            " a=1,    b=2;x=1;y=2,   c=(a   b   c)",
        )]))
        .build();

    // Without the flag, the value is only trimmed and joined.
    assert_eq!(
        provider
            .component_value(&ComponentIdentifier::new("example-dict"))
            .unwrap(),
        Some("a=1,    b=2;x=1;y=2,   c=(a   b   c)".to_owned())
    );

    let strict = provider
        .component_value(&identifier(
            "example-dict",
            ComponentParameters::new().with_sf(true),
        ))
        .unwrap();
    assert_eq!(strict, Some("a=1, b=2;x=1;y=2, c=(a b c)".to_owned()));

    // Applying sf to an already strict value is a no-op.
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[(
            "example-dict",
            "a=1, b=2;x=1;y=2, c=(a b c)",
        )]))
        .build();
    assert_eq!(
        provider
            .component_value(&identifier(
                "example-dict",
                ComponentParameters::new().with_sf(true),
            ))
            .unwrap(),
        Some("a=1, b=2;x=1;y=2, c=(a b c)".to_owned())
    );
}

#[test]
fn key_selects_a_single_dictionary_member() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[(
            "example-dict",
            " a=1, b=2;x=1;y=2, c=(a   b    c), d",
        )]))
        .build();

    let cases = [("a", "1"), ("b", "2;x=1;y=2"), ("c", "(a b c)"), ("d", "?1")];
    for (key, expected) in cases {
        assert_eq!(
            provider
                .component_value(&identifier(
                    "example-dict",
                    ComponentParameters::new().with_key(key),
                ))
                .unwrap(),
            Some(expected.to_owned()),
            "member '{key}'"
        );
    }
}

#[test]
fn key_on_a_missing_field_or_member_fails() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[("example-dict", "a=\"b\"")]))
        .build();

    let error = provider
        .component_value(&identifier(
            "absent-dict",
            ComponentParameters::new().with_key("a"),
        ))
        .unwrap_err();
    assert!(matches!(error, Error::FieldMissing { .. }));

    let error = provider
        .component_value(&identifier(
            "example-dict",
            ComponentParameters::new().with_key("nonexistent"),
        ))
        .unwrap_err();
    assert!(matches!(error, Error::DictionaryMemberMissing { .. }));
}

#[test]
fn bs_wraps_each_field_line_separately() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[
            ("example-header", "value, with, lots"),
            ("example-header", "of, commas"),
        ]))
        .build();

    assert_eq!(
        provider
            .component_value(&ComponentIdentifier::new("example-header"))
            .unwrap(),
        Some("value, with, lots, of, commas".to_owned())
    );
    assert_eq!(
        provider
            .component_value(&identifier(
                "example-header",
                ComponentParameters::new().with_bs(true),
            ))
            .unwrap(),
        Some(":dmFsdWUsIHdpdGgsIGxvdHM=:, :b2YsIGNvbW1hcw==:".to_owned())
    );
}

#[test]
fn bs_over_a_single_combined_line_differs() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[(
            "example-header",
            "value, with, lots, of, commas",
        )]))
        .build();

    assert_eq!(
        provider
            .component_value(&identifier(
                "example-header",
                ComponentParameters::new().with_bs(true),
            ))
            .unwrap(),
        Some(":dmFsdWUsIHdpdGgsIGxvdHMsIG9mLCBjb21tYXM=:".to_owned())
    );
}

#[test]
fn req_and_tr_select_the_field_pool() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[("my-field", "header")]))
        .trailers(data::header_map(&[("my-field", "trailer")]))
        .request_headers(data::header_map(&[("my-field", "header-in-request")]))
        .request_trailers(data::header_map(&[("my-field", "trailer-in-request")]))
        .build();

    let cases = [
        (ComponentParameters::new(), "header"),
        (ComponentParameters::new().with_tr(true), "trailer"),
        (ComponentParameters::new().with_req(true), "header-in-request"),
        (
            ComponentParameters::new().with_req(true).with_tr(true),
            "trailer-in-request",
        ),
    ];

    for (params, expected) in cases {
        assert_eq!(
            provider
                .component_value(&identifier("my-field", params))
                .unwrap(),
            Some(expected.to_owned())
        );
    }
}

#[test]
fn absent_pool_means_an_absent_value() {
    let provider = ComponentValueProvider::builder()
        .trailers(data::header_map(&[("expires", "Wed, 9 Nov 2022 07:28:00 GMT")]))
        .build();

    // The header pool is unset, so the plain lookup finds nothing.
    assert_eq!(
        provider
            .component_value(&ComponentIdentifier::new("expires"))
            .unwrap(),
        None
    );
    assert_eq!(
        provider
            .component_value(&identifier(
                "expires",
                ComponentParameters::new().with_tr(true),
            ))
            .unwrap(),
        Some("Wed, 9 Nov 2022 07:28:00 GMT".to_owned())
    );
}

#[test]
fn sf_requires_a_known_data_type() {
    let mut provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[("my-list-field", "a, b")]))
        .build();

    let sf = identifier("my-list-field", ComponentParameters::new().with_sf(true));

    let error = provider.component_value(&sf).unwrap_err();
    assert!(matches!(error, Error::UnknownDataType { .. }));

    provider.set_data_type("my-list-field", StructuredDataType::List);
    assert_eq!(
        provider.component_value(&sf).unwrap(),
        Some("a, b".to_owned())
    );
}

#[test]
fn caller_mappings_cover_all_three_types() {
    let mut provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[
            ("my-item-field", "123"),
            ("my-dictionary-field", "a=\"b\""),
        ]))
        .build();
    provider.set_data_type("my-item-field", StructuredDataType::Item);
    provider.set_data_type("my-dictionary-field", StructuredDataType::Dictionary);

    assert_eq!(
        provider
            .component_value(&identifier(
                "my-item-field",
                ComponentParameters::new().with_sf(true),
            ))
            .unwrap(),
        Some("123".to_owned())
    );
    assert_eq!(
        provider
            .component_value(&identifier(
                "my-dictionary-field",
                ComponentParameters::new().with_sf(true),
            ))
            .unwrap(),
        Some("a=\"b\"".to_owned())
    );
}

#[test]
fn sf_parse_failure_is_an_error() {
    let provider = ComponentValueProvider::builder()
        .headers(data::header_map(&[("example-dict", "a=(unterminated")]))
        .build();

    let error = provider
        .component_value(&identifier(
            "example-dict",
            ComponentParameters::new().with_sf(true),
        ))
        .unwrap_err();
    assert!(matches!(error, Error::MalformedField { .. }));
}
