use http_message_signatures::{Error, SignatureField, SignatureInputField};
use pretty_assertions::assert_eq;
use std::time::{Duration, SystemTime};

#[test]
fn rejects_member_values_that_are_not_inner_lists() {
    assert!(matches!(
        SignatureInputField::parse("hello").unwrap_err(),
        Error::NotInnerList { .. }
    ));
    assert!(matches!(
        SignatureInputField::parse("sig=\"hello\"").unwrap_err(),
        Error::NotInnerList { .. }
    ));
}

#[test]
fn empty_dictionary_and_empty_inner_list() {
    let field = SignatureInputField::parse("").unwrap();
    assert!(field.is_empty());

    let field = SignatureInputField::parse("sig=()").unwrap();
    assert_eq!(field.len(), 1);

    let metadata = field.get("sig").unwrap();
    assert!(metadata.is_empty());
    assert!(metadata.parameters().is_empty());
}

#[test]
fn component_names_parse_in_order() {
    let field = SignatureInputField::parse("sig=(\"authorization\" \"@method\")").unwrap();
    let metadata = field.get("sig").unwrap();

    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata.get(0).unwrap().name(), "authorization");
    assert_eq!(metadata.get(1).unwrap().name(), "@method");
}

#[test]
fn wire_validation_failures() {
    let cases: &[(&str, fn(&Error) -> bool)] = &[
        ("sig=(\"MyField\")", |error| {
            matches!(error, Error::UppercaseComponentName { .. })
        }),
        ("sig=(\"@unknown\")", |error| {
            matches!(error, Error::UnknownDerivedComponent { .. })
        }),
        ("sig=(\"@query-param\")", |error| {
            matches!(error, Error::MissingNameParameter)
        }),
        ("sig=(\"@signature-params\")", |error| {
            matches!(error, Error::ProhibitedComponent)
        }),
        ("sig=(\"my-field\";bs;sf)", |error| {
            matches!(error, Error::IncompatibleParameters { .. })
        }),
        ("sig=(\"my-field\";bs;key=\"x\")", |error| {
            matches!(error, Error::IncompatibleParameters { .. })
        }),
        ("sig=(token)", |error| {
            matches!(error, Error::NotComponentName { .. })
        }),
    ];

    for (input, matches_expected) in cases {
        let error = SignatureInputField::parse(input).unwrap_err();
        assert!(matches_expected(&error), "unexpected error for {input}: {error}");
    }
}

#[test]
fn equal_identifiers_with_reordered_parameters_are_duplicates() {
    let error = SignatureInputField::parse("sig=(\"foo\";bar;baz \"foo\";baz;bar)").unwrap_err();
    assert!(matches!(error, Error::DuplicateComponent { .. }));
}

#[test]
fn metadata_parameters_are_typed() {
    let field = SignatureInputField::parse(
        "sig=();alg=\"ed25519\";created=1714921200;expires=1714921260\
         ;keyid=\"my_keyid\";nonce=\"my_nonce\";tag=\"my_tag\"",
    )
    .unwrap();
    let params = field.get("sig").unwrap().parameters();

    assert_eq!(params.alg().unwrap(), Some("ed25519"));
    assert_eq!(
        params.created().unwrap(),
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_714_921_200))
    );
    assert_eq!(
        params.expires().unwrap(),
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_714_921_260))
    );
    assert_eq!(params.keyid().unwrap(), Some("my_keyid"));
    assert_eq!(params.nonce().unwrap(), Some("my_nonce"));
    assert_eq!(params.tag().unwrap(), Some("my_tag"));

    // A parameter of the wrong type is a typed failure, not a cast.
    let field = SignatureInputField::parse("sig=();alg=1234").unwrap();
    assert!(field.get("sig").unwrap().parameters().alg().is_err());
}

#[test]
fn component_parameters_are_typed() {
    let field = SignatureInputField::parse("sig=(\"my-field\";key=\"my_key\";req;sf;tr)").unwrap();
    let params = field.get("sig").unwrap().get(0).unwrap().params();

    assert!(!params.bs().unwrap());
    assert_eq!(params.key().unwrap(), Some("my_key"));
    assert_eq!(params.name().unwrap(), None);
    assert!(params.req().unwrap());
    assert!(params.sf().unwrap());
    assert!(params.tr().unwrap());
}

#[test]
fn signature_input_round_trips() {
    let values = [
        "sig=()",
        "sig=(\"@method\" \"@authority\" \"content-digest\");created=1618884475;keyid=\"test-key-rsa-pss\";alg=\"rsa-pss-sha512\"",
        "sig1=(\"@method\");tag=\"one\", sig2=(\"@authority\";req);tag=\"two\"",
        "sig=(\"@query-param\";name=\"var\" \"my-field\";bs)",
    ];

    for value in values {
        let parsed = SignatureInputField::parse(value).unwrap();
        assert_eq!(parsed.serialize(), value);
    }
}

#[test]
fn signature_field_members_are_byte_sequences() {
    let field = SignatureField::parse("sig=:dmFsdWUsIHdpdGgsIGxvdHM=:").unwrap();
    assert_eq!(field.get("sig"), Some(b"value, with, lots".as_slice()));

    assert!(matches!(
        SignatureField::parse("sig=\"not-bytes\"").unwrap_err(),
        Error::NotByteSequence { .. }
    ));
    assert!(matches!(
        SignatureField::parse("sig=(\"a\")").unwrap_err(),
        Error::NotByteSequence { .. }
    ));
}

#[test]
fn signature_field_round_trips() {
    let values = [
        "sig=:dmFsdWUsIHdpdGgsIGxvdHM=:",
        "sig1=:b2YsIGNvbW1hcw==:, sig2=:dmFsdWUsIHdpdGgsIGxvdHM=:",
    ];

    for value in values {
        let parsed = SignatureField::parse(value).unwrap();
        assert_eq!(parsed.serialize(), value);
    }
}

#[test]
fn insertion_order_is_preserved() {
    let mut field = SignatureField::new();
    field.insert("zeta", vec![1, 2, 3]);
    field.insert("alpha", vec![4, 5, 6]);

    let labels: Vec<_> = field.labels().collect();
    assert_eq!(labels, ["zeta", "alpha"]);
}
