use http_message_signatures::{
    ring::{
        hmac,
        rand::SystemRandom,
        signature::{
            EcdsaKeyPair, Ed25519KeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
            ECDSA_P256_SHA256_FIXED_SIGNING, ED25519,
        },
    },
    ComponentValueProvider, SignatureBase, SignatureBaseBuilder, SignatureField,
    SignatureInputField,
};
use pretty_assertions::assert_eq;


fn build_base(context: &ComponentValueProvider) -> SignatureBase {
    SignatureBaseBuilder::new(context)
        .build(&data::covered_metadata())
        .unwrap()
}

#[test]
fn hmac_round_trip() {
    let key = hmac::Key::new(hmac::HMAC_SHA256, b"shared-secret-key-material");
    let base = build_base(&data::request_provider());

    let signature = base.sign(&key).unwrap();
    assert!(base.verify(&key, &signature).unwrap());

    // Any flipped bit invalidates the signature.
    let mut tampered = signature;
    tampered[0] ^= 0x01;
    assert!(!base.verify(&key, &tampered).unwrap());
}

#[test]
fn ed25519_round_trip() {
    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
    let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
    let public_key = UnparsedPublicKey::new(&ED25519, key_pair.public_key().as_ref().to_vec());

    let base = build_base(&data::request_provider());
    let signature = base.sign(&key_pair).unwrap();

    assert!(base.verify(&public_key, &signature).unwrap());

    let mut tampered = signature.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x80;
    assert!(!base.verify(&public_key, &tampered).unwrap());
}

#[test]
fn ecdsa_round_trip() {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
    let key_pair =
        EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng).unwrap();
    let public_key =
        UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, key_pair.public_key().as_ref().to_vec());

    let base = build_base(&data::request_provider());
    let signature = base.sign(&key_pair).unwrap();

    assert!(base.verify(&public_key, &signature).unwrap());
}

#[test]
fn any_base_change_breaks_verification() {
    let key = hmac::Key::new(hmac::HMAC_SHA256, b"shared-secret-key-material");
    let base = build_base(&data::request_provider());
    let signature = base.sign(&key).unwrap();

    // Same message observed with a non-default port: the authority line,
    // and with it the canonical base, changes.
    let changed = ComponentValueProvider::builder()
        .method("POST")
        .target_uri(
            "https://example.com:8443/foo?param=value&pet=dog"
                .parse::<http::Uri>()
                .unwrap(),
        )
        .headers(data::header_map(&[("content-type", "application/json")]))
        .build();
    let changed_base = build_base(&changed);

    assert_ne!(base.to_bytes(), changed_base.to_bytes());
    assert!(!changed_base.verify(&key, &signature).unwrap());
}

#[test]
fn signing_flow_over_the_wire_fields() {
    let key = hmac::Key::new(hmac::HMAC_SHA256, b"shared-secret-key-material");

    // Signer side: build the base, sign it, and emit both field values.
    let context = data::request_provider();
    let metadata = data::covered_metadata();
    let base = SignatureBaseBuilder::new(&context).build(&metadata).unwrap();
    let signature = base.sign(&key).unwrap();

    let mut signature_input = SignatureInputField::new();
    signature_input.insert("sig1", metadata);
    let mut signature_field = SignatureField::new();
    signature_field.insert("sig1", signature);

    let input_value = signature_input.serialize();
    let signature_value = signature_field.serialize();

    // Verifier side: recover the metadata, rebuild the base from the
    // received message, and check the signature under the same label.
    let received_input = SignatureInputField::parse(&input_value).unwrap();
    let received_signatures = SignatureField::parse(&signature_value).unwrap();

    let labels: Vec<_> = received_input.labels().collect();
    assert_eq!(labels, received_signatures.labels().collect::<Vec<_>>());

    let metadata = received_input.get("sig1").unwrap();
    let rebuilt = SignatureBaseBuilder::new(&context).build(metadata).unwrap();

    assert_eq!(rebuilt.to_bytes(), base.to_bytes());
    assert!(rebuilt
        .verify(&key, received_signatures.get("sig1").unwrap())
        .unwrap());
}
