use super::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn tiff_policy() -> Policy {
    Policy::new(MIME_TYPE_CLASSIFICATION, "image/tiff", "diskA")
}

#[test]
fn separately_built_policies_are_equal() {
    let a = Policy::new("mime", "image/tiff", "diskA");
    let b = Policy::new("mime".to_string(), "image/tiff".to_string(), "diskA".to_string());
    assert_eq!(a, b);

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn any_differing_field_breaks_equality() {
    let base = Policy::new("mime", "image/tiff", "diskA");
    assert_ne!(base, Policy::new("other", "image/tiff", "diskA"));
    assert_ne!(base, Policy::new("mime", "image/png", "diskA"));
    assert_ne!(base, Policy::new("mime", "image/tiff", "diskB"));
}

proptest! {
    #[test]
    fn equality_is_structural(
        key in "[a-z]{1,8}:[a-zA-Z]{1,8}",
        value in "[a-z]{1,8}/[a-z0-9.+-]{1,12}",
        hint in "[a-zA-Z0-9_-]{1,16}",
        other_hint in "[a-zA-Z0-9_-]{1,16}",
    ) {
        let a = Policy::new(key.clone(), value.clone(), hint.clone());
        let b = Policy::new(key.clone(), value.clone(), hint.clone());
        prop_assert_eq!(&a, &b);

        let c = Policy::new(key, value, other_hint.clone());
        prop_assert_eq!(a == c, hint == other_hint);
    }
}

#[test]
fn matches_on_classification_value() {
    let policy = tiff_policy();
    let tiff = ResourceAttributes::new().with(MIME_TYPE_CLASSIFICATION, "image/tiff");
    let pdf = ResourceAttributes::new().with(MIME_TYPE_CLASSIFICATION, "application/pdf");
    let other_key = ResourceAttributes::new().with("nt:file", "image/tiff");

    assert!(policy.matches(&tiff));
    assert!(!policy.matches(&pdf));
    assert!(!policy.matches(&other_key));
    assert!(!policy.matches(&ResourceAttributes::new()));
}

#[test]
fn property_value_joins_match_and_hint() {
    assert_eq!(tiff_policy().property_value(), "image/tiff:diskA");
    assert_eq!(
        Policy::new(MIME_TYPE_CLASSIFICATION, "image/tiff", "s3://bucket").property_value(),
        "image/tiff:s3://bucket"
    );
}

#[test]
fn display_renders_one_line() {
    assert_eq!(tiff_policy().to_string(), "mix:mimeType image/tiff -> diskA");
}

#[test]
fn attributes_collect_and_render_sorted() {
    let attrs: ResourceAttributes = vec![("nt:file", "x"), ("mix:mimeType", "image/tiff")]
        .into_iter()
        .collect();
    assert_eq!(attrs.to_string(), "mix:mimeType=image/tiff, nt:file=x");
    assert_eq!(ResourceAttributes::new().to_string(), "(no attributes)");
}

#[test]
fn factory_builds_mime_policies() {
    let factory = PolicyFactory::new();
    assert!(factory.supports(MIME_TYPE_CLASSIFICATION));
    assert_eq!(factory.family_name(MIME_TYPE_CLASSIFICATION), Some("mime-type"));

    let policy = factory
        .build(MIME_TYPE_CLASSIFICATION, "image/tiff", "diskA")
        .unwrap();
    assert_eq!(policy, tiff_policy());
}

#[test]
fn factory_rejects_unmapped_classification() {
    let err = PolicyFactory::new()
        .build("nt:file", "image/tiff", "diskA")
        .unwrap_err();
    assert!(matches!(err, BrokerError::UnsupportedClassification(_)), "{err}");

    let err = PolicyFactory::empty()
        .build(MIME_TYPE_CLASSIFICATION, "image/tiff", "diskA")
        .unwrap_err();
    assert!(matches!(err, BrokerError::UnsupportedClassification(_)), "{err}");
}

#[test]
fn factory_rejects_malformed_values() {
    let factory = PolicyFactory::new();
    for (value, hint) in [
        ("", "diskA"),
        ("image/tiff", ""),
        ("image/tiff", "disk A"),
        ("image:tiff", "diskA"),
        ("tiff", "diskA"),
        ("image/", "diskA"),
        ("/tiff", "diskA"),
        ("image/tiff/x", "diskA"),
    ] {
        let err = factory
            .build(MIME_TYPE_CLASSIFICATION, value, hint)
            .unwrap_err();
        assert!(
            matches!(err, BrokerError::InvalidArgument(_)),
            "({value:?}, {hint:?}) -> {err}"
        );
    }
}

struct ExtensionFamily;

impl PolicyFamily for ExtensionFamily {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn build(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy> {
        Ok(Policy::new(
            classification,
            match_value.to_ascii_lowercase(),
            storage_hint,
        ))
    }
}

#[test]
fn registering_a_family_extends_the_factory() {
    let mut factory = PolicyFactory::new();
    assert!(factory
        .register("ext:suffix", Arc::new(ExtensionFamily))
        .is_none());

    let policy = factory.build("ext:suffix", "TIF", "diskC").unwrap();
    assert_eq!(policy, Policy::new("ext:suffix", "tif", "diskC"));
    assert!(factory.supports(MIME_TYPE_CLASSIFICATION));
    assert!(format!("{factory:?}").contains("ext:suffix"));
}
