//! Product resolution tests
//!
//! Tests for resolving entry product references:
//! - Precedence: id, then name match, then barcode match, then create
//! - Image gate for shops requiring photos of new products
//! - Auto-created products start as PENDING_REVIEW

use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A shop product as seen by the resolver
#[derive(Debug, Clone, PartialEq)]
struct ShopProduct {
    name: String,
    barcode: Option<String>,
    quantity_type: &'static str,
    price: Decimal,
    status: &'static str,
}

/// How an entry refers to its product
#[derive(Debug, Default)]
struct ProductRef {
    name_text: Option<String>,
    barcode: Option<String>,
    quantity_type: Option<&'static str>,
    image_ref: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Resolution {
    Matched(usize),
    Created(ShopProduct),
    ImageRequired,
}

/// Simulate free-text resolution against a shop's product list
fn resolve(
    products: &[ShopProduct],
    r: &ProductRef,
    require_image: bool,
    purchase_price: Option<Decimal>,
) -> Resolution {
    let name = r.name_text.as_deref().unwrap_or_default().trim();

    // Name match first
    if let Some(idx) = products
        .iter()
        .position(|p| p.name.eq_ignore_ascii_case(name))
    {
        return Resolution::Matched(idx);
    }

    // Then barcode
    if let Some(barcode) = &r.barcode {
        if let Some(idx) = products
            .iter()
            .position(|p| p.barcode.as_deref() == Some(barcode.as_str()))
        {
            return Resolution::Matched(idx);
        }
    }

    // No match: the image gate applies only to creation
    if require_image && r.image_ref.is_none() {
        return Resolution::ImageRequired;
    }

    Resolution::Created(ShopProduct {
        name: name.to_string(),
        barcode: r.barcode.clone(),
        quantity_type: r.quantity_type.unwrap_or("UNIT"),
        price: purchase_price.unwrap_or(Decimal::ZERO),
        status: "PENDING_REVIEW",
    })
}

fn sample_products() -> Vec<ShopProduct> {
    vec![
        ShopProduct {
            name: "Sukari 1kg".to_string(),
            barcode: Some("6161100112237".to_string()),
            quantity_type: "UNIT",
            price: dec("3200.00"),
            status: "REVIEWED",
        },
        ShopProduct {
            name: "Mchele".to_string(),
            barcode: None,
            quantity_type: "WEIGHT_VOLUME",
            price: dec("2800.00"),
            status: "LINKED",
        },
    ]
}

#[test]
fn test_name_match_case_insensitive() {
    let products = sample_products();
    let r = ProductRef {
        name_text: Some("sukari 1KG".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve(&products, &r, false, None), Resolution::Matched(0));
}

#[test]
fn test_name_match_wins_over_barcode() {
    let products = sample_products();
    // Name matches product 1, barcode matches product 0
    let r = ProductRef {
        name_text: Some("Mchele".to_string()),
        barcode: Some("6161100112237".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve(&products, &r, false, None), Resolution::Matched(1));
}

#[test]
fn test_barcode_match_when_name_unknown() {
    let products = sample_products();
    let r = ProductRef {
        name_text: Some("Sugar one kilo".to_string()),
        barcode: Some("6161100112237".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve(&products, &r, false, None), Resolution::Matched(0));
}

#[test]
fn test_unmatched_creates_pending_review() {
    let products = sample_products();
    let r = ProductRef {
        name_text: Some("Unga wa ngano".to_string()),
        quantity_type: Some("WEIGHT_VOLUME"),
        ..Default::default()
    };

    match resolve(&products, &r, false, Some(dec("1500.00"))) {
        Resolution::Created(p) => {
            assert_eq!(p.name, "Unga wa ngano");
            assert_eq!(p.status, "PENDING_REVIEW");
            assert_eq!(p.quantity_type, "WEIGHT_VOLUME");
            assert_eq!(p.price, dec("1500.00"));
        }
        other => panic!("expected creation, got {:?}", other),
    }
}

#[test]
fn test_created_product_defaults() {
    let products = sample_products();
    let r = ProductRef {
        name_text: Some("Chumvi".to_string()),
        ..Default::default()
    };

    match resolve(&products, &r, false, None) {
        Resolution::Created(p) => {
            // No purchase price: price starts at zero; counting defaults to UNIT
            assert_eq!(p.price, Decimal::ZERO);
            assert_eq!(p.quantity_type, "UNIT");
        }
        other => panic!("expected creation, got {:?}", other),
    }
}

#[test]
fn test_image_gate_blocks_creation_only() {
    let products = sample_products();

    // Matching an existing product needs no image even in strict shops
    let matched = ProductRef {
        name_text: Some("Mchele".to_string()),
        ..Default::default()
    };
    assert_eq!(resolve(&products, &matched, true, None), Resolution::Matched(1));

    // Creating without an image is rejected
    let unmatched = ProductRef {
        name_text: Some("Chumvi".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve(&products, &unmatched, true, None),
        Resolution::ImageRequired
    );

    // With an image the creation goes through
    let with_image = ProductRef {
        name_text: Some("Chumvi".to_string()),
        image_ref: Some("uploads/chumvi.jpg".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        resolve(&products, &with_image, true, None),
        Resolution::Created(_)
    ));
}

/// Derive a product's review status from its catalog link, mirroring the
/// create/update rules: linking wins, unlinking sends it back to review,
/// and an explicit status always overrides.
fn derive_status(
    linked: bool,
    link_changed: bool,
    explicit: Option<&'static str>,
    previous: &'static str,
) -> &'static str {
    match explicit {
        Some(status) => status,
        None if link_changed && linked => "LINKED",
        None if link_changed => "PENDING_REVIEW",
        None => previous,
    }
}

#[test]
fn test_linking_sets_linked_status() {
    assert_eq!(derive_status(true, true, None, "PENDING_REVIEW"), "LINKED");
}

#[test]
fn test_unlinking_returns_to_review() {
    assert_eq!(derive_status(false, true, None, "LINKED"), "PENDING_REVIEW");
}

#[test]
fn test_explicit_status_overrides_link_derivation() {
    assert_eq!(derive_status(true, true, Some("REVIEWED"), "LINKED"), "REVIEWED");
    assert_eq!(derive_status(false, true, Some("ARCHIVED"), "LINKED"), "ARCHIVED");
}

#[test]
fn test_untouched_link_keeps_previous_status() {
    assert_eq!(derive_status(true, false, None, "REVIEWED"), "REVIEWED");
}

#[test]
fn test_repeated_text_resolves_to_same_product() {
    let mut products = sample_products();
    let r = ProductRef {
        name_text: Some("Chumvi".to_string()),
        ..Default::default()
    };

    // First entry creates the product
    let created = match resolve(&products, &r, false, None) {
        Resolution::Created(p) => p,
        other => panic!("expected creation, got {:?}", other),
    };
    products.push(created);

    // Second entry with the same text matches it instead of duplicating
    assert_eq!(resolve(&products, &r, false, None), Resolution::Matched(2));
}
