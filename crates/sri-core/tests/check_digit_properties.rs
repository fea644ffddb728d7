//! Property tests for the check-digit engine, identifier validation and
//! access-key generation.

use chrono::NaiveDate;
use proptest::prelude::*;

use sri_core::access_key::compute_check_digit;
use sri_core::checkdigit::ACCESS_KEY_WEIGHTS;
use sri_core::{
    mod10, mod11, validate_individual, AccessKey, AccessKeyError, AccessKeyInput, Direction,
    DocumentType, EmissionPoint, EmissionType, Environment, Establishment, Mod11Remap, NumericFill,
    Ruc, Sequential, ACCESS_KEY_LEN,
};

const INDIVIDUAL_WEIGHTS: [u8; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A structurally valid cédula with a correct check digit.
fn valid_cedula() -> impl Strategy<Value = String> {
    (1u8..=24, 0u8..=5, prop::collection::vec(0u8..=9, 6)).prop_map(|(province, third, rest)| {
        let mut digits = vec![province / 10, province % 10, third];
        digits.extend(rest);
        let check = mod10(&digits, &INDIVIDUAL_WEIGHTS, Direction::LeftToRight);
        digits.push(check);
        digits.iter().map(|d| char::from(b'0' + d)).collect()
    })
}

fn any_document_type() -> impl Strategy<Value = DocumentType> {
    prop::sample::select(DocumentType::all().to_vec())
}

fn access_key_input(doc: impl Strategy<Value = DocumentType>) -> impl Strategy<Value = AccessKeyInput> {
    (
        (2000i32..=2099, 1u32..=12, 1u32..=28),
        doc,
        prop::sample::select(vec!["1710034065001", "1790016919001", "1760001550001"]),
        prop::bool::ANY,
        (1u32..=999, 1u32..=999),
        1u64..=999_999_999,
        0u32..=99_999_999,
    )
        .prop_map(|((y, m, d), document_type, ruc, prod, (e, p), seq, fill)| AccessKeyInput {
            emission_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            document_type,
            issuer: Ruc::new(ruc).unwrap(),
            environment: if prod {
                Environment::Production
            } else {
                Environment::Test
            },
            establishment: Establishment::new(format!("{e:03}")).unwrap(),
            emission_point: EmissionPoint::new(format!("{p:03}")).unwrap(),
            sequential: Sequential::new(seq).unwrap(),
            numeric_fill: NumericFill::new(fill).unwrap(),
            emission_type: EmissionType::Normal,
        })
}

fn replace_digit(s: &str, index: usize, digit: u8) -> String {
    let mut bytes = s.as_bytes().to_vec();
    bytes[index] = b'0' + digit;
    String::from_utf8(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// mod10 and mod11 are pure: identical input, identical output.
    #[test]
    fn engines_are_deterministic(
        digits in prop::collection::vec(0u8..=9, 0..60),
        weights in prop::collection::vec(1u8..=9, 1..10),
        rtl in prop::bool::ANY,
    ) {
        let dir = if rtl { Direction::RightToLeft } else { Direction::LeftToRight };
        prop_assert_eq!(mod10(&digits, &weights, dir), mod10(&digits, &weights, dir));
        for remap in [Mod11Remap::Standard, Mod11Remap::Extended] {
            prop_assert_eq!(
                mod11(&digits, &weights, dir, remap),
                mod11(&digits, &weights, dir, remap)
            );
        }
    }

    /// mod10 always yields a digit; Extended mod11 always yields a digit;
    /// Standard mod11 yields at most 10.
    #[test]
    fn engine_output_ranges(
        digits in prop::collection::vec(0u8..=9, 0..60),
        weights in prop::collection::vec(1u8..=9, 1..10),
    ) {
        prop_assert!(mod10(&digits, &weights, Direction::LeftToRight) <= 9);
        prop_assert!(mod11(&digits, &weights, Direction::LeftToRight, Mod11Remap::Extended) <= 9);
        prop_assert!(mod11(&digits, &weights, Direction::LeftToRight, Mod11Remap::Standard) <= 10);
    }

    /// Every cédula built with a correct check digit validates.
    #[test]
    fn generated_cedulas_validate(id in valid_cedula()) {
        let check = validate_individual(&id);
        prop_assert!(check.valid, "{}: {:?}", id, check.reason);
    }

    /// Any single-digit mutation of a valid cédula is rejected.
    #[test]
    fn cedula_single_digit_mutation_rejected(
        id in valid_cedula(),
        index in 0usize..10,
        shift in 1u8..=9,
    ) {
        let original = id.as_bytes()[index] - b'0';
        let mutated = replace_digit(&id, index, (original + shift) % 10);
        prop_assert!(!validate_individual(&mutated).valid, "{} accepted", mutated);
    }

    /// Generated keys are 49 ASCII digits and parse back.
    #[test]
    fn generated_keys_are_well_formed(input in access_key_input(any_document_type())) {
        match AccessKey::generate(&input) {
            Ok(key) => {
                prop_assert_eq!(key.as_str().len(), ACCESS_KEY_LEN);
                prop_assert!(key.as_str().bytes().all(|b| b.is_ascii_digit()));
                let parsed = AccessKey::parse(key.as_str());
                prop_assert!(parsed.is_ok());
                prop_assert_eq!(key.numeric_fill(), input.numeric_fill.padded());
                prop_assert_eq!(key.sequential(), input.sequential.padded());
                prop_assert_eq!(key.document_type(), Some(input.document_type));
            }
            Err(e) => {
                prop_assert_eq!(input.document_type.access_key_remap(), Mod11Remap::Standard);
                let unrepresentable = matches!(e, AccessKeyError::UnrepresentableCheckDigit { .. });
                prop_assert!(unrepresentable);
            }
        }
    }

    /// Under the standard table, changing any single body digit changes the
    /// check digit, so only the original body reproduces it.
    #[test]
    fn standard_key_body_mutation_changes_check(
        input in access_key_input(prop::sample::select(vec![
            DocumentType::Invoice,
            DocumentType::ShipmentGuide,
        ])),
        index in 0usize..48,
        shift in 1u8..=9,
    ) {
        let key = AccessKey::generate(&input);
        prop_assume!(key.is_ok());
        let key = key.unwrap();
        let body = &key.as_str()[..48];
        let original = body.as_bytes()[index] - b'0';
        let mutated = replace_digit(body, index, (original + shift) % 10);
        let recomputed = compute_check_digit(&mutated, Mod11Remap::Standard).unwrap();
        prop_assert_ne!(recomputed, key.check_digit());
    }

    /// Generation is a pure function of its input.
    #[test]
    fn key_generation_deterministic(input in access_key_input(any_document_type())) {
        prop_assert_eq!(AccessKey::generate(&input), AccessKey::generate(&input));
    }
}

/// The extended table folds 10 onto 1, so two bodies that differ in one
/// digit can share a check digit. The standard table never does.
#[test]
fn extended_table_collision_is_real() {
    let a = "150120260717900169190011001001000000001000000021";
    let b = "150120260717900169190011001001000000001000000051";
    assert_eq!(compute_check_digit(a, Mod11Remap::Extended), Some(1));
    assert_eq!(compute_check_digit(b, Mod11Remap::Extended), Some(1));
    assert_eq!(compute_check_digit(a, Mod11Remap::Standard), Some(10));
    assert_eq!(compute_check_digit(b, Mod11Remap::Standard), Some(1));
}

#[test]
fn access_key_weights_cycle_two_through_seven() {
    assert_eq!(ACCESS_KEY_WEIGHTS, [2, 3, 4, 5, 6, 7]);
}
