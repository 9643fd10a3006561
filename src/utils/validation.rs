//! Validation utilities

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::types::*;

/// Validate a product id: 6 to 10 ASCII letters or digits
pub fn validate_product_id(product_id: &str) -> LedgerResult<String> {
    let valid_length = (6..=10).contains(&product_id.len());
    if !valid_length || !product_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::validation(
            "product_id",
            product_id,
            "expected 6 to 10 ASCII letters or digits",
        ));
    }

    Ok(product_id.to_string())
}

/// Validate that a transaction detail is non-empty
pub fn validate_transaction_detail(detail: &str) -> LedgerResult<String> {
    if detail.is_empty() {
        return Err(LedgerError::validation(
            "transaction_detail",
            "\"\"",
            "must not be empty",
        ));
    }

    Ok(detail.to_string())
}

/// Validate a supplier or customer id
pub fn validate_party_id(field: &'static str, id: i64) -> LedgerResult<u64> {
    u64::try_from(id).map_err(|_| LedgerError::validation(field, id, "must be >= 0"))
}

/// Validate a shipped quantity
pub fn validate_quantity(quantity: i64) -> LedgerResult<u64> {
    u64::try_from(quantity)
        .map_err(|_| LedgerError::validation("quantity", quantity, "must be >= 0"))
}

/// Validate a `YYYY-MM-DD` string that names a real calendar date
pub fn validate_date(field: &'static str, date: &str) -> LedgerResult<NaiveDate> {
    let bytes = date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(LedgerError::validation(
            field,
            date,
            "expected format YYYY-MM-DD",
        ));
    }

    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) if parsed.year() >= 1 => Ok(parsed),
        _ => Err(LedgerError::validation(field, date, "not a calendar date")),
    }
}

/// Validate that delivery is not expected before shipment
pub fn validate_delivery_window(
    shipment_date: NaiveDate,
    expected_delivery_date: NaiveDate,
) -> LedgerResult<()> {
    if expected_delivery_date < shipment_date {
        return Err(LedgerError::validation(
            "expected_delivery_date",
            expected_delivery_date,
            format!("precedes shipment_date {}", shipment_date),
        ));
    }

    Ok(())
}

/// Read a string field, rejecting any other JSON type
pub fn expect_str<'a>(payload: &'a Map<String, Value>, field: &'static str) -> LedgerResult<&'a str> {
    match payload.get(field) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(LedgerError::validation(field, other, "expected a string")),
        None => Err(LedgerError::MissingFields {
            missing: vec![field.to_string()],
        }),
    }
}

/// Read an integer field, rejecting booleans, floats and values beyond `i64`
pub fn expect_int(
    payload: &Map<String, Value>,
    field: &'static str,
) -> LedgerResult<i64> {
    match payload.get(field) {
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| LedgerError::validation(field, number, "expected an integer")),
        Some(other) => Err(LedgerError::validation(field, other, "expected an integer")),
        None => Err(LedgerError::MissingFields {
            missing: vec![field.to_string()],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(err: LedgerError) -> &'static str {
        match err {
            LedgerError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_product_id_rules() {
        assert_eq!(validate_product_id("P12345").unwrap(), "P12345");
        assert_eq!(validate_product_id("ABCDEFGHIJ").unwrap(), "ABCDEFGHIJ");
        assert!(validate_product_id("abc").is_err());
        assert!(validate_product_id("P1234").is_err());
        assert!(validate_product_id("P123456789X").is_err());
        assert!(validate_product_id("P123-45").is_err());
        assert!(validate_product_id("P12345é").is_err());
        assert_eq!(field_of(validate_product_id("abc").unwrap_err()), "product_id");
    }

    #[test]
    fn test_transaction_detail_rules() {
        assert_eq!(validate_transaction_detail("Purchase").unwrap(), "Purchase");
        assert!(validate_transaction_detail("").is_err());
    }

    #[test]
    fn test_integer_rules() {
        assert_eq!(validate_party_id("supplier_id", 0).unwrap(), 0);
        assert_eq!(validate_party_id("customer_id", 202).unwrap(), 202);
        assert_eq!(
            field_of(validate_party_id("customer_id", -1).unwrap_err()),
            "customer_id"
        );
        assert_eq!(validate_quantity(100).unwrap(), 100);
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_date_rules() {
        assert_eq!(
            validate_date("shipment_date", "2022-12-01").unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 1).unwrap()
        );
        assert!(validate_date("shipment_date", "2024-02-29").is_ok());
        assert!(validate_date("shipment_date", "2022-13-01").is_err());
        assert!(validate_date("shipment_date", "2022-02-30").is_err());
        assert!(validate_date("shipment_date", "0000-01-01").is_err());
        assert!(validate_date("shipment_date", "2022-1-01").is_err());
        assert!(validate_date("shipment_date", "2022/12/01").is_err());
        assert!(validate_date("shipment_date", " 2022-12-01").is_err());
        assert_eq!(
            field_of(validate_date("expected_delivery_date", "nope").unwrap_err()),
            "expected_delivery_date"
        );
    }

    #[test]
    fn test_delivery_window() {
        let early = NaiveDate::from_ymd_opt(2022, 12, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2022, 12, 10).unwrap();
        assert!(validate_delivery_window(early, late).is_ok());
        assert!(validate_delivery_window(early, early).is_ok());
        assert!(validate_delivery_window(late, early).is_err());
    }

    #[test]
    fn test_json_extraction_rejects_wrong_types() {
        let payload = match json!({
            "supplier_id": "101",
            "customer_id": true,
            "quantity": 1.5,
            "product_id": 12345678,
            "shipment_date": "2022-12-01"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        assert_eq!(
            field_of(expect_int(&payload, "supplier_id").unwrap_err()),
            "supplier_id"
        );
        assert!(expect_int(&payload, "customer_id").is_err());
        assert!(expect_int(&payload, "quantity").is_err());
        assert!(expect_str(&payload, "product_id").is_err());
        assert_eq!(expect_str(&payload, "shipment_date").unwrap(), "2022-12-01");
        assert!(matches!(
            expect_str(&payload, "transaction_detail"),
            Err(LedgerError::MissingFields { .. })
        ));
    }

    #[test]
    fn test_expect_int_leaves_sign_to_field_rules() {
        let payload = match json!({ "quantity": -5, "supplier_id": 0 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let quantity = expect_int(&payload, "quantity").unwrap();
        assert_eq!(quantity, -5);
        assert_eq!(field_of(validate_quantity(quantity).unwrap_err()), "quantity");
        assert_eq!(expect_int(&payload, "supplier_id").unwrap(), 0);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let first = validate_date("shipment_date", "2022-12-01").unwrap();
        let second = validate_date("shipment_date", "2022-12-01").unwrap();
        assert_eq!(first, second);

        let first = validate_product_id("abc").unwrap_err().to_string();
        let second = validate_product_id("abc").unwrap_err().to_string();
        assert_eq!(first, second);
    }
}
