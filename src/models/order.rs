use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A customer order as it travels through ingestion, storage and lookup.
///
/// Field names are the wire names used on the ingestion queue and in
/// `GET /order/{order_uid}` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Order {
    #[garde(custom(not_blank))]
    pub order_uid: String,

    #[garde(custom(not_blank))]
    pub track_number: String,

    #[garde(custom(not_blank))]
    pub entry: String,

    #[garde(dive)]
    pub delivery: Delivery,

    #[garde(dive)]
    pub payment: Payment,

    #[serde(default)]
    #[garde(dive)]
    pub items: Vec<Item>,

    #[serde(default)]
    #[garde(skip)]
    pub locale: String,

    #[serde(default)]
    #[garde(skip)]
    pub internal_signature: String,

    #[serde(default)]
    #[garde(skip)]
    pub customer_id: String,

    #[garde(custom(not_blank))]
    pub delivery_service: String,

    #[serde(default)]
    #[garde(skip)]
    pub shardkey: String,

    #[serde(default)]
    #[garde(skip)]
    pub sm_id: i64,

    #[garde(skip)]
    pub date_created: DateTime<Utc>,

    #[serde(default)]
    #[garde(skip)]
    pub oof_shard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Delivery {
    #[garde(custom(not_blank))]
    pub name: String,

    #[garde(custom(not_blank))]
    pub phone: String,

    #[garde(custom(not_blank))]
    pub zip: String,

    #[garde(custom(not_blank))]
    pub city: String,

    #[garde(custom(not_blank))]
    pub address: String,

    #[garde(custom(not_blank))]
    pub region: String,

    #[garde(custom(not_blank), email)]
    pub email: String,
}

/// Payment details. Monetary amounts are integer minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Payment {
    #[garde(custom(not_blank))]
    pub transaction: String,

    #[serde(default)]
    #[garde(skip)]
    pub request_id: String,

    #[garde(custom(not_blank))]
    pub currency: String,

    #[garde(custom(not_blank))]
    pub provider: String,

    #[garde(range(min = 0))]
    pub amount: i64,

    /// Unix timestamp (seconds) of the payment.
    #[garde(range(min = 1))]
    pub payment_dt: i64,

    #[serde(default)]
    #[garde(skip)]
    pub bank: String,

    #[garde(range(min = 0))]
    pub delivery_cost: i64,

    #[garde(range(min = 0))]
    pub goods_total: i64,

    #[serde(default)]
    #[garde(range(min = 0))]
    pub custom_fee: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Item {
    #[garde(range(min = 1))]
    pub chrt_id: i64,

    #[garde(custom(not_blank))]
    pub track_number: String,

    #[garde(range(min = 0))]
    pub price: i64,

    #[garde(custom(not_blank))]
    pub rid: String,

    #[garde(custom(not_blank))]
    pub name: String,

    #[garde(range(min = 0))]
    pub sale: i64,

    #[serde(default)]
    #[garde(skip)]
    pub size: String,

    #[garde(range(min = 0))]
    pub total_price: i64,

    #[garde(range(min = 1))]
    pub nm_id: i64,

    #[serde(default)]
    #[garde(skip)]
    pub brand: String,

    #[serde(default)]
    #[garde(skip)]
    pub status: i32,
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("is required"));
    }
    Ok(())
}

/// Sample data shared by unit and integration tests.
#[doc(hidden)]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// A complete order that passes every validation rule.
    pub fn sample_order(uid: &str) -> Order {
        Order {
            order_uid: uid.to_string(),
            track_number: "WBILMTESTTRACK".to_string(),
            entry: "WBIL".to_string(),
            delivery: Delivery {
                name: "Test Testov".to_string(),
                phone: "+9720000000".to_string(),
                zip: "2639809".to_string(),
                city: "Kiryat Mozkin".to_string(),
                address: "Ploshad Mira 15".to_string(),
                region: "Kraiot".to_string(),
                email: "test@gmail.com".to_string(),
            },
            payment: Payment {
                transaction: uid.to_string(),
                request_id: String::new(),
                currency: "USD".to_string(),
                provider: "wbpay".to_string(),
                amount: 1817,
                payment_dt: 1_637_907_727,
                bank: "alpha".to_string(),
                delivery_cost: 1500,
                goods_total: 317,
                custom_fee: 0,
            },
            items: vec![Item {
                chrt_id: 9_934_930,
                track_number: "WBILMTESTTRACK".to_string(),
                price: 453,
                rid: "ab4219087a764ae0btest".to_string(),
                name: "Mascaras".to_string(),
                sale: 30,
                size: "0".to_string(),
                total_price: 317,
                nm_id: 2_389_212,
                brand: "Vivienne Sabo".to_string(),
                status: 202,
            }],
            locale: "en".to_string(),
            internal_signature: String::new(),
            customer_id: "test".to_string(),
            delivery_service: "meest".to_string(),
            shardkey: "9".to_string(),
            sm_id: 99,
            date_created: Utc
                .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
                .single()
                .unwrap_or_default(),
            oof_shard: "1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_order;
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_json() {
        let order = sample_order("b563feb7b2b84b6test");
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["order_uid"], "b563feb7b2b84b6test");
        assert_eq!(json["payment"]["payment_dt"], 1_637_907_727);
        assert_eq!(json["items"][0]["nm_id"], 2_389_212);
        assert_eq!(json["date_created"], "2021-11-26T06:22:19Z");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_optional_fields_default_when_missing() {
        let mut json = serde_json::to_value(sample_order("x")).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("items");
        obj.remove("locale");
        obj.remove("sm_id");

        let order: Order = serde_json::from_value(json).unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.locale, "");
        assert_eq!(order.sm_id, 0);
    }

    #[test]
    fn test_field_rules_accept_sample() {
        assert!(sample_order("x").validate().is_ok());
    }

    #[test]
    fn test_blank_string_is_rejected() {
        let mut order = sample_order("x");
        order.entry = "   ".to_string();
        let report = order.validate().unwrap_err();
        assert!(report.to_string().contains("entry"));
    }
}
