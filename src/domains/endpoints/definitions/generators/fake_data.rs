//! Fake record generator.
//!
//! Records come from `fake` with an optionally seeded RNG, so a fixed
//! `seed` reproduces the same data.

use async_trait::async_trait;
use chrono::Datelike;
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StateName, StreetName, ZipCode};
use fake::faker::company::en::{Bs, CatchPhrase, CompanyName, CompanySuffix, Industry};
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::job::en::Title;
use fake::faker::lorem::en::{Paragraph, Sentence, Words};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome};

pub const MAX_COUNT: usize = 100;

const DEPARTMENTS: &[&str] = &["Books", "Electronics", "Garden", "Grocery", "Home", "Sports", "Toys"];
const MATERIALS: &[&str] = &["Cotton", "Steel", "Wooden", "Plastic", "Granite", "Rubber"];
const COLORS: &[&str] = &["black", "white", "red", "blue", "green", "silver", "orange"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    User,
    Product,
    Company,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Product => "product",
            Self::Company => "company",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FakeDataParams {
    /// `user` (default), `product` or `company`.
    #[serde(default, rename = "type")]
    pub kind: RecordKind,

    /// Number of records; capped at 100.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Echoed back; records are always English.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Seed for reproducible output.
    pub seed: Option<u64>,
}

fn default_count() -> usize {
    1
}

fn default_locale() -> String {
    "en_US".to_string()
}

pub struct FakeDataTool;

fn record_id(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid().to_string()
}

fn pick(rng: &mut StdRng, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn user(rng: &mut StdRng) -> Value {
    let username: String = Username().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    json!({
        "id": record_id(rng),
        "name": Name().fake_with_rng::<String, _>(rng),
        "email": SafeEmail().fake_with_rng::<String, _>(rng),
        "phone": PhoneNumber().fake_with_rng::<String, _>(rng),
        "address": {
            "street": format!(
                "{} {}",
                BuildingNumber().fake_with_rng::<String, _>(rng),
                StreetName().fake_with_rng::<String, _>(rng)
            ),
            "city": CityName().fake_with_rng::<String, _>(rng),
            "state": StateName().fake_with_rng::<String, _>(rng),
            "zip": ZipCode().fake_with_rng::<String, _>(rng),
            "country": CountryName().fake_with_rng::<String, _>(rng),
        },
        "company": CompanyName().fake_with_rng::<String, _>(rng),
        "job": Title().fake_with_rng::<String, _>(rng),
        "avatar": format!("https://i.pravatar.cc/150?u={}", username),
        "website": format!("https://{}.{}", username.to_lowercase(), suffix),
        "bio": Paragraph(2..4).fake_with_rng::<String, _>(rng),
    })
}

fn product(rng: &mut StdRng) -> Value {
    let words: Vec<String> = Words(2..4).fake_with_rng(rng);
    let name = words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ");
    let price: f64 = rng.gen_range(1.0..1000.0);
    let rating: f64 = rng.gen_range(1.0..=5.0);
    json!({
        "id": record_id(rng),
        "name": name,
        "price": format!("{:.2}", price),
        "description": Sentence(6..12).fake_with_rng::<String, _>(rng),
        "category": pick(rng, DEPARTMENTS),
        "material": pick(rng, MATERIALS),
        "color": pick(rng, COLORS),
        "image": format!("https://picsum.photos/seed/{}/640/480", rng.gen_range(1..10_000)),
        "rating": (rating * 10.0).round() / 10.0,
        "inStock": rng.gen_bool(0.5),
    })
}

fn company(rng: &mut StdRng, current_year: i32) -> Value {
    json!({
        "id": record_id(rng),
        "name": CompanyName().fake_with_rng::<String, _>(rng),
        "catchPhrase": CatchPhrase().fake_with_rng::<String, _>(rng),
        "bs": Bs().fake_with_rng::<String, _>(rng),
        "logo": format!("https://picsum.photos/seed/logo{}/200/200", rng.gen_range(1..10_000)),
        "type": CompanySuffix().fake_with_rng::<String, _>(rng),
        "industry": Industry().fake_with_rng::<String, _>(rng),
        "founded": current_year - rng.gen_range(1..=30),
        "employees": rng.gen_range(10..=10_000),
    })
}

fn csv_cell(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Header row from the first record's keys, one JSON-encoded cell per field.
pub fn to_csv(records: &[Value]) -> String {
    let Some(Value::Object(first)) = records.first() else {
        return String::new();
    };
    let headers: Vec<&String> = first.keys().collect();
    let mut lines = vec![headers.iter().map(|h| h.as_str()).collect::<Vec<_>>().join(",")];
    for record in records {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| record.get(h.as_str()).map(csv_cell).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn xml_value(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, inner)| format!("<{key}>{}</{key}>", xml_value(inner)))
            .collect(),
        Value::String(s) => escape_xml(s),
        other => other.to_string(),
    }
}

pub fn to_xml(records: &[Value], kind: &str) -> String {
    let items: String = records
        .iter()
        .map(|record| format!("<{kind}>{}</{kind}>", xml_value(record)))
        .collect();
    format!("<?xml version=\"1.0\"?><{kind}s>{items}</{kind}s>")
}

#[async_trait]
impl Endpoint for FakeDataTool {
    const CATEGORY: &'static str = "generators";
    const NAME: &'static str = "fake-data";
    const DESCRIPTION: &'static str = "Generate fake users, products or companies as JSON, CSV and XML";
    type Params = FakeDataParams;

    async fn execute(&self, params: FakeDataParams) -> Result<HandlerOutcome, EndpointError> {
        let count = params.count.clamp(1, MAX_COUNT);
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let current_year = chrono::Utc::now().year();

        let records: Vec<Value> = (0..count)
            .map(|_| match params.kind {
                RecordKind::User => user(&mut rng),
                RecordKind::Product => product(&mut rng),
                RecordKind::Company => company(&mut rng, current_year),
            })
            .collect();
        let schema: Vec<String> = records
            .first()
            .and_then(Value::as_object)
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let mut formats = Map::new();
        formats.insert("csv".to_string(), json!(to_csv(&records)));
        formats.insert("xml".to_string(), json!(to_xml(&records, params.kind.as_str())));

        Ok(HandlerOutcome::success(json!({
            "type": params.kind.as_str(),
            "count": count,
            "locale": params.locale,
            "seed_used": params.seed.map_or_else(|| json!("random"), |seed| json!(seed)),
            "data": records,
            "schema": schema,
            "formats": formats,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(kind: RecordKind, count: usize, seed: Option<u64>) -> FakeDataParams {
        FakeDataParams {
            kind,
            count,
            locale: default_locale(),
            seed,
        }
    }

    #[tokio::test]
    async fn test_seed_is_reproducible() {
        let first = FakeDataTool.execute(params(RecordKind::User, 3, Some(42))).await.unwrap();
        let second = FakeDataTool.execute(params(RecordKind::User, 3, Some(42))).await.unwrap();
        assert_eq!(first.payload()["data"], second.payload()["data"]);
        assert_eq!(first.payload()["seed_used"], 42);
    }

    #[tokio::test]
    async fn test_user_records() {
        let outcome = FakeDataTool.execute(params(RecordKind::User, 2, None)).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["seed_used"], "random");
        let user = &payload["data"][0];
        assert!(user["email"].as_str().unwrap().contains('@'));
        assert!(user["address"]["city"].is_string());
        assert!(payload["schema"].as_array().unwrap().iter().any(|k| k == "email"));
    }

    #[tokio::test]
    async fn test_count_is_capped_and_counted() {
        let outcome = FakeDataTool.execute(params(RecordKind::Company, 500, Some(1))).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["data"].as_array().unwrap().len(), MAX_COUNT);
        let employees = payload["data"][0]["employees"].as_i64().unwrap();
        assert!((10..=10_000).contains(&employees));
    }

    #[tokio::test]
    async fn test_product_formats() {
        let outcome = FakeDataTool.execute(params(RecordKind::Product, 2, Some(7))).await.unwrap();
        let formats = &outcome.payload()["formats"];
        let csv = formats["csv"].as_str().unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.lines().next().unwrap().contains("price"));
        let xml = formats["xml"].as_str().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\"?><products><product>"));
        assert!(xml.ends_with("</product></products>"));
    }

    #[test]
    fn test_csv_and_xml_helpers() {
        let records = vec![json!({ "a": "x<y", "b": 1 })];
        assert_eq!(to_csv(&records), "a,b\n\"x<y\",1");
        assert_eq!(to_xml(&records, "row"), "<?xml version=\"1.0\"?><rows><row><a>x&lt;y</a><b>1</b></row></rows>");
        assert_eq!(to_csv(&[]), "");
    }
}
