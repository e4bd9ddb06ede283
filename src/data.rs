use derive_builder::Builder;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// A restaurant document. Every field but `name` is left out of the stored
/// document when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct Restaurant {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default)]
    pub restaurant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default)]
    pub cuisine: String,
    /// free-form embedded document, shape is up to the dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option), default)]
    pub address: Option<Document>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default)]
    pub borough: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub grades: Vec<Bson>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, cuisine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cuisine: cuisine.into(),
            ..Default::default()
        }
    }
}

pub fn by_name(name: &str) -> Document {
    doc! { "name": name }
}

pub fn by_cuisine(cuisine: &str) -> Document {
    doc! { "cuisine": cuisine }
}

#[test]
fn test_empty_fields_are_omitted() {
    let doc = mongodb::bson::to_document(&Restaurant::new("8282", "Korean")).unwrap();
    assert_eq!(doc, doc! { "name": "8282", "cuisine": "Korean" });

    // name has no omit rule
    let doc = mongodb::bson::to_document(&Restaurant::default()).unwrap();
    assert_eq!(doc, doc! { "name": "" });
}

#[test]
fn test_builder_fills_every_field() {
    let rest = RestaurantBuilder::default()
        .name("Morris Park Bake Shop")
        .restaurant_id("30075445")
        .cuisine("Bakery")
        .borough("Bronx")
        .address(doc! { "street": "Morris Park Ave", "zipcode": "10462" })
        .grades(vec![Bson::Document(doc! { "grade": "A", "score": 2 })])
        .build()
        .unwrap();

    let doc = mongodb::bson::to_document(&rest).unwrap();
    assert_eq!(doc.get_str("borough").unwrap(), "Bronx");
    assert_eq!(
        doc.get_document("address").unwrap().get_str("zipcode").unwrap(),
        "10462"
    );
    assert_eq!(doc.get_array("grades").unwrap().len(), 1);
}

#[test]
fn test_builder_requires_name() {
    let result = RestaurantBuilder::default().cuisine("Korean").build();
    assert!(result.is_err());
}

#[test]
fn test_decode_ignores_server_fields() {
    let stored = doc! {
        "_id": mongodb::bson::oid::ObjectId::new(),
        "name": "8282",
        "cuisine": "Korean",
    };
    let rest: Restaurant = mongodb::bson::from_document(stored).unwrap();
    assert_eq!(rest, Restaurant::new("8282", "Korean"));
}
