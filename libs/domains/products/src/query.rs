//! Storage-neutral product predicates.
//!
//! A [`ProductPredicate`] is a conjunction of [`Clause`]s. The MongoDB
//! repository renders it with [`ProductPredicate::to_document`]; in-memory
//! stores evaluate it with [`ProductPredicate::matches`].

use mongodb::bson::{self, doc, Bson, Document};

use crate::models::{Product, ProductQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Sku,
    Name,
    Brand,
    Model,
    Category,
    Color,
    Currency,
    Price,
    Stock,
    CreatedAt,
}

impl ProductField {
    /// Stored document key.
    pub fn key(self) -> &'static str {
        match self {
            ProductField::Sku => "productSku",
            ProductField::Name => "productName",
            ProductField::Brand => "productBrand",
            ProductField::Model => "productModel",
            ProductField::Category => "productCategory",
            ProductField::Color => "productColor",
            ProductField::Currency => "productCurrency",
            ProductField::Price => "productPrice",
            ProductField::Stock => "productStock",
            ProductField::CreatedAt => "productCreatedAt",
        }
    }

    fn text(self, product: &Product) -> Option<&str> {
        match self {
            ProductField::Sku => Some(&product.product_sku),
            ProductField::Name => Some(&product.product_name),
            ProductField::Brand => Some(&product.product_brand),
            ProductField::Model => product.product_model.as_deref(),
            ProductField::Category => product.product_category.as_deref(),
            ProductField::Color => product.product_color.as_deref(),
            ProductField::Currency => product.product_currency.as_deref(),
            ProductField::Price | ProductField::Stock | ProductField::CreatedAt => None,
        }
    }

    fn scalar(self, product: &Product) -> Option<Scalar> {
        match self {
            ProductField::Price => Some(Scalar::Float(product.product_price)),
            ProductField::Stock => product.product_stock.map(Scalar::Int),
            ProductField::CreatedAt => Some(Scalar::Time(product.product_created_at)),
            _ => None,
        }
    }
}

/// Bound value for range clauses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Time(bson::DateTime),
}

impl Scalar {
    fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
            Scalar::Time(t) => t.timestamp_millis() as f64,
        }
    }
}

impl From<Scalar> for Bson {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Int(v) => Bson::Int64(v),
            Scalar::Float(v) => Bson::Double(v),
            Scalar::Time(t) => Bson::DateTime(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Equals(ProductField, String),
    /// Inclusive on both ends; a missing bound is open.
    Between {
        field: ProductField,
        min: Option<Scalar>,
        max: Option<Scalar>,
    },
    /// `true`: the field holds a value. `false`: it is missing or null.
    Present(ProductField, bool),
    In(ProductField, Vec<String>),
    NotIn(ProductField, Vec<String>),
}

impl Clause {
    fn to_document(&self) -> Document {
        match self {
            Clause::Equals(field, value) => doc! { field.key(): value.as_str() },
            Clause::Between { field, min, max } => {
                let mut range = Document::new();
                if let Some(min) = min {
                    range.insert("$gte", Bson::from(*min));
                }
                if let Some(max) = max {
                    range.insert("$lte", Bson::from(*max));
                }
                doc! { field.key(): range }
            }
            Clause::Present(field, true) => doc! { field.key(): { "$ne": Bson::Null } },
            Clause::Present(field, false) => doc! { field.key(): Bson::Null },
            Clause::In(field, values) => doc! { field.key(): { "$in": values.clone() } },
            Clause::NotIn(field, values) => doc! { field.key(): { "$nin": values.clone() } },
        }
    }

    fn matches(&self, product: &Product) -> bool {
        match self {
            Clause::Equals(field, value) => field.text(product) == Some(value.as_str()),
            Clause::Between { field, min, max } => match field.scalar(product) {
                Some(actual) => {
                    let v = actual.as_f64();
                    min.is_none_or(|m| v >= m.as_f64()) && max.is_none_or(|m| v <= m.as_f64())
                }
                None => false,
            },
            Clause::Present(field, wanted) => {
                let present = field.text(product).is_some() || field.scalar(product).is_some();
                present == *wanted
            }
            Clause::In(field, values) => field
                .text(product)
                .is_some_and(|v| values.iter().any(|x| x == v)),
            Clause::NotIn(field, values) => field
                .text(product)
                .is_none_or(|v| values.iter().all(|x| x != v)),
        }
    }
}

/// Conjunction of clauses; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPredicate {
    clauses: Vec<Clause>,
}

impl ProductPredicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Exact matches for each given text filter plus price and stock ranges.
    pub fn from_query(query: &ProductQuery) -> Self {
        let exact = [
            (ProductField::Sku, &query.product_sku),
            (ProductField::Name, &query.product_name),
            (ProductField::Brand, &query.product_brand),
            (ProductField::Model, &query.product_model),
            (ProductField::Category, &query.product_category),
            (ProductField::Color, &query.product_color),
            (ProductField::Currency, &query.product_currency),
        ];

        let mut predicate = exact
            .into_iter()
            .filter_map(|(field, value)| value.as_ref().map(|v| Clause::Equals(field, v.clone())))
            .fold(Self::all(), Self::and);

        if query.product_min_price.is_some() || query.product_max_price.is_some() {
            predicate = predicate.and(Clause::Between {
                field: ProductField::Price,
                min: query.product_min_price.map(Scalar::Float),
                max: query.product_max_price.map(Scalar::Float),
            });
        }
        if query.product_min_stock.is_some() || query.product_max_stock.is_some() {
            predicate = predicate.and(Clause::Between {
                field: ProductField::Stock,
                min: query.product_min_stock.map(Scalar::Int),
                max: query.product_max_stock.map(Scalar::Int),
            });
        }

        predicate
    }

    pub fn to_document(&self) -> Document {
        if self.clauses.is_empty() {
            return Document::new();
        }
        let parts: Vec<Document> = self.clauses.iter().map(Clause::to_document).collect();
        doc! { "$and": parts }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.clauses.iter().all(|c| c.matches(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sku: &str, brand: &str, price: f64, stock: Option<i64>) -> Product {
        Product {
            id: None,
            product_sku: sku.into(),
            product_name: format!("{sku} name"),
            product_brand: brand.into(),
            product_model: None,
            product_category: Some("Kitchen".into()),
            product_color: None,
            product_price: price,
            product_currency: Some("USD".into()),
            product_stock: stock,
            product_created_at: bson::DateTime::from_millis(1_000),
        }
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        let predicate = ProductPredicate::all();
        assert_eq!(predicate.to_document(), Document::new());
        assert!(predicate.matches(&product("A1", "Acme", 1.0, None)));
    }

    #[test]
    fn test_from_query_builds_exact_and_range_clauses() {
        let query = ProductQuery {
            product_brand: Some("Acme".into()),
            product_min_price: Some(10.0),
            product_max_stock: Some(5),
            limit: 5,
            ..Default::default()
        };
        let predicate = ProductPredicate::from_query(&query);
        assert_eq!(predicate.clauses().len(), 3);

        let doc = predicate.to_document();
        let parts = doc.get_array("$and").unwrap();
        assert_eq!(
            parts[0].as_document().unwrap(),
            &doc! { "productBrand": "Acme" }
        );
        assert_eq!(
            parts[1].as_document().unwrap(),
            &doc! { "productPrice": { "$gte": 10.0 } }
        );
        assert_eq!(
            parts[2].as_document().unwrap(),
            &doc! { "productStock": { "$lte": 5_i64 } }
        );
    }

    #[test]
    fn test_matches_ranges_inclusive() {
        let predicate = ProductPredicate::all().and(Clause::Between {
            field: ProductField::Price,
            min: Some(Scalar::Float(10.0)),
            max: Some(Scalar::Float(20.0)),
        });
        assert!(predicate.matches(&product("A", "Acme", 10.0, None)));
        assert!(predicate.matches(&product("A", "Acme", 20.0, None)));
        assert!(!predicate.matches(&product("A", "Acme", 20.5, None)));
    }

    #[test]
    fn test_stock_range_excludes_missing_stock() {
        let predicate = ProductPredicate::all().and(Clause::Between {
            field: ProductField::Stock,
            min: Some(Scalar::Int(0)),
            max: None,
        });
        assert!(predicate.matches(&product("A", "Acme", 1.0, Some(0))));
        assert!(!predicate.matches(&product("A", "Acme", 1.0, None)));
    }

    #[test]
    fn test_not_in_excludes_listed_skus() {
        let predicate = ProductPredicate::all().and(Clause::NotIn(
            ProductField::Sku,
            vec!["A1".into(), "B2".into()],
        ));
        assert!(!predicate.matches(&product("A1", "Acme", 1.0, None)));
        assert!(predicate.matches(&product("C3", "Acme", 1.0, None)));
        assert_eq!(
            predicate.to_document(),
            doc! { "$and": [ { "productSku": { "$nin": ["A1", "B2"] } } ] }
        );
    }

    #[test]
    fn test_presence_clause() {
        let with = ProductPredicate::all().and(Clause::Present(ProductField::Stock, true));
        let without = ProductPredicate::all().and(Clause::Present(ProductField::Stock, false));
        let stocked = product("A", "Acme", 1.0, Some(3));
        let unstocked = product("B", "Acme", 1.0, None);

        assert!(with.matches(&stocked) && !with.matches(&unstocked));
        assert!(without.matches(&unstocked) && !without.matches(&stocked));
        assert_eq!(
            without.to_document(),
            doc! { "$and": [ { "productStock": Bson::Null } ] }
        );
    }
}
