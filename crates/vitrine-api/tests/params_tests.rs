use vitrine::params::{self, Filter};
use vitrine::{Client, Direction, ErrorKind, FilterOp, Record, RequestParams, ResourceDef, Schema, Value};

async fn shop() -> Client {
    let client = Client::in_memory(
        Schema::new()
            .with_resource(
                ResourceDef::new("categories")
                    .column("name")
                    .unique("slug")
                    .has_many("products", "products", "category_id"),
            )
            .with_resource(
                ResourceDef::new("products")
                    .column("name")
                    .column("price")
                    .column("size")
                    .column("sku")
                    .column("category_id")
                    .belongs_to("category", "categories", "category_id"),
            ),
    );

    let categories = client
        .from("categories")
        .insert(vec![
            Record::new().with("name", "Tees").with("slug", "tees"),
            Record::new().with("name", "Hats").with("slug", "hats"),
            Record::new().with("name", "Fall 24 & more").with("slug", "fall-24"),
        ])
        .await;
    assert!(categories.is_ok());

    let products = client
        .from("products")
        .insert(vec![
            Record::new().with("name", "Tee").with("price", 3000).with("size", "M").with("sku", "0042").with("category_id", 1),
            Record::new().with("name", "Long tee").with("price", 3800).with("size", "L").with("sku", "0043").with("category_id", 1),
            Record::new().with("name", "Cap").with("price", 2500).with("size", "OS").with("sku", "0100").with("category_id", 2),
            Record::new().with("name", "Bucket hat").with("price", 4200).with("size", "OS").with("category_id", 2),
            Record::new().with("name", "Oversized tee").with("price", 5200).with("size", "XL").with("category_id", 3),
        ])
        .await;
    assert!(products.is_ok());

    client
}

fn names(rows: &[Record]) -> Vec<&str> {
    rows.iter().filter_map(|r| r.value("name").as_str()).collect()
}

#[test]
fn test_parse_full_query_string() {
    let params = RequestParams::parse(
        "?select=id,name&category_id=eq.3&price=lt.5000&size=in.(M,L)&order=price.desc&limit=20&offset=40",
    )
    .unwrap();

    assert_eq!(params.select.as_deref(), Some("id,name"));
    assert_eq!(
        params.filters,
        vec![
            Filter {
                column: "category_id".into(),
                op: FilterOp::Eq,
                value: Value::Integer(3),
            },
            Filter {
                column: "price".into(),
                op: FilterOp::Lt,
                value: Value::Integer(5000),
            },
            Filter {
                column: "size".into(),
                op: FilterOp::In,
                value: Value::List(vec![Value::from("M"), Value::from("L")]),
            },
        ]
    );
    assert_eq!(params.order, vec![("price".to_string(), Direction::Descending)]);
    assert_eq!(params.limit, Some(20));
    assert_eq!(params.offset, Some(40));
}

#[test]
fn test_parse_empty_query_string() {
    assert_eq!(RequestParams::parse("").unwrap(), RequestParams::default());
    assert_eq!(RequestParams::parse("?").unwrap(), RequestParams::default());
}

#[test]
fn test_parse_rejects_malformed_parameters() {
    for raw in [
        "price",
        "price=5000",
        "price=between.1",
        "size=in.M,L",
        "limit=ten",
        "offset=-1",
        "order=.desc",
    ] {
        let err = RequestParams::parse(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest, "{}", raw);
    }
}

#[test]
fn test_from_pairs_skips_decoding() {
    let params = RequestParams::from_pairs([("category.name", "eq.Fall 24 & more")]).unwrap();
    assert_eq!(params.filters[0].value, Value::from("Fall 24 & more"));
}

#[tokio::test]
async fn test_forward_filters_and_orders() {
    let client = shop().await;

    let result = params::forward(&client, "products", "category_id=eq.1&order=price.desc").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Long tee", "Tee"]);

    let result = params::forward(&client, "products", "size=in.(OS,XL)&price=gte.4200&order=name").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Bucket hat", "Oversized tee"]);
}

#[tokio::test]
async fn test_forward_pagination() {
    let client = shop().await;

    let result = params::forward(&client, "products", "order=price&offset=1&limit=2").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Tee", "Long tee"]);

    let result = params::forward(&client, "products", "order=price&offset=10").await;
    assert_eq!(result.data, Some(Vec::new()));
}

#[tokio::test]
async fn test_forward_select_and_expansion() {
    let client = shop().await;

    let result = params::forward(
        &client,
        "categories",
        "select=name,products(name)&slug=eq.hats",
    )
    .await;
    let rows = result.data.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0].value("products").as_list().unwrap().len(), 2);
}

#[tokio::test]
async fn test_forward_decodes_values() {
    let client = shop().await;

    let result = params::forward(&client, "products", "category.name=eq.Fall+24+%26+more").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Oversized tee"]);

    // Quoted operands stay text, so leading zeros are kept
    let result = params::forward(&client, "products", "sku=eq.%220042%22").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Tee"]);

    let result = params::forward(&client, "products", "sku=is.null").await;
    assert_eq!(result.error_kind(), Some(ErrorKind::BadRequest));

    let result = params::forward(&client, "products", "sku=eq.null&order=name").await;
    assert_eq!(names(&result.data.unwrap()), vec!["Bucket hat", "Oversized tee"]);
}

#[tokio::test]
async fn test_forward_errors_stay_in_envelope() {
    let client = shop().await;

    let malformed = params::forward(&client, "products", "limit=lots").await;
    assert!(malformed.data.is_none());
    assert_eq!(malformed.error_kind(), Some(ErrorKind::BadRequest));

    let unknown_column = params::forward(&client, "products", "colour=eq.red").await;
    assert_eq!(unknown_column.error_kind(), Some(ErrorKind::BadRequest));

    let unknown_resource = params::forward(&client, "coupons", "").await;
    assert_eq!(unknown_resource.error_kind(), Some(ErrorKind::NotFound));

    let two_keys = params::forward(&client, "products", "order=price.desc,name").await;
    assert_eq!(two_keys.error_kind(), Some(ErrorKind::BadRequest));
}
