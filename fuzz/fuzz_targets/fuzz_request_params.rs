#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vitrine::{Client, Record, RequestParams, ResourceDef, Schema};

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { name: String, price: i64 },
    Forward { query_string: String },
    Delete { price: i64 },
}

fuzz_target!(|ops: Vec<Op>| {
    let client = Client::in_memory(
        Schema::new()
            .with_resource(
                ResourceDef::new("categories")
                    .unique("slug")
                    .has_many("products", "products", "category_id"),
            )
            .with_resource(
                ResourceDef::new("products")
                    .column("name")
                    .column("price")
                    .column("category_id")
                    .belongs_to("category", "categories", "category_id"),
            ),
    );

    for op in ops.iter().take(100) {
        match op {
            Op::Insert { name, price } => {
                if name.len() <= 1024 {
                    let _ = client
                        .from("products")
                        .insert(vec![Record::new().with("name", name.as_str()).with("price", *price)])
                        .execute();
                }
            }
            Op::Forward { query_string } => {
                if query_string.len() <= 4096 {
                    if let Ok(params) = RequestParams::parse(query_string) {
                        let _ = params.apply(&client.from("products")).execute();
                    }
                }
            }
            Op::Delete { price } => {
                let _ = client.from("products").delete().gte("price", *price).execute();
            }
        }
    }
});
