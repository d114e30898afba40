//! Storefront schema and page data loaders
//!
//! The schema declares the catalog (categories, products, variants), drops,
//! orders and VIP membership. Each loader is the data half of one page: it
//! issues a handful of declarative queries and hands the envelopes back
//! untouched, so the page decides how to render an error.

use crate::query::Query;
use crate::result::QueryResult;
use crate::Client;
use futures_util::join;
use vitrine_core::query::Direction;
use vitrine_core::{Record, ResourceDef, Schema};

/// Drop lifecycle values stored in `drops.status`
pub mod drop_status {
    /// Announced, not yet on sale
    pub const UPCOMING: &str = "upcoming";
    /// On sale now
    pub const LIVE: &str = "live";
    /// Sold out or closed
    pub const ENDED: &str = "ended";
}

const PRODUCT_CARD: &str = "id, name, slug, price, image_url, category:categories(name, slug)";

const PRODUCT_DETAIL: &str = "*, category:categories(name, slug), \
     variants:product_variants(id, size, color, sku, stock)";

const ORDER_SUMMARY: &str = "id, status, total, created_at, \
     items:order_items(quantity, unit_price, product:products(name, slug), \
     variant:product_variants(size, color))";

/// The storefront's resources and relationships.
pub fn schema() -> Schema {
    Schema::new()
        .with_resource(
            ResourceDef::new("categories")
                .column("name")
                .unique("slug")
                .column("description")
                .has_many("products", "products", "category_id"),
        )
        .with_resource(
            ResourceDef::new("products")
                .column("name")
                .unique("slug")
                .column("description")
                .column("price")
                .column("image_url")
                .column("category_id")
                .column("drop_id")
                .column("is_active")
                .column("is_featured")
                .column("created_at")
                .belongs_to("category", "categories", "category_id")
                .belongs_to("drop", "drops", "drop_id")
                .has_many("variants", "product_variants", "product_id"),
        )
        .with_resource(
            ResourceDef::new("product_variants")
                .column("product_id")
                .column("size")
                .column("color")
                .unique("sku")
                .column("stock")
                .belongs_to("product", "products", "product_id"),
        )
        .with_resource(
            ResourceDef::new("drops")
                .column("name")
                .unique("slug")
                .column("status")
                .column("starts_at")
                .column("ends_at")
                .has_many("products", "products", "drop_id"),
        )
        .with_resource(
            ResourceDef::new("orders")
                .column("user_id")
                .column("status")
                .column("total")
                .column("created_at")
                .belongs_to("customer", "profiles", "user_id")
                .has_many("items", "order_items", "order_id"),
        )
        .with_resource(
            ResourceDef::new("order_items")
                .column("order_id")
                .column("product_id")
                .column("variant_id")
                .column("quantity")
                .column("unit_price")
                .belongs_to("order", "orders", "order_id")
                .belongs_to("product", "products", "product_id")
                .belongs_to("variant", "product_variants", "variant_id"),
        )
        // A profile's id is the identity provider's user id
        .with_resource(
            ResourceDef::new("profiles")
                .column("display_name")
                .unique("email")
                .column("created_at")
                .has_many("orders", "orders", "user_id")
                .has_one("membership", "vip_memberships", "user_id"),
        )
        .with_resource(
            ResourceDef::new("vip_tiers")
                .unique("name")
                .column("discount_percent")
                .column("early_access_hours")
                .column("min_spend"),
        )
        .with_resource(
            ResourceDef::new("vip_memberships")
                .unique("user_id")
                .column("tier_id")
                .column("points")
                .column("since")
                .belongs_to("tier", "vip_tiers", "tier_id")
                .belongs_to("profile", "profiles", "user_id"),
        )
}

/// The signed-in caller, as supplied by the identity provider.
///
/// Only used to scope queries to rows the caller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    /// User id (also the caller's `profiles.id`)
    pub user_id: i64,
}

impl Identity {
    /// Identity for `user_id`
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Active products flagged for the home page, newest first.
pub async fn featured_products(client: &Client, limit: usize) -> QueryResult<Vec<Record>> {
    active_products(client)
        .eq("is_featured", true)
        .order("created_at", Direction::Descending)
        .limit(limit)
        .await
}

/// One page of a category listing, by category slug. `page` is zero-based.
pub async fn category_products(
    client: &Client,
    category_slug: &str,
    page: usize,
    per_page: usize,
) -> QueryResult<Vec<Record>> {
    let query = active_products(client)
        .eq("category.slug", category_slug)
        .order_asc("name");

    let query = match per_page {
        0 => query.limit(0),
        n => {
            let from = page.saturating_mul(n);
            query.range(from, from.saturating_add(n - 1))
        }
    };
    query.await
}

/// Product page: the product with its category and variants.
pub async fn product_detail(client: &Client, slug: &str) -> QueryResult<Record> {
    client
        .from("products")
        .select(PRODUCT_DETAIL)
        .eq("slug", slug)
        .eq("is_active", true)
        .single()
        .await
}

/// Drops on sale now, most recent first, with their products.
pub async fn live_drops(client: &Client) -> QueryResult<Vec<Record>> {
    client
        .from("drops")
        .select("id, name, slug, starts_at, ends_at, products(id, name, slug, price, image_url)")
        .eq("status", drop_status::LIVE)
        .order("starts_at", Direction::Descending)
        .await
}

/// Announced drops, soonest first.
pub async fn upcoming_drops(client: &Client, limit: usize) -> QueryResult<Vec<Record>> {
    client
        .from("drops")
        .select("id, name, slug, starts_at")
        .eq("status", drop_status::UPCOMING)
        .order_asc("starts_at")
        .limit(limit)
        .await
}

/// The caller's orders, newest first, with line items.
pub async fn account_orders(
    client: &Client,
    identity: &Identity,
    limit: usize,
) -> QueryResult<Vec<Record>> {
    client
        .from("orders")
        .select(ORDER_SUMMARY)
        .eq("user_id", identity.user_id)
        .order("created_at", Direction::Descending)
        .limit(limit)
        .await
}

/// The caller's VIP membership with its tier. Fails with
/// `SingleRowExpectationFailed` for callers without a membership.
pub async fn vip_status(client: &Client, identity: &Identity) -> QueryResult<Record> {
    client
        .from("vip_memberships")
        .select("tier_id, points, since, tier:vip_tiers(name, discount_percent, early_access_hours)")
        .eq("user_id", identity.user_id)
        .single()
        .await
}

/// The caller's profile.
pub async fn profile(client: &Client, identity: &Identity) -> QueryResult<Record> {
    client
        .from("profiles")
        .select("id, display_name, email")
        .eq("id", identity.user_id)
        .single()
        .await
}

/// Data for the account dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDashboard {
    /// Caller's profile
    pub profile: QueryResult<Record>,
    /// Most recent orders
    pub orders: QueryResult<Vec<Record>>,
    /// VIP membership; an error for non-members
    pub membership: QueryResult<Record>,
}

impl AccountDashboard {
    /// Whether the caller holds a VIP membership
    pub fn is_vip(&self) -> bool {
        self.membership.data.is_some()
    }
}

/// Loads the account dashboard, issuing its three queries concurrently.
pub async fn account_dashboard(
    client: &Client,
    identity: &Identity,
    recent_orders: usize,
) -> AccountDashboard {
    let (profile, orders, membership) = join!(
        profile(client, identity),
        account_orders(client, identity, recent_orders),
        vip_status(client, identity)
    );

    AccountDashboard {
        profile,
        orders,
        membership,
    }
}

fn active_products(client: &Client) -> Query {
    client
        .from("products")
        .select(PRODUCT_CARD)
        .eq("is_active", true)
}
